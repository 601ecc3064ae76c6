//! KZG blob sidecars for EIP-4844 envelopes.

use std::path::Path;

use alloy_eips::eip4844::{BlobTransactionSidecar, kzg_to_versioned_hash};
use c_kzg::{Blob, KzgSettings};

use crate::error::WalletError;

/// Protocol cap on blobs carried by one transaction.
pub const MAX_BLOBS_PER_BLOCK: usize = 6;

/// Loads a KZG trusted setup from its file form.
pub fn load_trusted_setup(path: &Path) -> Result<KzgSettings, WalletError> {
    Ok(KzgSettings::load_trusted_setup_file(path, 0)?)
}

/// Computes commitments and proofs for `blobs`, producing the sidecar that
/// rides along the network encoding of a blob transaction.
pub fn build_sidecar(
    blobs: &[Blob],
    settings: &KzgSettings,
) -> Result<BlobTransactionSidecar, WalletError> {
    let mut sidecar_blobs = Vec::with_capacity(blobs.len());
    let mut commitments = Vec::with_capacity(blobs.len());
    let mut proofs = Vec::with_capacity(blobs.len());

    for blob in blobs {
        let commitment = settings.blob_to_kzg_commitment(blob)?.to_bytes();
        let proof = settings.compute_blob_kzg_proof(blob, &commitment)?.to_bytes();
        sidecar_blobs.push(alloy_eips::eip4844::Blob::from_slice(&**blob));
        commitments.push(alloy_eips::eip4844::Bytes48::from_slice(&*commitment));
        proofs.push(alloy_eips::eip4844::Bytes48::from_slice(&*proof));
    }

    Ok(BlobTransactionSidecar::new(
        sidecar_blobs,
        commitments,
        proofs,
    ))
}

/// The versioned hashes (`0x01 ∥ sha256(commitment)[1..]`) of a sidecar's
/// commitments.
#[must_use]
pub fn sidecar_versioned_hashes(
    sidecar: &BlobTransactionSidecar,
) -> Vec<alloy_primitives::B256> {
    sidecar
        .commitments
        .iter()
        .map(|commitment| kzg_to_versioned_hash(commitment.as_slice()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_eips::eip4844::VERSIONED_HASH_VERSION_KZG;

    #[test]
    fn versioned_hashes_carry_the_kzg_tag() {
        let sidecar = BlobTransactionSidecar::new(
            vec![],
            vec![alloy_eips::eip4844::Bytes48::from_slice(&[0x42; 48])],
            vec![],
        );
        let hashes = sidecar_versioned_hashes(&sidecar);
        assert_eq!(hashes.len(), 1);
        assert_eq!(hashes[0][0], VERSIONED_HASH_VERSION_KZG);
    }
}
