//! EIP-7702 authorization payloads.
//!
//! An authorization delegates an EOA's code to `address`. The signed
//! preimage is `0x05 ∥ rlp([chain_id, address, nonce])`, hashed with
//! keccak-256.

use alloy_eips::eip7702::{Authorization, SignedAuthorization};
use alloy_primitives::{Address, B256, U256, keccak256};
use alloy_rlp::Encodable;

/// Domain separator prepended to the RLP payload before hashing.
pub const AUTHORIZATION_MAGIC: u8 = 0x05;

/// A signed EIP-7702 authorization tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPayload {
    /// Chain the delegation is valid on (zero means every chain).
    pub chain_id: u64,
    /// The delegate's code address.
    pub address: Address,
    /// The authority's nonce at signing time.
    pub nonce: u64,
    /// Signature parity bit.
    pub y_parity: u8,
    /// Signature `r` scalar.
    pub r: U256,
    /// Signature `s` scalar.
    pub s: U256,
}

impl AuthorizationPayload {
    /// Converts into the consensus representation used by the envelope
    /// serializer.
    #[must_use]
    pub fn to_signed(&self) -> SignedAuthorization {
        SignedAuthorization::new_unchecked(
            Authorization {
                chain_id: U256::from(self.chain_id),
                address: self.address,
                nonce: self.nonce,
            },
            self.y_parity,
            self.r,
            self.s,
        )
    }

    /// Rebuilds a payload from the consensus representation.
    #[must_use]
    pub fn from_signed(signed: &SignedAuthorization) -> Self {
        Self {
            chain_id: signed.chain_id.saturating_to(),
            address: signed.address,
            nonce: signed.nonce,
            y_parity: signed.y_parity(),
            r: signed.r(),
            s: signed.s(),
        }
    }
}

/// The hash an authority signs: `keccak256(0x05 ∥ rlp([chain_id, address,
/// nonce]))`.
#[must_use]
pub fn authorization_hash(chain_id: u64, address: Address, nonce: u64) -> B256 {
    let payload_length = chain_id.length() + address.length() + nonce.length();
    let header = alloy_rlp::Header {
        list: true,
        payload_length,
    };
    let mut preimage = Vec::with_capacity(1 + header.length() + payload_length);
    preimage.push(AUTHORIZATION_MAGIC);
    header.encode(&mut preimage);
    chain_id.encode(&mut preimage);
    address.encode(&mut preimage);
    nonce.encode(&mut preimage);
    keccak256(&preimage)
}
