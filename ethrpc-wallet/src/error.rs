//! Wallet-side error taxonomy.

use ethrpc::ProviderError;

use crate::envelope::TransactionType;

/// Errors raised by the wallet pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    /// Failure reading chain state or submitting through the provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The envelope's chain id does not match the configured network.
    #[error("envelope chain id {found} does not match the configured chain {expected}")]
    InvalidChainId {
        /// The configured chain id.
        expected: u64,
        /// The chain id the envelope carries.
        found: u64,
    },

    /// `max_priority_fee_per_gas` exceeds `max_fee_per_gas`.
    #[error("priority fee exceeds the max fee per gas")]
    TransactionTipTooHigh,

    /// A blob envelope with an empty blob list.
    #[error("blob transaction carries no blobs")]
    EmptyBlobs,

    /// A blob envelope past the protocol cap.
    #[error("blob transaction carries {found} blobs, the protocol caps at {max}")]
    TooManyBlobs {
        /// The protocol cap.
        max: usize,
        /// How many blobs the envelope carries.
        found: usize,
    },

    /// A blob hash whose version byte is not the KZG tag.
    #[error("blob versioned hash does not carry the kzg version byte")]
    BlobVersionNotSupported,

    /// Blob transactions may not create contracts.
    #[error("blob transaction without a destination")]
    CreateBlobTransaction,

    /// EIP-7702 transactions may not create contracts.
    #[error("eip-7702 transaction without a destination")]
    CreateEip7702Transaction,

    /// Deposit envelopes and unknown discriminants cannot be prepared.
    #[error("unsupported transaction type {0:#x}")]
    UnsupportedTransactionType(u8),

    /// No pooled envelope matches the requested `(type, nonce)`.
    #[error("no pooled {transaction_type:?} envelope with nonce {nonce}")]
    TransactionNotFoundInPool {
        /// The requested envelope kind.
        transaction_type: TransactionType,
        /// The requested nonce.
        nonce: u64,
    },

    /// Signing failure.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),

    /// Key decoding failure.
    #[error(transparent)]
    LocalSigner(#[from] alloy_signer_local::LocalSignerError),

    /// KZG commitment/proof computation failure.
    #[error(transparent)]
    Kzg(#[from] c_kzg::Error),

    /// EIP-2718 decoding failure.
    #[error(transparent)]
    Decode(#[from] alloy_eips::eip2718::Eip2718Error),
}
