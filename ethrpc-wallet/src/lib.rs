#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Signing wallet and transaction pipeline for the [`ethrpc`] provider.
//!
//! A [`Wallet`] drives a transaction from an
//! [`UnpreparedTransactionEnvelope`] to a submitted hash: preparation fills
//! every missing field from chain state, assertion enforces the per-kind
//! invariants, and sending serializes, signs, and submits atomically.
//! Prepared envelopes can also be parked in a pool and dispatched later by
//! `(type, nonce)`.
//!
//! # Modules
//!
//! - [`authorization`] - EIP-7702 authorization payloads and their signing
//! - [`blob`] - KZG blob sidecars for EIP-4844 envelopes
//! - [`envelope`] - The EIP-2718 envelope sum type and conversions
//! - [`nonce`] - Local nonce bookkeeping with network reconciliation
//! - [`pool`] - The prepared-envelope pool
//! - [`wallet`] - The pipeline itself

pub mod authorization;
pub mod blob;
pub mod envelope;
mod error;
pub mod nonce;
pub mod pool;
pub mod wallet;

pub use authorization::AuthorizationPayload;
pub use blob::{MAX_BLOBS_PER_BLOCK, build_sidecar, load_trusted_setup};
pub use envelope::{
    BerlinEnvelope, CancunEnvelope, Eip7702Envelope, LegacyEnvelope, LondonEnvelope,
    TransactionEnvelope, TransactionType, UnpreparedTransactionEnvelope,
};
pub use error::WalletError;
pub use nonce::NonceManager;
pub use pool::EnvelopePool;
pub use wallet::Wallet;
