#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Contract-call subsystems riding on the [`ethrpc`] provider.
//!
//! - [`multicall`] - batch heterogeneous `eth_call`s through multicall3's
//!   `aggregate3`, preserving input order
//! - [`ens`] - ENS forward, text, and reverse resolution through the
//!   universal resolver

pub mod ens;
mod error;
pub mod multicall;

pub use ens::EnsResolver;
pub use error::ContractsError;
pub use multicall::{Multicall, MulticallOutcome, MulticallRequest};

use alloy_primitives::Address;
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};

/// A read-only call request against `to`.
pub(crate) fn call_request(to: Address, calldata: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        to: Some(alloy_primitives::TxKind::Call(to)),
        input: TransactionInput::new(calldata.into()),
        ..TransactionRequest::default()
    }
}
