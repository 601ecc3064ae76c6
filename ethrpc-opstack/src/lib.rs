#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! OP-Stack helpers over the [`ethrpc`] provider.
//!
//! Covers the two withdrawal-proving generations of the OP-Stack L1
//! contract set: dispute games through the `DisputeGameFactory` (fault
//! proofs, portal major version ≥ 3) and the legacy `L2OutputOracle`
//! cadence. The [`OpStack`] client reads whichever set the portal version
//! selects.
//!
//! - [`contracts`] - the Solidity surface and game-metadata unpacking
//! - [`games`] - dispute-game listing, selection, and cadence projection
//! - [`withdrawals`] - `MessagePassed` extraction and proving/finalization
//!   timings

pub mod contracts;
mod error;
pub mod games;
pub mod withdrawals;

pub use error::OpStackError;
pub use games::{DisputeGame, GameStrategy, L2Output};
pub use withdrawals::{ProvenWithdrawal, Withdrawal};

use alloy_primitives::Address;
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use ethrpc::{OpStackContracts, Provider, Transport};
use semver::Version;

/// How many games the cadence projection samples.
pub const GAME_CADENCE_SAMPLE: u64 = 10;

/// The OP-Stack helper client over one provider.
#[derive(Debug)]
pub struct OpStack<'a, T> {
    provider: &'a Provider<T>,
    contracts: OpStackContracts,
}

impl<'a, T: Transport> OpStack<'a, T> {
    /// Binds the client to `provider`.
    ///
    /// # Errors
    ///
    /// [`OpStackError::ExpectedOpStackContracts`] when the network
    /// configuration has no OP-Stack contract set.
    pub fn new(provider: &'a Provider<T>) -> Result<Self, OpStackError> {
        let contracts = provider
            .network()
            .op_stack
            .ok_or(OpStackError::ExpectedOpStackContracts)?;
        Ok(Self {
            provider,
            contracts,
        })
    }

    /// The contract set this client reads.
    #[must_use]
    pub const fn contracts(&self) -> &OpStackContracts {
        &self.contracts
    }

    /// The `OptimismPortal` version.
    pub async fn get_portal_version(&self) -> Result<Version, OpStackError> {
        let version: String = self
            .read(
                self.contracts.portal,
                contracts::IOptimismPortal::versionCall {},
            )
            .await?;
        parse_version(&version)
    }

    /// Whether the portal's proving path is dispute games (major ≥ 3).
    pub async fn fault_proofs_enabled(&self) -> Result<bool, OpStackError> {
        Ok(fault_proofs_supported(&self.get_portal_version().await?))
    }

    /// One `eth_call` against `to`, decoded as the call's return type.
    pub(crate) async fn read<C: SolCall>(
        &self,
        to: Address,
        call: C,
    ) -> Result<C::Return, OpStackError> {
        let reply = self
            .provider
            .call(&call_request(to, call.abi_encode()), None)
            .await?;
        Ok(C::abi_decode_returns(&reply)?)
    }
}

/// Fault proofs shipped with portal major version 3.
pub(crate) const fn fault_proofs_supported(version: &Version) -> bool {
    version.major >= 3
}

/// Parses a portal version string, tolerating a leading `v`.
pub(crate) fn parse_version(raw: &str) -> Result<Version, OpStackError> {
    Ok(Version::parse(raw.trim().trim_start_matches('v'))?)
}

/// A read-only call request against `to`.
pub(crate) fn call_request(to: Address, calldata: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        to: Some(alloy_primitives::TxKind::Call(to)),
        input: TransactionInput::new(calldata.into()),
        ..TransactionRequest::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_gate_opens_at_major_three() {
        assert!(fault_proofs_supported(&parse_version("3.10.0").unwrap()));
        assert!(fault_proofs_supported(&parse_version("v4.0.0").unwrap()));
        assert!(!fault_proofs_supported(&parse_version("2.8.0").unwrap()));
    }

    #[test]
    fn malformed_versions_are_errors() {
        assert!(matches!(
            parse_version("portal"),
            Err(OpStackError::SemVer(_))
        ));
    }
}
