//! Errors raised by the OP-Stack helpers.

use ethrpc::ProviderError;

/// Errors raised by the OP-Stack helper client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OpStackError {
    /// Failure performing an underlying RPC call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A contract reply did not decode against the declared ABI.
    #[error(transparent)]
    AbiDecode(#[from] alloy_sol_types::Error),

    /// The portal's version string is not semver.
    #[error(transparent)]
    SemVer(#[from] semver::Error),

    /// The network configuration carries no OP-Stack contract set.
    #[error("network configuration carries no op-stack contracts")]
    ExpectedOpStackContracts,

    /// A dispute-game operation against a pre-fault-proof portal.
    #[error("the portal does not run fault proofs")]
    FaultProofsNotEnabled,

    /// No dispute game matches the query.
    #[error("no dispute game matches the query")]
    GameNotFound,

    /// The transaction's receipt carries no withdrawal messages.
    #[error("the transaction emitted no withdrawal messages")]
    InvalidWithdrawalHash,

    /// The withdrawal has not been proven on L1 yet.
    #[error("the withdrawal has not been proven yet")]
    WithdrawalNotProved,
}
