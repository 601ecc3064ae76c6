//! Errors raised by the contract-call subsystems.

use ethrpc::ProviderError;

/// Errors raised by the multicall aggregator and the ENS resolver.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ContractsError {
    /// Failure performing the underlying `eth_call`.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The reply did not decode against the declared ABI.
    #[error(transparent)]
    AbiDecode(#[from] alloy_sol_types::Error),

    /// The network configuration carries no ENS contract set.
    #[error("network configuration carries no ens contracts")]
    ExpectedEnsContracts,

    /// The resolver answered with an empty or unusable payload.
    #[error("failed to decode the resolver response")]
    FailedToDecodeResponse,

    /// An ENS name with an empty or oversized label.
    #[error("invalid ens name `{0}`")]
    InvalidEnsName(String),

    /// Reverse resolution requires an EIP-55 checksummed address.
    #[error("address `{0}` is not eip-55 checksummed")]
    InvalidAddressChecksum(String),
}
