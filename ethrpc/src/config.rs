//! Per-network configuration shared by every provider kind.

use std::time::Duration;

use alloy_primitives::{Address, address};

use crate::endpoint::Endpoint;

/// Canonical multicall3 deployment, shared across most EVM chains.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Default receipt-polling cadence.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(2000);

/// Default bound on rate-limited request retries (and connect attempts).
pub const DEFAULT_RETRIES: u32 = 5;

/// Default factor applied to the base fee (or legacy gas price) when
/// recommending a send fee.
pub const DEFAULT_BASE_FEE_MULTIPLIER: f64 = 1.2;

/// Addresses of the OP-Stack L1 contracts a network exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpStackContracts {
    /// The `OptimismPortal` proxy.
    pub portal: Address,
    /// The `DisputeGameFactory` proxy.
    pub dispute_game_factory: Address,
    /// The legacy `L2OutputOracle` proxy.
    pub l2_output_oracle: Address,
}

/// Addresses of the ENS contracts a network exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsContracts {
    /// The ENS universal resolver.
    pub universal_resolver: Address,
}

/// Immutable configuration of one network connection.
///
/// Built once and handed to a provider at construction; nothing here changes
/// afterwards.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Where the peer lives.
    pub endpoint: Endpoint,
    /// The chain id requests are issued under (also used as the request id).
    pub chain_id: u64,
    /// Sleep between receipt polls.
    pub polling_interval: Duration,
    /// Retry bound for rate-limited requests and connect attempts.
    pub retries: u32,
    /// Factor applied when recommending fees.
    pub base_fee_multiplier: f64,
    /// The multicall3 deployment used by the aggregator.
    pub multicall3: Address,
    /// OP-Stack contract set, when the network is an OP-Stack chain.
    pub op_stack: Option<OpStackContracts>,
    /// ENS contract set, when the network carries an ENS registry.
    pub ens: Option<EnsContracts>,
}

impl NetworkConfig {
    /// Creates a configuration with the library defaults.
    #[must_use]
    pub fn new(endpoint: Endpoint, chain_id: u64) -> Self {
        Self {
            endpoint,
            chain_id,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            retries: DEFAULT_RETRIES,
            base_fee_multiplier: DEFAULT_BASE_FEE_MULTIPLIER,
            multicall3: MULTICALL3_ADDRESS,
            op_stack: None,
            ens: None,
        }
    }

    /// Sets the receipt-polling cadence.
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Sets the retry bound.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the fee recommendation factor.
    #[must_use]
    pub fn with_base_fee_multiplier(mut self, multiplier: f64) -> Self {
        self.base_fee_multiplier = multiplier;
        self
    }

    /// Overrides the multicall3 deployment address.
    #[must_use]
    pub fn with_multicall3(mut self, address: Address) -> Self {
        self.multicall3 = address;
        self
    }

    /// Declares the network's OP-Stack contract set.
    #[must_use]
    pub fn with_op_stack(mut self, contracts: OpStackContracts) -> Self {
        self.op_stack = Some(contracts);
        self
    }

    /// Declares the network's ENS contract set.
    #[must_use]
    pub fn with_ens(mut self, contracts: EnsContracts) -> Self {
        self.ens = Some(contracts);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NetworkConfig::new(Endpoint::parse("http://localhost:8545").unwrap(), 1);
        assert_eq!(config.polling_interval, Duration::from_millis(2000));
        assert_eq!(config.retries, 5);
        assert_eq!(config.base_fee_multiplier, 1.2);
        assert_eq!(config.multicall3, MULTICALL3_ADDRESS);
        assert!(config.op_stack.is_none());
        assert!(config.ens.is_none());
    }
}
