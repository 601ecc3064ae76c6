//! Fee estimation against current chain state.
//!
//! Two fee shapes exist on the wire: legacy calls carry a single gas price,
//! EIP-1559 calls carry a `(max_fee_per_gas, max_priority_fee_per_gas)`
//! pair. Recommendations scale the network's view by the configured
//! base-fee multiplier and always round up.

use alloy_rpc_types_eth::BlockNumberOrTag;

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::transport::Transport;

/// Which fee fields a call shape carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeShape {
    /// Single `gas_price` (legacy and EIP-2930 envelopes).
    Legacy,
    /// `max_fee_per_gas` + `max_priority_fee_per_gas` (EIP-1559 and later).
    Eip1559,
}

/// Caller-provided fee fields; anything missing is estimated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeRequest {
    /// Legacy gas price, when the caller pins it.
    pub gas_price: Option<u128>,
    /// Fee cap, when the caller pins it.
    pub max_fee_per_gas: Option<u128>,
    /// Priority fee, when the caller pins it.
    pub max_priority_fee_per_gas: Option<u128>,
}

/// A recommended fee assignment for one call shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeEstimate {
    /// Legacy shape.
    Legacy {
        /// Recommended gas price.
        gas_price: u128,
    },
    /// EIP-1559 shape. Invariant: `max_priority_fee_per_gas ≤ max_fee_per_gas`.
    Eip1559 {
        /// Recommended fee cap.
        max_fee_per_gas: u128,
        /// Recommended priority fee.
        max_priority_fee_per_gas: u128,
    },
}

/// `ceil(value · multiplier)` over a non-negative multiplier.
pub(crate) fn scale_ceil(value: u128, multiplier: f64) -> u128 {
    ((value as f64) * multiplier).ceil() as u128
}

impl<T: Transport> Provider<T> {
    /// Recommends fees for a call of the given shape.
    ///
    /// For EIP-1559 shapes the base fee is taken from `base_fee` or fetched
    /// from the latest block; a missing `baseFeePerGas` there fails with
    /// [`ProviderError::UnableToFetchFeeInfoFromBlock`]. A caller-pinned
    /// `max_fee_per_gas` below the computed priority fee fails with
    /// [`ProviderError::MaxFeePerGasUnderflow`].
    pub async fn estimate_fees_per_gas(
        &self,
        shape: FeeShape,
        request: FeeRequest,
        base_fee: Option<u128>,
    ) -> Result<FeeEstimate, ProviderError> {
        match shape {
            FeeShape::Legacy => {
                let gas_price = self.estimate_legacy_gas_price(request.gas_price).await?;
                Ok(FeeEstimate::Legacy { gas_price })
            }
            FeeShape::Eip1559 => {
                let (max_fee_per_gas, max_priority_fee_per_gas) = self
                    .estimate_eip1559_fees(
                        request.max_fee_per_gas,
                        request.max_priority_fee_per_gas,
                        base_fee,
                    )
                    .await?;
                Ok(FeeEstimate::Eip1559 {
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                })
            }
        }
    }

    /// Legacy-shape recommendation: the caller's gas price, or the network's
    /// scaled by the configured multiplier.
    pub async fn estimate_legacy_gas_price(
        &self,
        provided: Option<u128>,
    ) -> Result<u128, ProviderError> {
        match provided {
            Some(price) => Ok(price),
            None => Ok(scale_ceil(
                self.get_gas_price().await?,
                self.network().base_fee_multiplier,
            )),
        }
    }

    /// EIP-1559-shape recommendation as `(max_fee, max_priority_fee)`.
    pub async fn estimate_eip1559_fees(
        &self,
        provided_max_fee: Option<u128>,
        provided_priority_fee: Option<u128>,
        base_fee: Option<u128>,
    ) -> Result<(u128, u128), ProviderError> {
        let base_fee = match base_fee {
            Some(fee) => fee,
            None => self.latest_base_fee().await?,
        };
        let max_priority_fee_per_gas = match provided_priority_fee {
            Some(fee) => fee,
            None => self.estimate_max_priority_fee_manual(base_fee).await?,
        };
        let max_fee_per_gas = match provided_max_fee {
            Some(fee) => {
                if fee < max_priority_fee_per_gas {
                    return Err(ProviderError::MaxFeePerGasUnderflow);
                }
                fee
            }
            None => {
                scale_ceil(base_fee, self.network().base_fee_multiplier)
                    + max_priority_fee_per_gas
            }
        };
        Ok((max_fee_per_gas, max_priority_fee_per_gas))
    }

    /// Priority-fee estimate without `eth_maxPriorityFeePerGas`:
    /// `max(0, gas_price − base_fee)`.
    pub async fn estimate_max_priority_fee_manual(
        &self,
        base_fee: u128,
    ) -> Result<u128, ProviderError> {
        Ok(self.get_gas_price().await?.saturating_sub(base_fee))
    }

    /// Blob-fee estimate: `max(0, gas_price − blob_base_fee)`.
    pub async fn estimate_blob_max_fee_per_gas(&self) -> Result<u128, ProviderError> {
        let gas_price = self.get_gas_price().await?;
        let blob_base_fee = self.get_blob_base_fee().await?;
        Ok(gas_price.saturating_sub(blob_base_fee))
    }

    /// Reads `baseFeePerGas` off the latest block.
    pub async fn latest_base_fee(&self) -> Result<u128, ProviderError> {
        let block = self
            .get_block_by_number(BlockNumberOrTag::Latest, false)
            .await?;
        block
            .header
            .base_fee_per_gas
            .map(u128::from)
            .ok_or(ProviderError::UnableToFetchFeeInfoFromBlock)
    }
}
