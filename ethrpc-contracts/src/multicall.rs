//! Multicall3 aggregation.
//!
//! Compiles a heterogeneous list of contract calls into a single
//! `aggregate3(Call3[])` calldata blob, submits it as one `eth_call`, and
//! decodes the per-target results in input order. Encoding and decoding are
//! both O(n) with no per-target round-trips.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, sol};
use ethrpc::{Provider, Transport};

use crate::call_request;
use crate::error::ContractsError;

sol! {
    /// The multicall3 aggregation entrypoint.
    ///
    /// Reference: <https://github.com/mds1/multicall>
    #[allow(missing_docs)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

/// One pre-encoded call in a batch.
#[derive(Debug, Clone)]
pub struct MulticallRequest {
    /// The contract to call.
    pub target: Address,
    /// ABI-encoded calldata.
    pub calldata: Bytes,
}

impl MulticallRequest {
    /// Encodes a typed call against `target`.
    #[must_use]
    pub fn new<C: SolCall>(target: Address, call: &C) -> Self {
        Self {
            target,
            calldata: call.abi_encode().into(),
        }
    }
}

/// One decoded outcome, in the order the calls were submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallOutcome {
    /// Whether the target call succeeded.
    pub success: bool,
    /// The target's raw return data.
    pub return_data: Bytes,
}

impl MulticallOutcome {
    /// Decodes the return data as the typed return of `C`.
    pub fn decode<C: SolCall>(&self) -> Result<C::Return, ContractsError> {
        Ok(C::abi_decode_returns(&self.return_data)?)
    }
}

/// The multicall aggregator over one provider.
#[derive(Debug)]
pub struct Multicall<'a, T> {
    provider: &'a Provider<T>,
}

impl<'a, T: Transport> Multicall<'a, T> {
    /// Binds the aggregator to `provider`; the multicall3 address comes
    /// from the network configuration.
    #[must_use]
    pub const fn new(provider: &'a Provider<T>) -> Self {
        Self { provider }
    }

    /// Submits `calls` as one `aggregate3` invocation. `allow_failure`
    /// applies uniformly to every element: when `false`, any failing target
    /// reverts the whole batch.
    pub async fn aggregate3(
        &self,
        calls: &[MulticallRequest],
        allow_failure: bool,
    ) -> Result<Vec<MulticallOutcome>, ContractsError> {
        let calldata = encode_aggregate3(calls, allow_failure);
        let reply = self
            .provider
            .call(
                &call_request(self.provider.network().multicall3, calldata),
                None,
            )
            .await?;
        decode_aggregate3(&reply)
    }
}

/// Encodes the `aggregate3` calldata for `calls`.
pub(crate) fn encode_aggregate3(calls: &[MulticallRequest], allow_failure: bool) -> Vec<u8> {
    let calls = calls
        .iter()
        .map(|call| IMulticall3::Call3 {
            target: call.target,
            allowFailure: allow_failure,
            callData: call.calldata.clone(),
        })
        .collect();
    IMulticall3::aggregate3Call { calls }.abi_encode()
}

/// Decodes an `aggregate3` reply into per-target outcomes.
pub(crate) fn decode_aggregate3(reply: &[u8]) -> Result<Vec<MulticallOutcome>, ContractsError> {
    let results = IMulticall3::aggregate3Call::abi_decode_returns(reply)?;
    Ok(results
        .into_iter()
        .map(|result| MulticallOutcome {
            success: result.success,
            return_data: result.returnData,
        })
        .collect())
}
