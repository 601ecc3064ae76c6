//! JSON-RPC 2.0 request/response envelope.
//!
//! Replies are decoded in two stages: the envelope is parsed once to split
//! `result` from `error`, keeping `result` as a borrowed
//! [`RawValue`](serde_json::value::RawValue) so each method can attach its
//! own typed decode without an intermediate value tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::RpcErrorPayload;

/// Protocol version stamped on every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// One outbound request. `id` carries the configured chain id.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: &'static str,
    /// Request id; the provider stamps its chain id here.
    pub id: u64,
    /// The wire method name.
    pub method: &'a str,
    /// Positional parameters.
    pub params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    /// Builds a request for `method` under the given id.
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// Serializes the request to its wire body.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One inbound reply envelope, discriminated on `result` vs `error`.
///
/// `result: null` is preserved (the raw value is the literal `null`), which
/// is how the null-on-lookup methods detect a missing entity.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcReply<'a> {
    #[serde(borrow, default)]
    pub result: Option<&'a RawValue>,
    #[serde(default)]
    pub error: Option<RpcErrorPayload>,
}

/// Every RPC method the typed surface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RpcMethod {
    Web3ClientVersion,
    Web3Sha3,
    NetVersion,
    NetListening,
    NetPeerCount,
    ProtocolVersion,
    ChainId,
    GasPrice,
    MaxPriorityFeePerGas,
    BlobBaseFee,
    FeeHistory,
    BlockNumber,
    GetBlockByHash,
    GetBlockByNumber,
    GetBlockTransactionCountByHash,
    GetBlockTransactionCountByNumber,
    GetUncleCountByBlockHash,
    GetUncleCountByBlockNumber,
    GetUncleByBlockHashAndIndex,
    GetUncleByBlockNumberAndIndex,
    GetBalance,
    GetStorageAt,
    GetTransactionCount,
    GetCode,
    GetProof,
    Call,
    EstimateGas,
    CreateAccessList,
    SendRawTransaction,
    GetTransactionByHash,
    GetTransactionByBlockHashAndIndex,
    GetTransactionByBlockNumberAndIndex,
    GetTransactionReceipt,
    GetLogs,
    NewFilter,
    NewBlockFilter,
    NewPendingTransactionFilter,
    GetFilterChanges,
    GetFilterLogs,
    UninstallFilter,
    Accounts,
    Coinbase,
    Mining,
    Hashrate,
    Syncing,
    TxpoolContent,
    TxpoolInspect,
    TxpoolStatus,
    Subscribe,
    Unsubscribe,
}

impl RpcMethod {
    /// The wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Web3ClientVersion => "web3_clientVersion",
            Self::Web3Sha3 => "web3_sha3",
            Self::NetVersion => "net_version",
            Self::NetListening => "net_listening",
            Self::NetPeerCount => "net_peerCount",
            Self::ProtocolVersion => "eth_protocolVersion",
            Self::ChainId => "eth_chainId",
            Self::GasPrice => "eth_gasPrice",
            Self::MaxPriorityFeePerGas => "eth_maxPriorityFeePerGas",
            Self::BlobBaseFee => "eth_blobBaseFee",
            Self::FeeHistory => "eth_feeHistory",
            Self::BlockNumber => "eth_blockNumber",
            Self::GetBlockByHash => "eth_getBlockByHash",
            Self::GetBlockByNumber => "eth_getBlockByNumber",
            Self::GetBlockTransactionCountByHash => "eth_getBlockTransactionCountByHash",
            Self::GetBlockTransactionCountByNumber => "eth_getBlockTransactionCountByNumber",
            Self::GetUncleCountByBlockHash => "eth_getUncleCountByBlockHash",
            Self::GetUncleCountByBlockNumber => "eth_getUncleCountByBlockNumber",
            Self::GetUncleByBlockHashAndIndex => "eth_getUncleByBlockHashAndIndex",
            Self::GetUncleByBlockNumberAndIndex => "eth_getUncleByBlockNumberAndIndex",
            Self::GetBalance => "eth_getBalance",
            Self::GetStorageAt => "eth_getStorageAt",
            Self::GetTransactionCount => "eth_getTransactionCount",
            Self::GetCode => "eth_getCode",
            Self::GetProof => "eth_getProof",
            Self::Call => "eth_call",
            Self::EstimateGas => "eth_estimateGas",
            Self::CreateAccessList => "eth_createAccessList",
            Self::SendRawTransaction => "eth_sendRawTransaction",
            Self::GetTransactionByHash => "eth_getTransactionByHash",
            Self::GetTransactionByBlockHashAndIndex => "eth_getTransactionByBlockHashAndIndex",
            Self::GetTransactionByBlockNumberAndIndex => "eth_getTransactionByBlockNumberAndIndex",
            Self::GetTransactionReceipt => "eth_getTransactionReceipt",
            Self::GetLogs => "eth_getLogs",
            Self::NewFilter => "eth_newFilter",
            Self::NewBlockFilter => "eth_newBlockFilter",
            Self::NewPendingTransactionFilter => "eth_newPendingTransactionFilter",
            Self::GetFilterChanges => "eth_getFilterChanges",
            Self::GetFilterLogs => "eth_getFilterLogs",
            Self::UninstallFilter => "eth_uninstallFilter",
            Self::Accounts => "eth_accounts",
            Self::Coinbase => "eth_coinbase",
            Self::Mining => "eth_mining",
            Self::Hashrate => "eth_hashrate",
            Self::Syncing => "eth_syncing",
            Self::TxpoolContent => "txpool_content",
            Self::TxpoolInspect => "txpool_inspect",
            Self::TxpoolStatus => "txpool_status",
            Self::Subscribe => "eth_subscribe",
            Self::Unsubscribe => "eth_unsubscribe",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = RpcRequest::new(1, RpcMethod::ChainId.as_str(), [(); 0])
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#
        );
    }

    #[test]
    fn request_carries_positional_params() {
        let body = RpcRequest::new(10, RpcMethod::GetBalance.as_str(), ("0xabc", "latest"))
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","id":10,"method":"eth_getBalance","params":["0xabc","latest"]}"#
        );
    }

    #[test]
    fn reply_splits_result_from_error() {
        let success = r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#;
        let reply: RpcReply<'_> = serde_json::from_str(success).unwrap();
        assert_eq!(reply.result.unwrap().get(), "\"0x1\"");
        assert!(reply.error.is_none());

        let failure = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#;
        let reply: RpcReply<'_> = serde_json::from_str(failure).unwrap();
        assert!(reply.result.is_none());
        assert_eq!(reply.error.unwrap().code, -32601);
    }

    #[test]
    fn null_result_is_preserved() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let reply: RpcReply<'_> = serde_json::from_str(body).unwrap();
        assert_eq!(reply.result.unwrap().get(), "null");
    }
}
