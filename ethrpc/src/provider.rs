//! The typed method surface over any transport.

use alloy_consensus::Transaction as _;
use alloy_primitives::{Address, B256, Bytes, U64, U128, U256};
use alloy_rpc_types_eth::{
    AccessListResult, Block, BlockId, BlockNumberOrTag, EIP1186AccountProofResponse, FeeHistory,
    Filter, FilterChanges, Log, SyncStatus, Transaction, TransactionReceipt, TransactionRequest,
};
use alloy_rpc_types_txpool::{TxpoolContent, TxpoolInspect, TxpoolStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::config::NetworkConfig;
use crate::error::{ProviderError, TransportError};
use crate::jsonrpc::{RpcMethod, RpcReply, RpcRequest};
use crate::retry::backoff_delay;
use crate::transport::{DuplexTransport, HttpTransport, IpcTransport, Transport, WsTransport};

/// Parameter slot for parameterless methods; serializes as `[]`.
const NO_PARAMS: [(); 0] = [];

/// A JSON-RPC provider over one transport.
///
/// The provider owns its transport (and with it any read-loop task and
/// queues) together with the immutable [`NetworkConfig`]. All typed method
/// wrappers live here; rate-limited requests retry with bounded exponential
/// backoff before anything surfaces to the caller.
#[derive(Debug)]
pub struct Provider<T> {
    transport: T,
    network: NetworkConfig,
}

impl<T> Provider<T> {
    /// Wraps an already-connected transport.
    pub const fn new(transport: T, network: NetworkConfig) -> Self {
        Self { transport, network }
    }

    /// The network configuration this provider was built with.
    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Borrows the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl Provider<HttpTransport> {
    /// Builds an HTTP provider from the configured endpoint.
    pub fn connect_http(network: NetworkConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&network.endpoint)?;
        Ok(Self::new(transport, network))
    }
}

impl Provider<WsTransport> {
    /// Connects a WebSocket provider (handshake included).
    pub async fn connect_ws(network: NetworkConfig) -> Result<Self, TransportError> {
        let transport = WsTransport::connect(&network).await?;
        Ok(Self::new(transport, network))
    }
}

impl Provider<IpcTransport> {
    /// Connects an IPC provider over the configured socket path.
    pub async fn connect_ipc(network: NetworkConfig) -> Result<Self, TransportError> {
        let transport = IpcTransport::connect(&network).await?;
        Ok(Self::new(transport, network))
    }
}

impl<T: Transport> Provider<T> {
    /// Sends one request, retrying only on the rate-limited signal, and
    /// returns the raw `result` payload.
    pub(crate) async fn request_raw<P>(
        &self,
        method: RpcMethod,
        params: P,
    ) -> Result<Box<RawValue>, ProviderError>
    where
        P: Serialize + Send + Sync,
    {
        let body = RpcRequest::new(self.network.chain_id, method.as_str(), params).to_body()?;

        for attempt in 0..=self.network.retries {
            match self.transport.send_rpc_request(body.clone()).await {
                Err(TransportError::TooManyRequests) => {
                    tracing::debug!(%method, attempt, "rate limited, backing off");
                }
                Err(error) => return Err(error.into()),
                Ok(raw) => {
                    let reply: RpcReply<'_> = serde_json::from_str(raw.get())?;
                    if let Some(payload) = reply.error {
                        let error = ProviderError::from_rpc(payload);
                        if !error.is_rate_limited() {
                            return Err(error);
                        }
                        tracing::debug!(%method, attempt, "rate limited by rpc code, backing off");
                    } else if let Some(result) = reply.result {
                        return Ok(result.to_owned());
                    } else {
                        return Err(ProviderError::Transport(
                            TransportError::UnexpectedServerResponse { status: 200 },
                        ));
                    }
                }
            }
            tokio::time::sleep(backoff_delay(attempt)).await;
        }
        Err(ProviderError::ReachedMaxRetryLimit)
    }

    /// Sends one request and decodes `result` as `R`.
    pub(crate) async fn request<P, R>(&self, method: RpcMethod, params: P) -> Result<R, ProviderError>
    where
        P: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let raw = self.request_raw(method, params).await?;
        Ok(serde_json::from_str(raw.get())?)
    }

    /// Like [`request`](Self::request) but maps a `null` result to `None`.
    pub(crate) async fn request_optional<P, R>(
        &self,
        method: RpcMethod,
        params: P,
    ) -> Result<Option<R>, ProviderError>
    where
        P: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let raw = self.request_raw(method, params).await?;
        Ok(serde_json::from_str(raw.get())?)
    }

    // --- web3 / net namespaces ---

    /// `web3_clientVersion`.
    pub async fn get_client_version(&self) -> Result<String, ProviderError> {
        self.request(RpcMethod::Web3ClientVersion, NO_PARAMS).await
    }

    /// `web3_sha3`: keccak-256 computed by the peer.
    pub async fn get_sha3(&self, data: Bytes) -> Result<B256, ProviderError> {
        self.request(RpcMethod::Web3Sha3, (data,)).await
    }

    /// `net_version`.
    pub async fn get_net_version(&self) -> Result<String, ProviderError> {
        self.request(RpcMethod::NetVersion, NO_PARAMS).await
    }

    /// `net_listening`.
    pub async fn get_net_listening(&self) -> Result<bool, ProviderError> {
        self.request(RpcMethod::NetListening, NO_PARAMS).await
    }

    /// `net_peerCount`.
    pub async fn get_peer_count(&self) -> Result<u64, ProviderError> {
        let count: U64 = self.request(RpcMethod::NetPeerCount, NO_PARAMS).await?;
        Ok(count.to())
    }

    /// `eth_protocolVersion`.
    pub async fn get_protocol_version(&self) -> Result<String, ProviderError> {
        self.request(RpcMethod::ProtocolVersion, NO_PARAMS).await
    }

    // --- chain metadata ---

    /// `eth_chainId`.
    pub async fn get_chain_id(&self) -> Result<u64, ProviderError> {
        let id: U64 = self.request(RpcMethod::ChainId, NO_PARAMS).await?;
        Ok(id.to())
    }

    /// `eth_gasPrice` in wei.
    pub async fn get_gas_price(&self) -> Result<u128, ProviderError> {
        let price: U128 = self.request(RpcMethod::GasPrice, NO_PARAMS).await?;
        Ok(price.to())
    }

    /// `eth_maxPriorityFeePerGas` in wei.
    pub async fn get_max_priority_fee_per_gas(&self) -> Result<u128, ProviderError> {
        let fee: U128 = self
            .request(RpcMethod::MaxPriorityFeePerGas, NO_PARAMS)
            .await?;
        Ok(fee.to())
    }

    /// `eth_blobBaseFee` in wei.
    pub async fn get_blob_base_fee(&self) -> Result<u128, ProviderError> {
        let fee: U128 = self.request(RpcMethod::BlobBaseFee, NO_PARAMS).await?;
        Ok(fee.to())
    }

    /// `eth_feeHistory`.
    pub async fn get_fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumberOrTag,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, ProviderError> {
        self.request(
            RpcMethod::FeeHistory,
            (U64::from(block_count), newest_block, reward_percentiles),
        )
        .await
    }

    /// `eth_blockNumber`.
    pub async fn get_block_number(&self) -> Result<u64, ProviderError> {
        let number: U64 = self.request(RpcMethod::BlockNumber, NO_PARAMS).await?;
        Ok(number.to())
    }

    /// `eth_accounts`.
    pub async fn get_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request(RpcMethod::Accounts, NO_PARAMS).await
    }

    /// `eth_coinbase`.
    pub async fn get_coinbase(&self) -> Result<Address, ProviderError> {
        self.request(RpcMethod::Coinbase, NO_PARAMS).await
    }

    /// `eth_mining`.
    pub async fn get_mining(&self) -> Result<bool, ProviderError> {
        self.request(RpcMethod::Mining, NO_PARAMS).await
    }

    /// `eth_hashrate`.
    pub async fn get_hashrate(&self) -> Result<U256, ProviderError> {
        self.request(RpcMethod::Hashrate, NO_PARAMS).await
    }

    /// `eth_syncing`.
    pub async fn get_sync_status(&self) -> Result<SyncStatus, ProviderError> {
        self.request(RpcMethod::Syncing, NO_PARAMS).await
    }

    // --- account state ---

    /// `eth_getBalance` at `block` (latest when omitted).
    pub async fn get_address_balance(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<U256, ProviderError> {
        self.request(
            RpcMethod::GetBalance,
            (address, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    /// `eth_getTransactionCount` at `block` (latest when omitted).
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<u64, ProviderError> {
        let nonce: U64 = self
            .request(
                RpcMethod::GetTransactionCount,
                (address, block.unwrap_or_else(BlockId::latest)),
            )
            .await?;
        Ok(nonce.to())
    }

    /// `eth_getStorageAt`.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<BlockId>,
    ) -> Result<B256, ProviderError> {
        self.request(
            RpcMethod::GetStorageAt,
            (address, slot, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    /// `eth_getCode`.
    pub async fn get_contract_code(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<Bytes, ProviderError> {
        self.request(
            RpcMethod::GetCode,
            (address, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    /// `eth_getProof`.
    pub async fn get_proof(
        &self,
        address: Address,
        storage_keys: Vec<B256>,
        block: Option<BlockId>,
    ) -> Result<EIP1186AccountProofResponse, ProviderError> {
        self.request(
            RpcMethod::GetProof,
            (address, storage_keys, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    // --- blocks ---

    /// `eth_getBlockByHash`; `null` maps to
    /// [`ProviderError::InvalidBlockHash`].
    pub async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Block, ProviderError> {
        self.request_optional(RpcMethod::GetBlockByHash, (hash, full_transactions))
            .await?
            .ok_or(ProviderError::InvalidBlockHash)
    }

    /// `eth_getBlockByNumber`; `null` maps to
    /// [`ProviderError::InvalidBlockNumber`].
    pub async fn get_block_by_number(
        &self,
        number: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Block, ProviderError> {
        self.request_optional(RpcMethod::GetBlockByNumber, (number, full_transactions))
            .await?
            .ok_or(ProviderError::InvalidBlockNumber)
    }

    /// `eth_getBlockTransactionCountByHash`.
    pub async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<u64, ProviderError> {
        let count: Option<U64> = self
            .request_optional(RpcMethod::GetBlockTransactionCountByHash, (hash,))
            .await?;
        count.map(|count| count.to()).ok_or(ProviderError::InvalidBlockHash)
    }

    /// `eth_getBlockTransactionCountByNumber`.
    pub async fn get_block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> Result<u64, ProviderError> {
        let count: Option<U64> = self
            .request_optional(RpcMethod::GetBlockTransactionCountByNumber, (number,))
            .await?;
        count.map(|count| count.to()).ok_or(ProviderError::InvalidBlockNumber)
    }

    /// `eth_getUncleCountByBlockHash`.
    pub async fn get_uncle_count_by_block_hash(&self, hash: B256) -> Result<u64, ProviderError> {
        let count: Option<U64> = self
            .request_optional(RpcMethod::GetUncleCountByBlockHash, (hash,))
            .await?;
        count.map(|count| count.to()).ok_or(ProviderError::InvalidBlockHash)
    }

    /// `eth_getUncleCountByBlockNumber`.
    pub async fn get_uncle_count_by_block_number(
        &self,
        number: BlockNumberOrTag,
    ) -> Result<u64, ProviderError> {
        let count: Option<U64> = self
            .request_optional(RpcMethod::GetUncleCountByBlockNumber, (number,))
            .await?;
        count.map(|count| count.to()).ok_or(ProviderError::InvalidBlockNumber)
    }

    /// `eth_getUncleByBlockHashAndIndex`.
    pub async fn get_uncle_by_block_hash_and_index(
        &self,
        hash: B256,
        index: u64,
    ) -> Result<Block, ProviderError> {
        self.request_optional(
            RpcMethod::GetUncleByBlockHashAndIndex,
            (hash, U64::from(index)),
        )
        .await?
        .ok_or(ProviderError::InvalidBlockHashOrIndex)
    }

    /// `eth_getUncleByBlockNumberAndIndex`.
    pub async fn get_uncle_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: u64,
    ) -> Result<Block, ProviderError> {
        self.request_optional(
            RpcMethod::GetUncleByBlockNumberAndIndex,
            (number, U64::from(index)),
        )
        .await?
        .ok_or(ProviderError::InvalidBlockNumberOrIndex)
    }

    // --- calls and transactions ---

    /// `eth_call` at `block` (latest when omitted).
    pub async fn call(
        &self,
        request: &TransactionRequest,
        block: Option<BlockId>,
    ) -> Result<Bytes, ProviderError> {
        self.request(
            RpcMethod::Call,
            (request, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    /// `eth_estimateGas`.
    pub async fn estimate_gas(
        &self,
        request: &TransactionRequest,
        block: Option<BlockId>,
    ) -> Result<u64, ProviderError> {
        let gas: U64 = self
            .request(
                RpcMethod::EstimateGas,
                (request, block.unwrap_or_else(BlockId::latest)),
            )
            .await?;
        Ok(gas.to())
    }

    /// `eth_createAccessList`.
    pub async fn create_access_list(
        &self,
        request: &TransactionRequest,
        block: Option<BlockId>,
    ) -> Result<AccessListResult, ProviderError> {
        self.request(
            RpcMethod::CreateAccessList,
            (request, block.unwrap_or_else(BlockId::latest)),
        )
        .await
    }

    /// `eth_sendRawTransaction`; returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ProviderError> {
        self.request(RpcMethod::SendRawTransaction, (raw,)).await
    }

    /// `eth_getTransactionByHash`; `null` maps to
    /// [`ProviderError::TransactionNotFound`].
    pub async fn get_transaction_by_hash(&self, hash: B256) -> Result<Transaction, ProviderError> {
        self.request_optional(RpcMethod::GetTransactionByHash, (hash,))
            .await?
            .ok_or(ProviderError::TransactionNotFound)
    }

    /// `eth_getTransactionByBlockHashAndIndex`.
    pub async fn get_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: u64,
    ) -> Result<Transaction, ProviderError> {
        self.request_optional(
            RpcMethod::GetTransactionByBlockHashAndIndex,
            (hash, U64::from(index)),
        )
        .await?
        .ok_or(ProviderError::InvalidBlockHashOrIndex)
    }

    /// `eth_getTransactionByBlockNumberAndIndex`.
    pub async fn get_transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: u64,
    ) -> Result<Transaction, ProviderError> {
        self.request_optional(
            RpcMethod::GetTransactionByBlockNumberAndIndex,
            (number, U64::from(index)),
        )
        .await?
        .ok_or(ProviderError::InvalidBlockNumberOrIndex)
    }

    /// `eth_getTransactionReceipt`; `null` maps to
    /// [`ProviderError::TransactionReceiptNotFound`].
    pub async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<TransactionReceipt, ProviderError> {
        self.request_optional(RpcMethod::GetTransactionReceipt, (hash,))
            .await?
            .ok_or(ProviderError::TransactionReceiptNotFound)
    }

    // --- logs and filters ---

    /// `eth_getLogs`.
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        self.request(RpcMethod::GetLogs, (filter,)).await
    }

    /// `eth_newFilter`; returns the filter id.
    pub async fn new_filter(&self, filter: &Filter) -> Result<U256, ProviderError> {
        self.request(RpcMethod::NewFilter, (filter,)).await
    }

    /// `eth_newBlockFilter`.
    pub async fn new_block_filter(&self) -> Result<U256, ProviderError> {
        self.request(RpcMethod::NewBlockFilter, NO_PARAMS).await
    }

    /// `eth_newPendingTransactionFilter`.
    pub async fn new_pending_transaction_filter(&self) -> Result<U256, ProviderError> {
        self.request(RpcMethod::NewPendingTransactionFilter, NO_PARAMS)
            .await
    }

    /// `eth_getFilterChanges`; `null` maps to
    /// [`ProviderError::InvalidFilterId`].
    pub async fn get_filter_changes(&self, filter_id: U256) -> Result<FilterChanges, ProviderError> {
        self.request_optional(RpcMethod::GetFilterChanges, (filter_id,))
            .await?
            .ok_or(ProviderError::InvalidFilterId)
    }

    /// `eth_getFilterLogs`; `null` maps to
    /// [`ProviderError::InvalidFilterId`].
    pub async fn get_filter_logs(&self, filter_id: U256) -> Result<Vec<Log>, ProviderError> {
        self.request_optional(RpcMethod::GetFilterLogs, (filter_id,))
            .await?
            .ok_or(ProviderError::InvalidFilterId)
    }

    /// `eth_uninstallFilter`.
    pub async fn uninstall_filter(&self, filter_id: U256) -> Result<bool, ProviderError> {
        self.request(RpcMethod::UninstallFilter, (filter_id,)).await
    }

    // --- txpool ---

    /// `txpool_content`.
    pub async fn txpool_content(&self) -> Result<TxpoolContent, ProviderError> {
        self.request(RpcMethod::TxpoolContent, NO_PARAMS).await
    }

    /// `txpool_inspect`.
    pub async fn txpool_inspect(&self) -> Result<TxpoolInspect, ProviderError> {
        self.request(RpcMethod::TxpoolInspect, NO_PARAMS).await
    }

    /// `txpool_status`.
    pub async fn txpool_status(&self) -> Result<TxpoolStatus, ProviderError> {
        self.request(RpcMethod::TxpoolStatus, NO_PARAMS).await
    }

    // --- receipt waiting ---

    /// Polls for the receipt of `hash`, sleeping the configured interval
    /// between attempts, bounded by the configured retries.
    ///
    /// A missing receipt is not fatal while attempts remain. When the
    /// original transaction drops out of the pending set, the latest block
    /// is scanned for a transaction with the same `(from, nonce)`; a hit is
    /// treated as a replacement and its receipt is awaited instead, logging
    /// whether the original was repriced (same value) or cancelled
    /// (self-send of zero).
    pub async fn wait_for_transaction_receipt(
        &self,
        hash: B256,
        confirmations: u64,
    ) -> Result<TransactionReceipt, ProviderError> {
        let original = self.get_transaction_by_hash(hash).await.ok();
        let mut target = hash;
        let mut valid_confirmations: u64 = 0;

        for attempt in 0..=self.network.retries {
            match self.get_transaction_receipt(target).await {
                Ok(receipt) => {
                    if confirmations == 0 {
                        return Ok(receipt);
                    }
                    valid_confirmations += 1;
                    if valid_confirmations > confirmations {
                        if receipt.block_number.is_some() {
                            return Ok(receipt);
                        }
                        let head = self.get_block_number().await?;
                        let mined = original.as_ref().and_then(|tx| tx.block_number);
                        if head.saturating_sub(mined.unwrap_or(head)) < confirmations {
                            return Ok(receipt);
                        }
                    }
                }
                Err(ProviderError::TransactionReceiptNotFound) => {
                    if let Some(replacement) =
                        self.find_replacement(original.as_ref(), target).await?
                    {
                        // Poll the replacement's receipt right away.
                        target = replacement;
                        continue;
                    }
                }
                Err(error) => return Err(error),
            }
            if attempt < self.network.retries {
                tokio::time::sleep(self.network.polling_interval).await;
            }
        }
        Err(ProviderError::FailedToGetReceipt)
    }

    /// Scans the latest block for a transaction replacing `current`.
    async fn find_replacement(
        &self,
        original: Option<&Transaction>,
        current: B256,
    ) -> Result<Option<B256>, ProviderError> {
        let Some(original) = original else {
            return Ok(None);
        };
        let block = match self
            .get_block_by_number(BlockNumberOrTag::Latest, true)
            .await
        {
            Ok(block) => block,
            Err(ProviderError::InvalidBlockNumber) => return Ok(None),
            Err(error) => return Err(error),
        };

        let sender = original.inner.signer();
        let nonce = original.nonce();
        for candidate in block.transactions.txns() {
            let candidate_hash = *candidate.inner.tx_hash();
            if candidate.inner.signer() != sender
                || candidate.nonce() != nonce
                || candidate_hash == current
            {
                continue;
            }
            if candidate.value() == original.value() {
                tracing::debug!(original = %current, replacement = %candidate_hash,
                    "original transaction was repriced");
            } else if candidate.to() == Some(sender) && candidate.value() == U256::ZERO {
                tracing::debug!(original = %current, replacement = %candidate_hash,
                    "original transaction was cancelled");
            } else {
                tracing::debug!(original = %current, replacement = %candidate_hash,
                    "original transaction was replaced");
            }
            return Ok(Some(candidate_hash));
        }
        Ok(None)
    }
}

/// What to subscribe to on a persistent transport.
#[derive(Debug, Clone, Copy)]
pub enum SubscriptionKind<'a> {
    /// New block headers.
    NewHeads,
    /// Logs matching a filter.
    Logs(&'a Filter),
    /// Hashes of new pending transactions.
    NewPendingTransactions,
    /// Any other subscription method the peer understands.
    Custom(&'a str),
}

/// One server-initiated notification.
#[derive(Debug, serde::Deserialize)]
pub struct SubscriptionNotification {
    /// The subscription that produced this event.
    pub subscription: U256,
    /// The raw event payload.
    pub result: Box<RawValue>,
}

impl SubscriptionNotification {
    /// Decodes the event payload as `R`.
    pub fn parse<R: DeserializeOwned>(&self) -> Result<R, serde_json::Error> {
        serde_json::from_str(self.result.get())
    }
}

#[derive(serde::Deserialize)]
struct SubscriptionFrame {
    params: SubscriptionNotification,
}

impl<T: DuplexTransport> Provider<T> {
    /// `eth_subscribe`; returns the subscription id.
    pub async fn subscribe(&self, kind: SubscriptionKind<'_>) -> Result<U256, ProviderError> {
        match kind {
            SubscriptionKind::NewHeads => self.request(RpcMethod::Subscribe, ("newHeads",)).await,
            SubscriptionKind::Logs(filter) => {
                self.request(RpcMethod::Subscribe, ("logs", filter)).await
            }
            SubscriptionKind::NewPendingTransactions => {
                self.request(RpcMethod::Subscribe, ("newPendingTransactions",))
                    .await
            }
            SubscriptionKind::Custom(method) => {
                self.request(RpcMethod::Subscribe, (method,)).await
            }
        }
    }

    /// `eth_unsubscribe`.
    pub async fn unsubscribe(&self, subscription: U256) -> Result<bool, ProviderError> {
        self.request(RpcMethod::Unsubscribe, (subscription,)).await
    }

    /// Waits for the next notification from the subscription queue.
    pub async fn next_subscription_event(
        &self,
    ) -> Result<SubscriptionNotification, ProviderError> {
        let frame = self.transport.next_notification().await?;
        let parsed: SubscriptionFrame = serde_json::from_str(frame.get())?;
        Ok(parsed.params)
    }

    /// Tears the connection down, waking all blocked consumers.
    pub fn close(&self) {
        self.transport.shutdown();
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::{block_json, legacy_tx_json, receipt_json};
    use super::*;
    use crate::endpoint::Endpoint;
    use std::time::Duration;
    use wiremock::matchers::body_partial_json;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> Provider<HttpTransport> {
        let network = NetworkConfig::new(Endpoint::parse(&server.uri()).unwrap(), 1)
            .with_polling_interval(Duration::from_millis(10))
            .with_retries(2);
        Provider::connect_http(network).unwrap()
    }

    fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        }))
    }

    #[tokio::test]
    async fn chain_id_round_trip() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_chainId",
            "params": [],
        })))
        .respond_with(rpc_result(serde_json::json!("0x1")))
        .expect(1)
        .mount(&server)
        .await;

        let provider = provider_for(&server);
        assert_eq!(provider.get_chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn balance_at_latest() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getBalance",
            "params": ["0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266", "latest"],
        })))
        .respond_with(rpc_result(serde_json::json!("0x21e19e0c9bab2400000")))
        .mount(&server)
        .await;

        let provider = provider_for(&server);
        let balance = provider
            .get_address_balance(
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
                None,
            )
            .await
            .unwrap();
        // 10000 ether in wei
        let expected = U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(balance, expected);
    }

    #[tokio::test]
    async fn null_lookups_map_to_distinct_errors() {
        let server = MockServer::start().await;
        for method in [
            "eth_getTransactionReceipt",
            "eth_getTransactionByHash",
            "eth_getBlockByHash",
            "eth_getFilterChanges",
        ] {
            Mock::given(body_partial_json(serde_json::json!({ "method": method })))
                .respond_with(rpc_result(serde_json::json!(null)))
                .mount(&server)
                .await;
        }

        let provider = provider_for(&server);
        let hash = B256::ZERO;
        assert!(matches!(
            provider.get_transaction_receipt(hash).await,
            Err(ProviderError::TransactionReceiptNotFound)
        ));
        assert!(matches!(
            provider.get_transaction_by_hash(hash).await,
            Err(ProviderError::TransactionNotFound)
        ));
        assert!(matches!(
            provider.get_block_by_hash(hash, false).await,
            Err(ProviderError::InvalidBlockHash)
        ));
        assert!(matches!(
            provider.get_filter_changes(U256::from(1)).await,
            Err(ProviderError::InvalidFilterId)
        ));
    }

    #[tokio::test]
    async fn rpc_errors_map_to_the_closed_taxonomy() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32601, "message": "the method does not exist" },
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.get_chain_id().await;
        assert!(matches!(
            result,
            Err(ProviderError::Rpc {
                kind: crate::RpcErrorKind::MethodNotFound,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn revert_surfaces_as_evm_failure() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_call" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 3, "message": "execution reverted", "data": "0x08c379a0" },
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.call(&TransactionRequest::default(), None).await;
        assert!(matches!(result, Err(ProviderError::EvmFailedToExecute { .. })));
    }

    #[tokio::test]
    async fn http_rate_limiting_retries_until_the_bound() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let network = NetworkConfig::new(Endpoint::parse(&server.uri()).unwrap(), 1)
            .with_retries(1);
        let provider = Provider::connect_http(network).unwrap();
        let result = provider.get_chain_id().await;
        assert!(matches!(result, Err(ProviderError::ReachedMaxRetryLimit)));
    }

    #[tokio::test]
    async fn rpc_rate_limit_code_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32005, "message": "too many requests" },
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_chainId" })))
            .respond_with(rpc_result(serde_json::json!("0x1")))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert_eq!(provider.get_chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn receipt_not_found_then_found() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_getTransactionByHash" })))
            .respond_with(rpc_result(serde_json::json!(null)))
            .mount(&server)
            .await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(rpc_result(serde_json::json!(null)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        let hash = "0x9aafcd1b9c9a1c3e6b0b0b4d9af49a6b8c6f2d8a5d8d1a7d8b9c3e4f5a6b7c8d";
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(rpc_result(receipt_json(hash, Some(1))))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let receipt = provider
            .wait_for_transaction_receipt(hash.parse().unwrap(), 0)
            .await
            .unwrap();
        assert_eq!(receipt.block_number, Some(1));
    }

    #[tokio::test]
    async fn immediate_receipt_returns_in_one_poll() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_getTransactionByHash" })))
            .respond_with(rpc_result(serde_json::json!(null)))
            .mount(&server)
            .await;
        let hash = "0x9aafcd1b9c9a1c3e6b0b0b4d9af49a6b8c6f2d8a5d8d1a7d8b9c3e4f5a6b7c8d";
        Mock::given(body_partial_json(serde_json::json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(rpc_result(receipt_json(hash, Some(1))))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let receipt = provider
            .wait_for_transaction_receipt(hash.parse().unwrap(), 0)
            .await
            .unwrap();
        assert_eq!(receipt.block_number, Some(1));
    }

    #[tokio::test]
    async fn replacement_is_detected_and_followed() {
        let server = MockServer::start().await;
        let original = "0x1111111111111111111111111111111111111111111111111111111111111111";
        let replacement = "0x2222222222222222222222222222222222222222222222222222222222222222";
        let sender = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getTransactionByHash",
            "params": [original],
        })))
        .respond_with(rpc_result(legacy_tx_json(original, sender, 7, 1_000_000)))
        .mount(&server)
        .await;
        // The original never gets a receipt.
        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getTransactionReceipt",
            "params": [original],
        })))
        .respond_with(rpc_result(serde_json::json!(null)))
        .mount(&server)
        .await;
        // The latest block carries the repriced transaction (same from and
        // nonce, same value, new hash).
        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getBlockByNumber",
            "params": ["latest", true],
        })))
        .respond_with(rpc_result(block_json(
            Some(7),
            serde_json::json!([legacy_tx_json(replacement, sender, 7, 1_000_000)]),
        )))
        .mount(&server)
        .await;
        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getTransactionReceipt",
            "params": [replacement],
        })))
        .respond_with(rpc_result(receipt_json(replacement, Some(2))))
        .mount(&server)
        .await;

        let provider = provider_for(&server);
        let receipt = provider
            .wait_for_transaction_receipt(original.parse().unwrap(), 0)
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, replacement.parse::<B256>().unwrap());
    }
}
