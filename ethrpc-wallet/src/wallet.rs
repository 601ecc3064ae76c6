//! The signing wallet and its transaction pipeline.
//!
//! A transaction moves through the pipeline as: unprepared → prepared
//! (optionally pooled) → asserted → signed → submitted. Preparation reads
//! chain state through the provider; assertion enforces the per-kind
//! invariants; sending serializes with the consensus codec, signs the
//! envelope hash, and submits via `eth_sendRawTransaction`.

use alloy_consensus::{SignableTransaction, TxEip4844Variant, TxEip4844WithSidecar};
use alloy_eips::eip4844::VERSIONED_HASH_VERSION_KZG;
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, Bytes, TxKind};
use alloy_rpc_types_eth::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use c_kzg::{Blob, KzgSettings};
use ethrpc::{Provider, Transport};

use crate::authorization::{AuthorizationPayload, authorization_hash};
use crate::blob::{MAX_BLOBS_PER_BLOCK, build_sidecar, sidecar_versioned_hashes};
use crate::envelope::{
    BerlinEnvelope, CancunEnvelope, Eip7702Envelope, LegacyEnvelope, LondonEnvelope,
    TransactionEnvelope, TransactionType, UnpreparedTransactionEnvelope, seal,
};
use crate::error::WalletError;
use crate::nonce::NonceManager;
use crate::pool::EnvelopePool;

/// A signing wallet bound to one provider.
#[derive(Debug)]
pub struct Wallet<T> {
    provider: Provider<T>,
    signer: PrivateKeySigner,
    nonce_manager: NonceManager,
    pool: EnvelopePool,
}

impl<T> Wallet<T> {
    /// Binds `signer` to `provider`.
    #[must_use]
    pub fn new(signer: PrivateKeySigner, provider: Provider<T>) -> Self {
        let nonce_manager = NonceManager::new(signer.address());
        Self {
            provider,
            signer,
            nonce_manager,
            pool: EnvelopePool::new(),
        }
    }

    /// A wallet over a freshly generated key.
    #[must_use]
    pub fn random(provider: Provider<T>) -> Self {
        Self::new(PrivateKeySigner::random(), provider)
    }

    /// A wallet over a hex-encoded private key.
    pub fn from_hex_key(key: &str, provider: Provider<T>) -> Result<Self, WalletError> {
        Ok(Self::new(key.parse::<PrivateKeySigner>()?, provider))
    }

    /// The sending address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The provider this wallet reads and submits through.
    pub const fn provider(&self) -> &Provider<T> {
        &self.provider
    }

    /// The prepared-envelope pool.
    pub const fn pool(&self) -> &EnvelopePool {
        &self.pool
    }

    /// The wallet's nonce manager.
    pub const fn nonce_manager(&self) -> &NonceManager {
        &self.nonce_manager
    }

    /// Signs an EIP-7702 authorization for delegating to `address`.
    pub fn sign_authorization(
        &self,
        chain_id: u64,
        address: Address,
        nonce: u64,
    ) -> Result<AuthorizationPayload, WalletError> {
        let signature = self
            .signer
            .sign_hash_sync(&authorization_hash(chain_id, address, nonce))?;
        Ok(AuthorizationPayload {
            chain_id,
            address,
            nonce,
            y_parity: u8::from(signature.v()),
            r: signature.r(),
            s: signature.s(),
        })
    }

    fn sign_envelope(&self, envelope: &TransactionEnvelope) -> Result<Bytes, WalletError> {
        let signature = self.signer.sign_hash_sync(&envelope.signature_hash()?)?;
        envelope.encode_signed(signature)
    }
}

impl<T: Transport> Wallet<T> {
    /// Fills every missing field of `tx` from chain state.
    ///
    /// - `chain_id` defaults to the configured network
    /// - `nonce` comes from the nonce manager's reconciliation
    /// - `value`, `data`, `access_list`, `blob_versioned_hashes`, and
    ///   `authorization_list` default to empty
    /// - fees delegate to the provider's estimator against the current base
    ///   fee; blob envelopes additionally fill `max_fee_per_blob_gas`
    /// - `gas` comes from `eth_estimateGas` over the filled call shape
    pub async fn prepare(
        &self,
        tx: &UnpreparedTransactionEnvelope,
    ) -> Result<TransactionEnvelope, WalletError> {
        let chain_id = tx
            .chain_id
            .unwrap_or(self.provider.network().chain_id);
        match tx.transaction_type {
            TransactionType::Deposit => Err(WalletError::UnsupportedTransactionType(
                TransactionType::Deposit.type_byte(),
            )),
            TransactionType::Legacy => {
                let nonce = self.fill_nonce(tx).await?;
                let gas_price = self
                    .provider
                    .estimate_legacy_gas_price(tx.gas_price)
                    .await?;
                let gas = self
                    .fill_gas(tx, chain_id, nonce, Fees::Legacy(gas_price))
                    .await?;
                Ok(TransactionEnvelope::Legacy(LegacyEnvelope {
                    chain_id,
                    nonce,
                    to: tx.to,
                    value: tx.value.unwrap_or_default(),
                    data: tx.data.clone().unwrap_or_default(),
                    gas,
                    gas_price,
                }))
            }
            TransactionType::Berlin => {
                let nonce = self.fill_nonce(tx).await?;
                let gas_price = self
                    .provider
                    .estimate_legacy_gas_price(tx.gas_price)
                    .await?;
                let gas = self
                    .fill_gas(tx, chain_id, nonce, Fees::Legacy(gas_price))
                    .await?;
                Ok(TransactionEnvelope::Berlin(BerlinEnvelope {
                    chain_id,
                    nonce,
                    to: tx.to,
                    value: tx.value.unwrap_or_default(),
                    data: tx.data.clone().unwrap_or_default(),
                    gas,
                    gas_price,
                    access_list: tx.access_list.clone().unwrap_or_default(),
                }))
            }
            TransactionType::London => {
                let nonce = self.fill_nonce(tx).await?;
                let (max_fee, priority_fee) = self
                    .provider
                    .estimate_eip1559_fees(tx.max_fee_per_gas, tx.max_priority_fee_per_gas, None)
                    .await?;
                let gas = self
                    .fill_gas(tx, chain_id, nonce, Fees::Eip1559(max_fee, priority_fee))
                    .await?;
                Ok(TransactionEnvelope::London(LondonEnvelope {
                    chain_id,
                    nonce,
                    to: tx.to,
                    value: tx.value.unwrap_or_default(),
                    data: tx.data.clone().unwrap_or_default(),
                    gas,
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                    access_list: tx.access_list.clone().unwrap_or_default(),
                }))
            }
            TransactionType::Cancun => {
                let nonce = self.fill_nonce(tx).await?;
                let (max_fee, priority_fee) = self
                    .provider
                    .estimate_eip1559_fees(tx.max_fee_per_gas, tx.max_priority_fee_per_gas, None)
                    .await?;
                let max_fee_per_blob_gas = match tx.max_fee_per_blob_gas {
                    Some(fee) => fee,
                    None => self.provider.estimate_blob_max_fee_per_gas().await?,
                };
                let gas = self
                    .fill_gas(tx, chain_id, nonce, Fees::Eip1559(max_fee, priority_fee))
                    .await?;
                Ok(TransactionEnvelope::Cancun(CancunEnvelope {
                    chain_id,
                    nonce,
                    to: tx.to,
                    value: tx.value.unwrap_or_default(),
                    data: tx.data.clone().unwrap_or_default(),
                    gas,
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                    access_list: tx.access_list.clone().unwrap_or_default(),
                    max_fee_per_blob_gas,
                    blob_versioned_hashes: tx.blob_versioned_hashes.clone().unwrap_or_default(),
                }))
            }
            TransactionType::Eip7702 => {
                let nonce = self.fill_nonce(tx).await?;
                let (max_fee, priority_fee) = self
                    .provider
                    .estimate_eip1559_fees(tx.max_fee_per_gas, tx.max_priority_fee_per_gas, None)
                    .await?;
                let gas = self
                    .fill_gas(tx, chain_id, nonce, Fees::Eip1559(max_fee, priority_fee))
                    .await?;
                Ok(TransactionEnvelope::Eip7702(Eip7702Envelope {
                    chain_id,
                    nonce,
                    to: tx.to,
                    value: tx.value.unwrap_or_default(),
                    data: tx.data.clone().unwrap_or_default(),
                    gas,
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                    access_list: tx.access_list.clone().unwrap_or_default(),
                    authorization_list: tx.authorization_list.clone().unwrap_or_default(),
                }))
            }
        }
    }

    async fn fill_nonce(
        &self,
        tx: &UnpreparedTransactionEnvelope,
    ) -> Result<u64, WalletError> {
        match tx.nonce {
            Some(nonce) => Ok(nonce),
            None => Ok(self.nonce_manager.update_nonce(&self.provider).await?),
        }
    }

    async fn fill_gas(
        &self,
        tx: &UnpreparedTransactionEnvelope,
        chain_id: u64,
        nonce: u64,
        fees: Fees,
    ) -> Result<u64, WalletError> {
        if let Some(gas) = tx.gas {
            return Ok(gas);
        }
        let mut request = TransactionRequest {
            from: Some(self.address()),
            to: tx.to.map(TxKind::Call),
            value: tx.value,
            input: TransactionInput::new(tx.data.clone().unwrap_or_default()),
            nonce: Some(nonce),
            chain_id: Some(chain_id),
            ..TransactionRequest::default()
        };
        match fees {
            Fees::Legacy(gas_price) => request.gas_price = Some(gas_price),
            Fees::Eip1559(max_fee, priority_fee) => {
                request.max_fee_per_gas = Some(max_fee);
                request.max_priority_fee_per_gas = Some(priority_fee);
            }
        }
        Ok(self.provider.estimate_gas(&request, None).await?)
    }

    /// Rejects envelopes that violate the per-kind invariants.
    ///
    /// Checks, per kind: the chain id matches the configured network (a
    /// legacy chain id of zero is permitted), the priority fee does not
    /// exceed the fee cap, and blob envelopes have a destination, a
    /// non-empty blob list within the protocol cap, and only KZG-tagged
    /// versioned hashes.
    pub fn assert_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<(), WalletError> {
        let expected = self.provider.network().chain_id;
        let check_chain = |found: u64| {
            if found == expected {
                Ok(())
            } else {
                Err(WalletError::InvalidChainId { expected, found })
            }
        };
        let check_tip = |max_fee: u128, priority: u128| {
            if priority > max_fee {
                Err(WalletError::TransactionTipTooHigh)
            } else {
                Ok(())
            }
        };

        match envelope {
            TransactionEnvelope::Legacy(tx) => {
                if tx.chain_id != 0 {
                    check_chain(tx.chain_id)?;
                }
                Ok(())
            }
            TransactionEnvelope::Berlin(tx) => check_chain(tx.chain_id),
            TransactionEnvelope::London(tx) => {
                check_chain(tx.chain_id)?;
                check_tip(tx.max_fee_per_gas, tx.max_priority_fee_per_gas)
            }
            TransactionEnvelope::Cancun(tx) => {
                check_chain(tx.chain_id)?;
                check_tip(tx.max_fee_per_gas, tx.max_priority_fee_per_gas)?;
                if tx.to.is_none() {
                    return Err(WalletError::CreateBlobTransaction);
                }
                if tx.blob_versioned_hashes.is_empty() {
                    return Err(WalletError::EmptyBlobs);
                }
                if tx.blob_versioned_hashes.len() > MAX_BLOBS_PER_BLOCK {
                    return Err(WalletError::TooManyBlobs {
                        max: MAX_BLOBS_PER_BLOCK,
                        found: tx.blob_versioned_hashes.len(),
                    });
                }
                if tx
                    .blob_versioned_hashes
                    .iter()
                    .any(|hash| hash[0] != VERSIONED_HASH_VERSION_KZG)
                {
                    return Err(WalletError::BlobVersionNotSupported);
                }
                Ok(())
            }
            TransactionEnvelope::Eip7702(tx) => {
                check_chain(tx.chain_id)?;
                check_tip(tx.max_fee_per_gas, tx.max_priority_fee_per_gas)?;
                if tx.to.is_none() {
                    return Err(WalletError::CreateEip7702Transaction);
                }
                Ok(())
            }
        }
    }

    /// Prepares, asserts, and parks an envelope in the pool.
    pub async fn prepare_and_pool(
        &self,
        tx: &UnpreparedTransactionEnvelope,
    ) -> Result<(), WalletError> {
        let envelope = self.prepare(tx).await?;
        self.assert_transaction(&envelope)?;
        self.pool.push(envelope).await;
        Ok(())
    }

    /// Sends a transaction: pops the newest pooled envelope if any, else
    /// prepares `tx`; asserts, signs, and submits. Returns the transaction
    /// hash.
    pub async fn send_transaction(
        &self,
        tx: &UnpreparedTransactionEnvelope,
    ) -> Result<B256, WalletError> {
        let envelope = match self.pool.pop_last().await {
            Some(envelope) => envelope,
            None => self.prepare(tx).await?,
        };
        self.assert_transaction(&envelope)?;
        let raw = self.sign_envelope(&envelope)?;
        tracing::debug!(kind = ?envelope.transaction_type(), nonce = envelope.nonce(),
            "submitting transaction");
        Ok(self.provider.send_raw_transaction(raw).await?)
    }

    /// Sends a blob transaction with its sidecar: commitments and proofs
    /// are computed from `blobs` under `trusted_setup`, versioned hashes
    /// are filled in, and the network (pooled) encoding is submitted.
    pub async fn send_blob_transaction(
        &self,
        blobs: &[Blob],
        tx: &UnpreparedTransactionEnvelope,
        trusted_setup: &KzgSettings,
    ) -> Result<B256, WalletError> {
        if tx.transaction_type != TransactionType::Cancun {
            return Err(WalletError::UnsupportedTransactionType(
                tx.transaction_type.type_byte(),
            ));
        }
        let sidecar = build_sidecar(blobs, trusted_setup)?;
        let mut filled = tx.clone();
        filled.blob_versioned_hashes = Some(sidecar_versioned_hashes(&sidecar));

        let envelope = self.prepare(&filled).await?;
        self.assert_transaction(&envelope)?;
        let TransactionEnvelope::Cancun(cancun) = &envelope else {
            return Err(WalletError::UnsupportedTransactionType(
                envelope.transaction_type().type_byte(),
            ));
        };

        let tx4844 = cancun.to_tx_eip4844()?;
        let signature = self.signer.sign_hash_sync(&tx4844.signature_hash())?;
        let variant = TxEip4844Variant::TxEip4844WithSidecar(TxEip4844WithSidecar {
            tx: tx4844,
            sidecar,
        });
        let sealed = seal(alloy_consensus::TypedTransaction::Eip4844(variant.into()), signature);
        let mut raw = Vec::with_capacity(sealed.encode_2718_len());
        sealed.encode_2718(&mut raw);
        Ok(self.provider.send_raw_transaction(raw.into()).await?)
    }

    /// Dispatches the newest pooled envelope matching `(type, nonce)`.
    pub async fn search_pool_and_send(
        &self,
        transaction_type: TransactionType,
        nonce: u64,
    ) -> Result<B256, WalletError> {
        let envelope = self
            .pool
            .take_matching(transaction_type, nonce)
            .await
            .ok_or(WalletError::TransactionNotFoundInPool {
                transaction_type,
                nonce,
            })?;
        self.assert_transaction(&envelope)?;
        let raw = self.sign_envelope(&envelope)?;
        Ok(self.provider.send_raw_transaction(raw).await?)
    }

    /// Sends and waits for the receipt with the given confirmation depth.
    pub async fn send_transaction_and_wait(
        &self,
        tx: &UnpreparedTransactionEnvelope,
        confirmations: u64,
    ) -> Result<TransactionReceipt, WalletError> {
        let hash = self.send_transaction(tx).await?;
        Ok(self
            .provider
            .wait_for_transaction_receipt(hash, confirmations)
            .await?)
    }
}

/// Fee shape threaded into gas estimation.
#[derive(Debug, Clone, Copy)]
enum Fees {
    Legacy(u128),
    Eip1559(u128, u128),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address, b256};
    use ethrpc::{Endpoint, HttpTransport, NetworkConfig};
    use wiremock::matchers::body_partial_json;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMPTY_BLOOM: &str = concat!("0x", "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000");

    fn latest_block_json(base_fee: u64) -> serde_json::Value {
        serde_json::json!({
            "hash": "0x71b24429dd31255a3b333c4b0d0a8f52dcb1d6d5201548f5d35e55e852d5e7c0",
            "parentHash": "0x4c11f5b5a9e1ab12bcf51b0a224f6cf2ba0b54ab6ca9c8d6e1c7e5c3b1d8f4a2",
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "miner": "0x0000000000000000000000000000000000000000",
            "stateRoot": "0x0c6e51346be0670ce63ac5f05324e27d20b180146269c5aab844d09a2b108c64",
            "transactionsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "logsBloom": EMPTY_BLOOM,
            "difficulty": "0x0",
            "number": "0x2",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x5208",
            "timestamp": "0x64",
            "extraData": "0x",
            "mixHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "nonce": "0x0000000000000000",
            "baseFeePerGas": format!("{base_fee:#x}"),
            "size": "0x220",
            "uncles": [],
            "transactions": [],
        })
    }

    async fn rpc_mock(server: &MockServer, method: &str, result: serde_json::Value) {
        Mock::given(body_partial_json(serde_json::json!({ "method": method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": result,
            })))
            .mount(server)
            .await;
    }

    /// Mocks the full prepare surface: nonce 7, base fee 100, gas price 120,
    /// gas estimate 21000.
    async fn mock_prepare_surface(server: &MockServer) {
        rpc_mock(server, "eth_getTransactionCount", serde_json::json!("0x7")).await;
        rpc_mock(server, "eth_getBlockByNumber", latest_block_json(100)).await;
        rpc_mock(server, "eth_gasPrice", serde_json::json!("0x78")).await;
        rpc_mock(server, "eth_estimateGas", serde_json::json!("0x5208")).await;
    }

    fn wallet_for(server: &MockServer) -> Wallet<HttpTransport> {
        let network = NetworkConfig::new(Endpoint::parse(&server.uri()).unwrap(), 1);
        Wallet::random(Provider::connect_http(network).unwrap())
    }

    fn offline_wallet() -> Wallet<HttpTransport> {
        let network =
            NetworkConfig::new(Endpoint::parse("http://localhost:8545").unwrap(), 1);
        Wallet::random(Provider::connect_http(network).unwrap())
    }

    fn recipient() -> Address {
        address!("70997970c51812dc3a010c7d01b50e0d17dc79c8")
    }

    fn valid_blob_hash() -> B256 {
        b256!("0100000000000000000000000000000000000000000000000000000000000001")
    }

    fn cancun_envelope(
        to: Option<Address>,
        hashes: Vec<B256>,
    ) -> TransactionEnvelope {
        TransactionEnvelope::Cancun(CancunEnvelope {
            chain_id: 1,
            nonce: 0,
            to,
            value: U256::ZERO,
            data: Bytes::new(),
            gas: 21_000,
            max_fee_per_gas: 140,
            max_priority_fee_per_gas: 20,
            access_list: Default::default(),
            max_fee_per_blob_gas: 1,
            blob_versioned_hashes: hashes,
        })
    }

    #[tokio::test]
    async fn prepare_fills_missing_london_fields() {
        let server = MockServer::start().await;
        mock_prepare_surface(&server).await;

        let wallet = wallet_for(&server);
        let unprepared = UnpreparedTransactionEnvelope {
            to: Some(recipient()),
            value: Some(U256::from(1u64)),
            ..UnpreparedTransactionEnvelope::default()
        };
        let prepared = wallet.prepare(&unprepared).await.unwrap();

        let TransactionEnvelope::London(tx) = prepared else {
            panic!("expected a london envelope");
        };
        assert_eq!(tx.chain_id, 1);
        assert_eq!(tx.nonce, 7);
        assert_eq!(tx.gas, 21_000);
        // base fee 100, gas price 120, multiplier 1.2:
        // priority = 120 − 100, max fee = ceil(100 · 1.2) + 20
        assert_eq!(tx.max_priority_fee_per_gas, 20);
        assert_eq!(tx.max_fee_per_gas, 140);
        assert!(wallet.assert_transaction(&TransactionEnvelope::London(tx)).is_ok());
    }

    #[tokio::test]
    async fn prepare_rejects_deposit_envelopes() {
        let wallet = offline_wallet();
        let unprepared = UnpreparedTransactionEnvelope::of_type(TransactionType::Deposit);
        assert!(matches!(
            wallet.prepare(&unprepared).await,
            Err(WalletError::UnsupportedTransactionType(0x7e))
        ));
    }

    #[tokio::test]
    async fn assert_rejects_chain_mismatch() {
        let wallet = offline_wallet();
        let envelope = TransactionEnvelope::London(LondonEnvelope {
            chain_id: 10,
            nonce: 0,
            to: Some(recipient()),
            value: U256::ZERO,
            data: Bytes::new(),
            gas: 21_000,
            max_fee_per_gas: 2,
            max_priority_fee_per_gas: 1,
            access_list: Default::default(),
        });
        assert!(matches!(
            wallet.assert_transaction(&envelope),
            Err(WalletError::InvalidChainId {
                expected: 1,
                found: 10
            })
        ));
    }

    #[tokio::test]
    async fn assert_permits_legacy_chain_zero() {
        let wallet = offline_wallet();
        let envelope = TransactionEnvelope::Legacy(LegacyEnvelope {
            chain_id: 0,
            nonce: 0,
            to: Some(recipient()),
            value: U256::ZERO,
            data: Bytes::new(),
            gas: 21_000,
            gas_price: 1,
        });
        assert!(wallet.assert_transaction(&envelope).is_ok());
    }

    #[tokio::test]
    async fn assert_rejects_priority_above_max_fee() {
        let wallet = offline_wallet();
        let envelope = TransactionEnvelope::London(LondonEnvelope {
            chain_id: 1,
            nonce: 0,
            to: Some(recipient()),
            value: U256::ZERO,
            data: Bytes::new(),
            gas: 21_000,
            max_fee_per_gas: 10,
            max_priority_fee_per_gas: 20,
            access_list: Default::default(),
        });
        assert!(matches!(
            wallet.assert_transaction(&envelope),
            Err(WalletError::TransactionTipTooHigh)
        ));
    }

    #[tokio::test]
    async fn assert_rejects_blob_creation() {
        let wallet = offline_wallet();
        let envelope = cancun_envelope(None, vec![valid_blob_hash()]);
        assert!(matches!(
            wallet.assert_transaction(&envelope),
            Err(WalletError::CreateBlobTransaction)
        ));
    }

    #[tokio::test]
    async fn assert_rejects_empty_and_overfull_blob_lists() {
        let wallet = offline_wallet();
        assert!(matches!(
            wallet.assert_transaction(&cancun_envelope(Some(recipient()), vec![])),
            Err(WalletError::EmptyBlobs)
        ));
        assert!(matches!(
            wallet.assert_transaction(&cancun_envelope(
                Some(recipient()),
                vec![valid_blob_hash(); MAX_BLOBS_PER_BLOCK + 1]
            )),
            Err(WalletError::TooManyBlobs { max: 6, found: 7 })
        ));
    }

    #[tokio::test]
    async fn assert_rejects_untagged_blob_hashes() {
        let wallet = offline_wallet();
        let untagged =
            b256!("0200000000000000000000000000000000000000000000000000000000000001");
        assert!(matches!(
            wallet.assert_transaction(&cancun_envelope(Some(recipient()), vec![untagged])),
            Err(WalletError::BlobVersionNotSupported)
        ));
    }

    #[tokio::test]
    async fn send_prepares_signs_and_submits() {
        let server = MockServer::start().await;
        mock_prepare_surface(&server).await;
        let hash = "0x9aafcd1b9c9a1c3e6b0b0b4d9af49a6b8c6f2d8a5d8d1a7d8b9c3e4f5a6b7c8d";
        rpc_mock(&server, "eth_sendRawTransaction", serde_json::json!(hash)).await;

        let wallet = wallet_for(&server);
        let unprepared = UnpreparedTransactionEnvelope {
            to: Some(recipient()),
            value: Some(U256::from(1u64)),
            ..UnpreparedTransactionEnvelope::default()
        };
        let sent = wallet.send_transaction(&unprepared).await.unwrap();
        assert_eq!(sent, hash.parse::<B256>().unwrap());
    }

    #[tokio::test]
    async fn send_prefers_the_pooled_envelope() {
        let server = MockServer::start().await;
        mock_prepare_surface(&server).await;
        let hash = "0x9aafcd1b9c9a1c3e6b0b0b4d9af49a6b8c6f2d8a5d8d1a7d8b9c3e4f5a6b7c8d";
        rpc_mock(&server, "eth_sendRawTransaction", serde_json::json!(hash)).await;

        let wallet = wallet_for(&server);
        let unprepared = UnpreparedTransactionEnvelope {
            to: Some(recipient()),
            ..UnpreparedTransactionEnvelope::default()
        };
        wallet.prepare_and_pool(&unprepared).await.unwrap();
        assert_eq!(wallet.pool().len().await, 1);

        wallet.send_transaction(&unprepared).await.unwrap();
        assert!(wallet.pool().is_empty().await);
    }

    #[tokio::test]
    async fn search_pool_and_send_dispatches_by_type_and_nonce() {
        let server = MockServer::start().await;
        mock_prepare_surface(&server).await;
        let hash = "0x9aafcd1b9c9a1c3e6b0b0b4d9af49a6b8c6f2d8a5d8d1a7d8b9c3e4f5a6b7c8d";
        rpc_mock(&server, "eth_sendRawTransaction", serde_json::json!(hash)).await;

        let wallet = wallet_for(&server);
        let unprepared = UnpreparedTransactionEnvelope {
            to: Some(recipient()),
            ..UnpreparedTransactionEnvelope::default()
        };
        wallet.prepare_and_pool(&unprepared).await.unwrap();

        // The prepare surface pins the nonce at 7.
        assert!(matches!(
            wallet
                .search_pool_and_send(TransactionType::London, 99)
                .await,
            Err(WalletError::TransactionNotFoundInPool { nonce: 99, .. })
        ));
        let sent = wallet
            .search_pool_and_send(TransactionType::London, 7)
            .await
            .unwrap();
        assert_eq!(sent, hash.parse::<B256>().unwrap());
        assert!(wallet.pool().is_empty().await);
    }

    #[tokio::test]
    async fn signed_authorization_matches_the_payload_fields() {
        let wallet = offline_wallet();
        let delegate = recipient();
        let payload = wallet.sign_authorization(1, delegate, 3).unwrap();
        assert_eq!(payload.chain_id, 1);
        assert_eq!(payload.address, delegate);
        assert_eq!(payload.nonce, 3);
        assert!(payload.y_parity <= 1);
        assert_ne!(payload.r, U256::ZERO);
        assert_ne!(payload.s, U256::ZERO);
    }
}
