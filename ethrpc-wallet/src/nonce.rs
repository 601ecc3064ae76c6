//! Account nonce bookkeeping across rapid sends.
//!
//! Rapid `send → send → send` sequences outpace the node's own mempool
//! view: the pending transaction count lags behind what this process has
//! already submitted. The manager keeps the last network-observed nonce in
//! `cache` and hands out `cache + 1` whenever the network has not caught up
//! yet; the cache is cleared on every reconciliation so a stale value cannot
//! outlive a pause in sending activity.

use alloy_primitives::Address;
use alloy_rpc_types_eth::BlockNumberOrTag;
use ethrpc::{Provider, ProviderError, Transport};
use tokio::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct NonceState {
    /// Locally-issued increments since the last reconciliation.
    managed: u64,
    /// Zero, or the last network-observed pending nonce.
    cache: u64,
}

/// Tracks the next usable nonce for one sending address.
///
/// State is guarded by a single mutex; clone-free sharing across tasks goes
/// through the owning wallet.
#[derive(Debug)]
pub struct NonceManager {
    address: Address,
    state: Mutex<NonceState>,
}

impl NonceManager {
    /// A fresh manager for `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(NonceState::default()),
        }
    }

    /// The address this manager issues nonces for.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Issues the next nonce, reconciling against the network's pending
    /// transaction count.
    pub async fn update_nonce<T: Transport>(
        &self,
        provider: &Provider<T>,
    ) -> Result<u64, ProviderError> {
        let mut state = self.state.lock().await;
        state.managed += 1;

        let network = provider
            .get_transaction_count(self.address, Some(BlockNumberOrTag::Pending.into()))
            .await?;

        if state.cache > 0 && network <= state.cache {
            // The node has not observed our latest sends yet; step past the
            // cached value and clear it.
            let next = state.cache + 1;
            state.cache = 0;
            state.managed = 0;
            Ok(next)
        } else {
            state.cache = network;
            state.managed = 0;
            Ok(network)
        }
    }

    /// Drops the cached state, forcing the next update to trust the network.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = NonceState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethrpc::{Endpoint, NetworkConfig};
    use wiremock::matchers::body_partial_json;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_pending_nonce(server: &MockServer, nonce: u64, times: u64) {
        Mock::given(body_partial_json(serde_json::json!({
            "method": "eth_getTransactionCount",
            "params": ["0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266", "pending"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("{nonce:#x}"),
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;
    }

    fn provider_for(server: &MockServer) -> Provider<ethrpc::HttpTransport> {
        let network = NetworkConfig::new(Endpoint::parse(&server.uri()).unwrap(), 1);
        Provider::connect_http(network).unwrap()
    }

    fn manager() -> NonceManager {
        NonceManager::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap())
    }

    #[tokio::test]
    async fn first_update_adopts_the_network_view() {
        let server = MockServer::start().await;
        mock_pending_nonce(&server, 7, u64::MAX).await;

        let manager = manager();
        let provider = provider_for(&server);
        assert_eq!(manager.update_nonce(&provider).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn stale_network_view_steps_past_the_cache() {
        let server = MockServer::start().await;
        mock_pending_nonce(&server, 5, u64::MAX).await;

        let manager = manager();
        let provider = provider_for(&server);
        // First call caches 5; the node still reports 5 on the second call,
        // so the manager steps to 6.
        assert_eq!(manager.update_nonce(&provider).await.unwrap(), 5);
        assert_eq!(manager.update_nonce(&provider).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn monotonic_network_nonces_yield_monotonic_unique_nonces() {
        let server = MockServer::start().await;
        // The mock chain's pending count strictly increases, as it does when
        // each submitted transaction reaches the pool before the next update.
        for nonce in 0u64..6 {
            mock_pending_nonce(&server, nonce, 1).await;
        }

        let manager = manager();
        let provider = provider_for(&server);
        let mut issued = Vec::new();
        for _ in 0..6 {
            issued.push(manager.update_nonce(&provider).await.unwrap());
        }

        let mut sorted = issued.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), issued.len(), "no duplicates: {issued:?}");
        assert!(
            issued.windows(2).all(|pair| pair[0] <= pair[1]),
            "monotonically non-decreasing: {issued:?}"
        );
    }

    #[tokio::test]
    async fn reset_clears_the_cache() {
        let server = MockServer::start().await;
        mock_pending_nonce(&server, 5, u64::MAX).await;

        let manager = manager();
        let provider = provider_for(&server);
        assert_eq!(manager.update_nonce(&provider).await.unwrap(), 5);
        manager.reset().await;
        // Without the cache the manager adopts the network view again.
        assert_eq!(manager.update_nonce(&provider).await.unwrap(), 5);
    }
}
