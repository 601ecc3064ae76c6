//! The prepared-envelope pool.
//!
//! Holds fully-prepared envelopes between preparation and send. Insertion
//! goes through the wallet, which asserts first — the pool never holds a
//! partially-prepared envelope. Consumption is LIFO; directed dispatch
//! searches tail-to-head on `(type, nonce)` so ties resolve to the newest
//! entry.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::envelope::{TransactionEnvelope, TransactionType};

/// Mutex-guarded deque of prepared envelopes.
#[derive(Debug, Default)]
pub struct EnvelopePool {
    entries: Mutex<VecDeque<TransactionEnvelope>>,
}

impl EnvelopePool {
    /// An empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an envelope at the tail.
    pub(crate) async fn push(&self, envelope: TransactionEnvelope) {
        self.entries.lock().await.push_back(envelope);
    }

    /// Pops the most recently inserted envelope.
    pub async fn pop_last(&self) -> Option<TransactionEnvelope> {
        self.entries.lock().await.pop_back()
    }

    /// Removes the newest envelope matching `(type, nonce)`.
    pub async fn take_matching(
        &self,
        transaction_type: TransactionType,
        nonce: u64,
    ) -> Option<TransactionEnvelope> {
        let mut entries = self.entries.lock().await;
        let position = entries.iter().rposition(|envelope| {
            envelope.transaction_type() == transaction_type && envelope.nonce() == nonce
        })?;
        entries.remove(position)
    }

    /// How many envelopes are parked.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the pool is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::LondonEnvelope;
    use alloy_primitives::{Bytes, U256};

    fn london(nonce: u64, gas: u64) -> TransactionEnvelope {
        TransactionEnvelope::London(LondonEnvelope {
            chain_id: 1,
            nonce,
            to: None,
            value: U256::ZERO,
            data: Bytes::new(),
            gas,
            max_fee_per_gas: 2,
            max_priority_fee_per_gas: 1,
            access_list: Default::default(),
        })
    }

    #[tokio::test]
    async fn consumption_is_lifo() {
        let pool = EnvelopePool::new();
        pool.push(london(0, 21_000)).await;
        pool.push(london(1, 21_000)).await;

        assert_eq!(pool.pop_last().await.unwrap().nonce(), 1);
        assert_eq!(pool.pop_last().await.unwrap().nonce(), 0);
        assert!(pool.pop_last().await.is_none());
    }

    #[tokio::test]
    async fn directed_search_matches_type_and_nonce() {
        let pool = EnvelopePool::new();
        pool.push(london(0, 21_000)).await;
        pool.push(london(1, 21_000)).await;

        assert!(
            pool.take_matching(TransactionType::Legacy, 1)
                .await
                .is_none()
        );
        assert_eq!(
            pool.take_matching(TransactionType::London, 1)
                .await
                .unwrap()
                .nonce(),
            1
        );
        assert_eq!(pool.len().await, 1);
    }

    #[tokio::test]
    async fn ties_resolve_to_the_newest_entry() {
        let pool = EnvelopePool::new();
        pool.push(london(7, 21_000)).await;
        pool.push(london(7, 50_000)).await;

        let taken = pool.take_matching(TransactionType::London, 7).await.unwrap();
        let TransactionEnvelope::London(tx) = taken else {
            panic!("expected a london envelope");
        };
        assert_eq!(tx.gas, 50_000);
        assert_eq!(pool.len().await, 1);
    }
}
