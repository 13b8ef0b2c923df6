//! The per-chain `HeightPoller` — discovers new heights, fetches their
//! transactions, and feeds the matcher. One long-lived cooperative task per
//! adapter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::ChainAdapter;
use crate::matcher::match_tx;
use crate::subscription::SubscriptionTable;
use crate::types::EventKind;

/// Process-scoped poller state: the last height whose transactions were
/// fully dispatched.
pub struct HeightPoller<A: ChainAdapter> {
    adapter: Arc<A>,
    table: Arc<SubscriptionTable>,
    last_processed_height: AtomicU64,
    /// Single-writer guard — if an iteration is already running, the next
    /// tick skips rather than overlapping.
    in_flight: AtomicBool,
    /// `true` for Tron/Solana-native wire payloads (`txid` key), `false`
    /// otherwise (`hash` key).
    use_txid_key: bool,
}

impl<A: ChainAdapter> HeightPoller<A> {
    /// Construct a poller whose `last_processed_height` starts at the
    /// adapter's current height, so the first poll does not replay history.
    pub async fn new(adapter: Arc<A>, table: Arc<SubscriptionTable>) -> Result<Self, crate::error::AdapterError> {
        Self::with_txid_key(adapter, table, false).await
    }

    /// Same as `new`, but selects the wire key used for the hash field in
    /// dispatched payloads.
    pub async fn with_txid_key(
        adapter: Arc<A>,
        table: Arc<SubscriptionTable>,
        use_txid_key: bool,
    ) -> Result<Self, crate::error::AdapterError> {
        let start_height = adapter.height().await?;
        Ok(Self {
            adapter,
            table,
            last_processed_height: AtomicU64::new(start_height),
            in_flight: AtomicBool::new(false),
            use_txid_key,
        })
    }

    pub fn last_processed_height(&self) -> u64 {
        self.last_processed_height.load(Ordering::SeqCst)
    }

    /// Run the poll loop until cancelled. Intended to be spawned as its own
    /// tokio task.
    pub async fn run(self: Arc<Self>) {
        if self.adapter.disable_height_processing() {
            tracing::info!(chain = self.adapter.chain_name(), "height processing disabled for this adapter");
            return;
        }

        let interval_ms = self.adapter.block_read_interval_ms();
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));

        loop {
            interval.tick().await;
            self.clone().tick().await;
        }
    }

    /// Run a single poll iteration. Exposed separately so tests can drive it
    /// deterministically without sleeping.
    pub async fn tick(self: Arc<Self>) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return; // previous iteration still running
        }

        self.tick_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
    }

    async fn tick_inner(&self) {
        let chain = self.adapter.chain_name();

        if self.table.subs_for_event(EventKind::SubscribeAccount).is_empty() {
            // Idle efficiency: no subscribers, no upstream load — just track
            // the head so the next subscriber doesn't replay history.
            match self.adapter.height().await {
                Ok(h) => self.last_processed_height.store(h, Ordering::SeqCst),
                Err(e) => tracing::warn!(chain, error = %e, "failed to refresh idle height"),
            }
            return;
        }

        let head = match self.adapter.height().await {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(chain, error = %e, "status: failed to get status");
                return;
            }
        };

        let start = self.last_processed_height.load(Ordering::SeqCst) + 1;
        if start > head {
            return;
        }

        for h in start..=head {
            match self.adapter.txs_at(h).await {
                Ok(txs) => {
                    let subs = self.table.subs_for_event(EventKind::SubscribeAccount);
                    for tx in &txs {
                        let _ = match_tx(tx, &subs, self.use_txid_key, |owner, token| {
                            self.adapter.derive_token_account(owner, token)
                        });
                    }
                }
                Err(e) => {
                    // Skip-on-fail: log and advance past the failing height
                    // anyway so one unreachable height can't block later ones.
                    tracing::warn!(chain, height = h, error = %e, "failed to fetch transactions at height, skipping");
                }
            }
            self.last_processed_height.store(h, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::subscription::{Delivery, Interest};
    use crate::types::{ConnectionId, NormalizedTx};
    use async_trait::async_trait;
    use primitive_types::U256;
    use std::sync::atomic::AtomicU64 as AU64;
    use std::sync::Mutex;

    struct FakeAdapter {
        height: AU64,
        blocks: Mutex<std::collections::HashMap<u64, Vec<NormalizedTx>>>,
        txs_at_calls: AU64,
        fail_heights: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ChainAdapter for FakeAdapter {
        async fn height(&self) -> Result<u64, AdapterError> {
            Ok(self.height.load(Ordering::SeqCst))
        }

        async fn txs_at(&self, height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
            self.txs_at_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_heights.lock().unwrap().contains(&height) {
                return Err(AdapterError::Unavailable("boom".into()));
            }
            Ok(self.blocks.lock().unwrap().get(&height).cloned().unwrap_or_default())
        }

        async fn subscribe_contract(&self, _addr: &str) -> Result<(), AdapterError> {
            Ok(())
        }

        fn is_account(&self, _addr: &str) -> bool {
            true
        }

        fn block_read_interval_ms(&self) -> u64 {
            1
        }

        fn chain_name(&self) -> &str {
            "fake"
        }
    }

    fn tx(to: &str, block: u64) -> NormalizedTx {
        NormalizedTx {
            hash: format!("0x{block}"),
            from: Some("0xfrom".into()),
            to: to.into(),
            value: U256::from(1u64),
            block_number: block,
            timestamp: None,
            token: None,
            symbol: None,
            fee: None,
            receipt: None,
        }
    }

    struct NullDelivery;
    impl Delivery for NullDelivery {
        fn send(&self, _payload: serde_json::Value) {}
        fn error(&self, _message: &str) {}
    }

    #[tokio::test]
    async fn idle_efficiency_no_txs_at_calls_without_subscribers() {
        let adapter = Arc::new(FakeAdapter {
            height: AU64::new(10),
            blocks: Mutex::new(Default::default()),
            txs_at_calls: AU64::new(0),
            fail_heights: Mutex::new(vec![]),
        });
        let table = Arc::new(SubscriptionTable::new());
        let poller = Arc::new(HeightPoller::new(adapter.clone(), table).await.unwrap());

        adapter.height.store(15, Ordering::SeqCst);
        poller.clone().tick().await;

        assert_eq!(adapter.txs_at_calls.load(Ordering::SeqCst), 0);
        assert_eq!(poller.last_processed_height(), 15);
    }

    #[tokio::test]
    async fn monotonic_progress_with_subscribers() {
        let mut blocks = std::collections::HashMap::new();
        blocks.insert(11, vec![tx("0xsubscriber", 11)]);
        let adapter = Arc::new(FakeAdapter {
            height: AU64::new(10),
            blocks: Mutex::new(blocks),
            txs_at_calls: AU64::new(0),
            fail_heights: Mutex::new(vec![]),
        });
        let table = Arc::new(SubscriptionTable::new());
        let poller = Arc::new(HeightPoller::new(adapter.clone(), table.clone()).await.unwrap());

        table
            .add_sub(
                ConnectionId::new(),
                EventKind::SubscribeAccount,
                Arc::new(NullDelivery),
                vec![Interest::new("0xsubscriber", vec![])],
            )
            .unwrap();

        adapter.height.store(13, Ordering::SeqCst);
        poller.clone().tick().await;
        assert_eq!(poller.last_processed_height(), 13);

        // stable height — re-polling doesn't move the cursor further
        poller.clone().tick().await;
        assert_eq!(poller.last_processed_height(), 13);
    }

    #[tokio::test]
    async fn skip_on_fail_advances_past_failing_height() {
        let mut blocks = std::collections::HashMap::new();
        blocks.insert(12, vec![tx("0xsubscriber", 12)]);
        let adapter = Arc::new(FakeAdapter {
            height: AU64::new(10),
            blocks: Mutex::new(blocks),
            txs_at_calls: AU64::new(0),
            fail_heights: Mutex::new(vec![11]),
        });
        let table = Arc::new(SubscriptionTable::new());
        let poller = Arc::new(HeightPoller::new(adapter.clone(), table.clone()).await.unwrap());
        table
            .add_sub(
                ConnectionId::new(),
                EventKind::SubscribeAccount,
                Arc::new(NullDelivery),
                vec![Interest::new("0xsubscriber", vec![])],
            )
            .unwrap();

        adapter.height.store(12, Ordering::SeqCst);
        poller.clone().tick().await;

        // height 11 failed but the poller advanced past it anyway.
        assert_eq!(poller.last_processed_height(), 12);
    }
}
