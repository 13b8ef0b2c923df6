//! `ConnectionLifecycle` — mints connection ids, validates and installs
//! subscriptions, and releases resources on disconnect.

use std::sync::Arc;

use crate::adapter::ChainAdapter;
use crate::error::SubError;
use crate::interest::ContractInterestSet;
use crate::subscription::{Delivery, Interest, SubscriptionTable};
use crate::types::{ConnectionId, EventKind};

pub struct ConnectionLifecycle<A: ChainAdapter> {
    adapter: Arc<A>,
    table: Arc<SubscriptionTable>,
    contracts: Arc<ContractInterestSet>,
}

impl<A: ChainAdapter> ConnectionLifecycle<A> {
    pub fn new(adapter: Arc<A>, table: Arc<SubscriptionTable>, contracts: Arc<ContractInterestSet>) -> Self {
        Self { adapter, table, contracts }
    }

    /// Accept a new connection and mint its id.
    pub fn accept(&self) -> ConnectionId {
        ConnectionId::new()
    }

    /// Handle a `subscribeAccount` request: validate per §4.2, register the
    /// interest, seed the contract interest set, and install upstream
    /// filters for first-seen tokens.
    pub async fn subscribe_account(
        &self,
        cid: ConnectionId,
        send: Arc<dyn Delivery>,
        address: &str,
        tokens: Vec<String>,
    ) -> Result<(), SubError> {
        if !self.adapter.is_account(address) {
            return Err(SubError::NotAnAccount);
        }
        for token in &tokens {
            if self.adapter.is_account(token) {
                return Err(SubError::NotAContract);
            }
        }

        if let Some(existing) = self.table.cid_interests(cid, EventKind::SubscribeAccount) {
            if existing.iter().any(|i| i.address.eq_ignore_ascii_case(address)) {
                return Err(SubError::AlreadySubscribed);
            }
        }

        for token in &tokens {
            if self.contracts.insert(token) {
                if let Err(e) = self.adapter.subscribe_contract(token).await {
                    tracing::warn!(token, error = %e, "failed to install upstream contract filter");
                }
            }
        }

        self.table.add_sub(
            cid,
            EventKind::SubscribeAccount,
            send,
            vec![Interest::new(address, tokens)],
        )
    }

    /// Handle connection close: tombstone every subscription owned by `cid`.
    /// Contract interests are retained — this avoids thrashing upstream
    /// filters for reconnects.
    pub fn close(&self, cid: ConnectionId) {
        self.table.close(cid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::types::NormalizedTx;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAdapter {
        known_contracts: Vec<&'static str>,
        subscribe_calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainAdapter for FakeAdapter {
        async fn height(&self) -> Result<u64, AdapterError> {
            Ok(0)
        }
        async fn txs_at(&self, _height: u64) -> Result<Vec<NormalizedTx>, AdapterError> {
            Ok(vec![])
        }
        async fn subscribe_contract(&self, _addr: &str) -> Result<(), AdapterError> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn is_account(&self, addr: &str) -> bool {
            !self.known_contracts.contains(&addr)
        }
        fn chain_name(&self) -> &str {
            "fake"
        }
    }

    struct NullDelivery;
    impl Delivery for NullDelivery {
        fn send(&self, _payload: serde_json::Value) {}
        fn error(&self, _message: &str) {}
    }

    fn lifecycle(contracts: Vec<&'static str>) -> ConnectionLifecycle<FakeAdapter> {
        let adapter = Arc::new(FakeAdapter {
            known_contracts: contracts,
            subscribe_calls: AtomicUsize::new(0),
        });
        ConnectionLifecycle::new(adapter, Arc::new(SubscriptionTable::new()), Arc::new(ContractInterestSet::new()))
    }

    #[tokio::test]
    async fn rejects_contract_address_as_account() {
        let lc = lifecycle(vec!["0xcontract"]);
        let cid = lc.accept();
        let err = lc
            .subscribe_account(cid, Arc::new(NullDelivery), "0xcontract", vec![])
            .await
            .unwrap_err();
        assert_eq!(err, SubError::NotAnAccount);
    }

    #[tokio::test]
    async fn rejects_account_address_as_token() {
        let lc = lifecycle(vec!["0xtoken_is_actually_contract_but_not_in_list"]);
        let cid = lc.accept();
        // "0xtoken" resolves to is_account()==true (not in known_contracts) -> rejected as token
        let err = lc
            .subscribe_account(cid, Arc::new(NullDelivery), "0xowner", vec!["0xtoken".into()])
            .await
            .unwrap_err();
        assert_eq!(err, SubError::NotAContract);
    }

    #[tokio::test]
    async fn duplicate_subscribe_same_connection_rejected() {
        let lc = lifecycle(vec!["0xtoken"]);
        let cid = lc.accept();
        lc.subscribe_account(cid, Arc::new(NullDelivery), "0xowner", vec!["0xtoken".into()])
            .await
            .unwrap();
        let err = lc
            .subscribe_account(cid, Arc::new(NullDelivery), "0xowner", vec!["0xtoken".into()])
            .await
            .unwrap_err();
        assert_eq!(err, SubError::AlreadySubscribed);
    }

    #[tokio::test]
    async fn first_seen_token_triggers_upstream_filter_install_once() {
        let adapter = Arc::new(FakeAdapter {
            known_contracts: vec!["0xtoken"],
            subscribe_calls: AtomicUsize::new(0),
        });
        let lc = ConnectionLifecycle::new(adapter.clone(), Arc::new(SubscriptionTable::new()), Arc::new(ContractInterestSet::new()));

        let cid1 = lc.accept();
        lc.subscribe_account(cid1, Arc::new(NullDelivery), "0xowner1", vec!["0xtoken".into()])
            .await
            .unwrap();
        let cid2 = lc.accept();
        lc.subscribe_account(cid2, Arc::new(NullDelivery), "0xowner2", vec!["0xtoken".into()])
            .await
            .unwrap();

        assert_eq!(adapter.subscribe_calls.load(Ordering::SeqCst), 1);
    }
}
