//! Shared application state handed to every axum handler.

use std::sync::Arc;

use chainwatch_core::{ChainAdapter, ConnectionLifecycle, ContractInterestSet, SubscriptionTable};

pub struct AppState<A: ChainAdapter> {
    pub adapter: Arc<A>,
    pub table: Arc<SubscriptionTable>,
    pub lifecycle: Arc<ConnectionLifecycle<A>>,
    /// Selects the wire key for the hash field in matched-event payloads
    /// (`txid` for Tron/Solana-native, `hash` otherwise) — mirrors the
    /// `HeightPoller`'s own setting so live and historical payloads agree.
    pub use_txid_key: bool,
}

impl<A: ChainAdapter> AppState<A> {
    pub fn new(adapter: Arc<A>, use_txid_key: bool) -> Arc<Self> {
        let table = Arc::new(SubscriptionTable::new());
        let contracts = Arc::new(ContractInterestSet::new());
        let lifecycle = Arc::new(ConnectionLifecycle::new(adapter.clone(), table.clone(), contracts));
        Arc::new(Self { adapter, table, lifecycle, use_txid_key })
    }
}
