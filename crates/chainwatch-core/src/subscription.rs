//! `SubscriptionTable` — mapping `(connection-id, event) → interests +
//! delivery callback`, plus the tombstone-and-sweep lifecycle that lets the
//! matcher snapshot the table without taking a write lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::SubError;
use crate::types::{ConnectionId, EventKind};

/// Maximum number of live subscription entries across all connections.
pub const MAX_SUBS: usize = 10_000;

/// How long a tombstoned entry waits before the sweeper reclaims it.
pub const TOMBSTONE_SWEEP_DELAY: Duration = Duration::from_secs(5);

/// One `(address, token filter)` pair within a subscription's interests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    pub address: String,
    pub tokens: Vec<String>,
}

impl Interest {
    pub fn new(address: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            address: address.into(),
            tokens,
        }
    }
}

/// Per-connection delivery callback bound to the underlying transport.
/// Implementations MUST be non-blocking — a slow consumer must not stall
/// the dispatcher (see §5 of the design).
pub trait Delivery: Send + Sync {
    /// Deliver a matched event payload.
    fn send(&self, payload: Value);

    /// Deliver a protocol error frame.
    fn error(&self, message: &str);
}

struct Entry {
    send: Arc<dyn Delivery>,
    interests: Vec<Interest>,
}

enum Slot {
    Live(Entry),
    Tombstone(Instant),
}

/// A read-only snapshot of one live subscription, handed to the matcher.
pub struct SubSnapshot {
    pub cid: ConnectionId,
    pub send: Arc<dyn Delivery>,
    pub interests: Vec<Interest>,
}

#[derive(Default)]
pub struct SubscriptionTable {
    rows: RwLock<HashMap<(ConnectionId, EventKind), Slot>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or extend a subscription. If a tombstone exists for `cid`
    /// (the connection is closing), the call is silently dropped.
    pub fn add_sub(
        &self,
        cid: ConnectionId,
        event: EventKind,
        send: Arc<dyn Delivery>,
        interests: Vec<Interest>,
    ) -> Result<(), SubError> {
        let mut rows = self.rows.write().unwrap();
        let key = (cid, event);

        match rows.get(&key) {
            Some(Slot::Tombstone(_)) => return Ok(()),
            Some(Slot::Live(existing)) => {
                let mut merged = existing.interests.clone();
                merged.extend(interests);
                rows.insert(key, Slot::Live(Entry { send, interests: merged }));
                return Ok(());
            }
            None => {}
        }

        let live_count = rows
            .values()
            .filter(|s| matches!(s, Slot::Live(_)))
            .count();
        if live_count >= MAX_SUBS {
            return Err(SubError::CapacityExceeded);
        }

        rows.insert(key, Slot::Live(Entry { send, interests }));
        Ok(())
    }

    /// Read-only snapshot of every live subscription for `event`. Safe to
    /// call concurrently with mutation — it's a clone of the outer
    /// collection taken under a brief read lock.
    pub fn subs_for_event(&self, event: EventKind) -> Vec<SubSnapshot> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .filter_map(|((cid, ev), slot)| {
                if *ev != event {
                    return None;
                }
                match slot {
                    Slot::Live(entry) => Some(SubSnapshot {
                        cid: *cid,
                        send: entry.send.clone(),
                        interests: entry.interests.clone(),
                    }),
                    Slot::Tombstone(_) => None,
                }
            })
            .collect()
    }

    /// Current interests for `(cid, event)`, used to enforce per-connection
    /// address uniqueness before inserting a new interest.
    pub fn cid_interests(&self, cid: ConnectionId, event: EventKind) -> Option<Vec<Interest>> {
        match self.rows.read().unwrap().get(&(cid, event)) {
            Some(Slot::Live(entry)) => Some(entry.interests.clone()),
            _ => None,
        }
    }

    /// Mark every entry belonging to `cid` as a tombstone; the sweeper
    /// reclaims it after `TOMBSTONE_SWEEP_DELAY`.
    pub fn close(&self, cid: ConnectionId) {
        let mut rows = self.rows.write().unwrap();
        let now = Instant::now();
        for (key, slot) in rows.iter_mut() {
            if key.0 == cid {
                *slot = Slot::Tombstone(now);
            }
        }
    }

    /// Remove tombstones older than `TOMBSTONE_SWEEP_DELAY`. Called
    /// periodically by a shared sweep task.
    pub fn sweep(&self) {
        let mut rows = self.rows.write().unwrap();
        let now = Instant::now();
        rows.retain(|_, slot| match slot {
            Slot::Tombstone(at) => now.duration_since(*at) < TOMBSTONE_SWEEP_DELAY,
            Slot::Live(_) => true,
        });
    }

    /// Number of live entries (excludes tombstones awaiting sweep).
    pub fn live_count(&self) -> usize {
        self.rows
            .read()
            .unwrap()
            .values()
            .filter(|s| matches!(s, Slot::Live(_)))
            .count()
    }
}

/// Spawn the periodic tombstone sweeper. Runs until the table is dropped.
pub fn spawn_sweeper(table: Arc<SubscriptionTable>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOMBSTONE_SWEEP_DELAY);
        loop {
            interval.tick().await;
            table.sweep();
        }
    })
}
