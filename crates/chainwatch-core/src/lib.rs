//! chainwatch-core — the subscription table, matcher and chain-adapter
//! contract shared by every ChainWatch backend.
//!
//! # Architecture
//!
//! ```text
//! ConnectionLifecycle → SubscriptionTable ←── HeightPoller<A: ChainAdapter>
//!        │                     │                       │
//!    ContractInterestSet       └── matcher::match_tx ───┘
//! ```
//!
//! A `ChainAdapter` implementation is the only chain-specific code in the
//! system; everything in this crate is chain-agnostic.

pub mod adapter;
pub mod error;
pub mod interest;
pub mod lifecycle;
pub mod matcher;
pub mod poller;
pub mod subscription;
pub mod types;

pub use adapter::{ChainAdapter, DEFAULT_BLOCK_READ_INTERVAL_MS};
pub use error::{AdapterError, GatewayError, SubError};
pub use interest::ContractInterestSet;
pub use lifecycle::ConnectionLifecycle;
pub use matcher::{match_tx, Delivery as MatchedDelivery};
pub use poller::HeightPoller;
pub use subscription::{spawn_sweeper, Delivery, Interest, SubSnapshot, SubscriptionTable};
pub use types::{ConnectionId, EventKind, NormalizedTx};
