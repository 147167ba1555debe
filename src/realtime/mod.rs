//! # Real-Time Queries
//!
//! Change propagation from committed mutations to live query subscribers.
//!
//! ## Architecture
//!
//! - **Change Feed**: sequences each committed mutation and fans it out
//! - **Live Query Hub**: one logical query per descriptor, re-evaluated per change
//! - **Query Subscription**: per-consumer handle that never moves backwards

mod errors;
mod event;
mod feed;
mod query;

pub use errors::{RealtimeError, RealtimeResult};
pub use event::{ChangeEvent, EventType};
pub use feed::{ChangeFeed, EventReceiver, EventSender};
pub use query::{LiveQueryHub, QueryDescriptor, QueryResult, QueryState, QuerySubscription};
