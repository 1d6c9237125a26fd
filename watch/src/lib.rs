//! ISTHMUS Chain Watcher
//!
//! Off-chain coordination around the base ledger:
//! - [`ChainQuery`]: the narrow async seam to whatever ledger client feeds
//!   the watcher (a real client, or [`MemoryChain`] for tests and local
//!   simulation)
//! - [`CommitCollector`]: the polling loop that accumulates commitments at
//!   the commit address until quorum, then hands the full set to the head
//!   transition function — or triggers an abort when the commit deadline
//!   passes first
//!
//! The collector is polling, not event-driven: each tick fetches new
//! activity since the last observed point. Conflicting submissions resolve
//! on-chain; a losing submitter re-reads state and retries.

mod collector;
mod errors;
mod memory;

pub use collector::{
    ChainPoint, ChainQuery, CollectorConfig, CollectorState, CommitCollector, PollOutcome,
};
pub use errors::WatchError;
pub use memory::MemoryChain;

/// Result type for watcher operations
pub type WatchResult<T> = Result<T, WatchError>;
