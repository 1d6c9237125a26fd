//! ISTHMUS Head Protocol Core
//!
//! The off-chain half of the head lifecycle:
//! - [`HeadParameters`]: the immutable participant set and monetary policy
//!   that identify a head and its script addresses
//! - [`HeadState`] and the pure [`transition`] function deciding, for a
//!   (state, input) pair, whether a move is legal and which base-ledger
//!   effects it requires
//! - The snapshot engine ([`snapshot::close`]) validating a close proposal
//!   against the aggregate key and the last confirmed snapshot
//! - Effect resolution turning required effects into a draft base-ledger
//!   transaction
//!
//! Nothing here performs I/O or consults a clock. The authoritative head
//! state lives on-chain; this crate only proposes successor values, and the
//! on-chain validator triad in `isthmus-scripts` re-checks every decision
//! independently.

pub mod effects;
pub mod errors;
pub mod params;
pub mod snapshot;
pub mod state;
pub mod transition;

pub use effects::{resolve_effects, DraftTransaction};
pub use errors::{ConstraintError, SnapshotError, TransitionError};
pub use params::HeadParameters;
pub use snapshot::{close, sign_snapshot, sign_transaction, snapshot_message, transaction_message};
pub use state::{Commitment, Eta, HeadState, OpenState, SignedTransaction, Xi};
pub use transition::{transition, Effect, Input, Transition};

/// Result type for transition decisions
pub type TransitionResult<T> = Result<T, TransitionError>;
