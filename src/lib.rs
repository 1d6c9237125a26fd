//! ISTHMUS: Two-Layer Head Protocol
//!
//! This is the root crate that re-exports all ISTHMUS components for
//! integration testing and provides unified access to the protocol core.
//!
//! ## Architecture Overview
//!
//! A set of participants jointly lock funds on a base ledger, operate off
//! that ledger for a period while exchanging aggregate-signed snapshots of
//! a side ledger, and eventually settle back. Legality of every lifecycle
//! move is decided twice, by construction from one shared implementation:
//!
//! - **Off-chain**: the pure head transition function proposes successor
//!   states and the base-ledger effects they require
//! - **On-chain**: the validator triad (Head, Initial, Commit) plus the
//!   one-shot participation-token policy refuse any transaction that does
//!   not execute exactly the claimed transition
//!
//! ## Crate Organization
//!
//! - `isthmus-multisig`: BLS aggregate multisignatures and key hashing
//! - `isthmus-ledger`: UTXO model, transactions, deterministic fold
//! - `isthmus-head`: parameters, state machine, snapshot engine, effects
//! - `isthmus-scripts`: validator triad, token policy, bundle harness
//! - `isthmus-watch`: commit collector and chain query seam
//! - `isthmus-cli`: lifecycle driver over an in-memory chain

// Re-export all crates for integration testing
pub use isthmus_head as head;
pub use isthmus_ledger as ledger;
pub use isthmus_multisig as multisig;
pub use isthmus_scripts as scripts;
pub use isthmus_watch as watch;

/// ISTHMUS protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol configuration
pub mod config {
    use std::time::Duration;

    /// Smallest participant set a head makes sense for
    pub const MIN_PARTICIPANTS: usize = 2;

    /// Default deadline for gathering commitments
    pub const DEFAULT_COMMIT_DEADLINE: Duration = Duration::from_secs(600);

    /// Default polling interval for the commit watcher
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use isthmus_head::{
        close, transition, Commitment, Effect, Eta, HeadParameters, HeadState, Input, OpenState,
        Transition, TransitionError, Xi,
    };
    pub use isthmus_ledger::{OutputRef, Transaction, TxOut, UtxoSet, Value};
    pub use isthmus_multisig::{AggregateKey, MultiSignature, SigningKey, VerificationKey};
    pub use isthmus_scripts::{validate_bundle, HeadDatum, ScriptExecution};
    pub use isthmus_watch::{ChainQuery, CommitCollector, MemoryChain};
}
