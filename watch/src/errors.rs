//! Watcher error types

use isthmus_head::TransitionError;
use isthmus_ledger::LedgerError;
use isthmus_scripts::ScriptError;
use thiserror::Error;

/// Errors from chain observation and submission
#[derive(Error, Debug)]
pub enum WatchError {
    /// The underlying ledger query failed
    #[error("Chain query failed: {0}")]
    Query(String),

    /// A submitted transaction was refused by on-chain validation
    #[error("Transaction refused on-chain: {0}")]
    Script(#[from] ScriptError),

    /// A submitted transaction did not resolve against the chain state
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The transition function rejected the collector's proposed move
    #[error("Transition rejected: {0}")]
    Transition(#[from] TransitionError),

    /// A submitted transaction does not conserve value
    #[error("Value not conserved by submitted transaction")]
    ValueNotConserved,
}
