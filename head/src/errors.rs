//! Error taxonomy for the head core
//!
//! Off-chain rejections name the specific guard that failed so an operator
//! can tell "not yet ready" apart from malicious or malformed input.

use isthmus_ledger::{LedgerError, OutputRef};
use isthmus_multisig::MultisigError;
use thiserror::Error;

/// A proposed transition was rejected
#[derive(Error, Debug)]
pub enum TransitionError {
    /// The (state, input) pair is not in the transition table
    #[error("Invalid transition: input {input} not accepted in state {state}")]
    InvalidTransition {
        /// Tag of the current state
        state: &'static str,
        /// Tag of the rejected input
        input: &'static str,
    },

    /// CollectCom quorum not met
    #[error("Commitment count mismatch: got {got}, need {need}")]
    ParticipantCountMismatch { got: usize, need: usize },

    /// A commitment claims a key outside the participant set
    #[error("Commitment from unknown participant {0}")]
    UnknownParticipant(String),

    /// Two commitments claim the same participant
    #[error("Duplicate commitment for participant {0}")]
    DuplicateCommitment(String),

    /// Two commitments contribute the same underlying output
    #[error("Duplicate committed fragment: {0}")]
    DuplicateFragment(OutputRef),

    /// Close verification failed (distinguished for diagnostics)
    #[error("Snapshot verification failed: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Key aggregation failure
    #[error("Multisignature error: {0}")]
    Multisig(#[from] MultisigError),
}

/// Why a close proposal failed verification
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// A folded transaction's aggregate signature did not verify
    #[error("Aggregate signature invalid for transaction at index {index}")]
    TransactionSignature { index: usize },

    /// Sequence number > 0 requires a snapshot signature
    #[error("Missing snapshot signature for sequence number {seq}")]
    MissingSnapshotSignature { seq: u64 },

    /// The snapshot signature does not cover this (utxos, seq) pair
    #[error("Snapshot signature does not authenticate the proposed (utxos, sequence) pair")]
    SnapshotSignature,

    /// The proposal regresses behind the confirmed snapshot
    #[error("Sequence regression: proposed {proposed}, confirmed {confirmed}")]
    SequenceRegression { proposed: u64, confirmed: u64 },

    /// Folding the proposed transactions failed
    #[error("Transaction fold failed: {0}")]
    Apply(#[from] LedgerError),
}

/// Effect resolution could not construct a draft transaction
///
/// Surfaced to the caller; never retried automatically.
#[derive(Error, Debug)]
pub enum ConstraintError {
    /// A reimbursement target carries no key address to pay back to
    #[error("No owning key address for reimbursement of {0}")]
    NoOwningKey(OutputRef),

    /// The effect list resolves to a transaction that does nothing
    #[error("Effects resolve to an empty draft transaction")]
    EmptyDraft,
}
