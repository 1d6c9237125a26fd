//! Script validation errors
//!
//! On-chain refusal is fatal for the submitted transaction and atomic: no
//! partial effects occur. Each variant names the rule that failed.

use crate::bundle::{CoRequirement, RedeemerTag};
use isthmus_head::SnapshotError;
use isthmus_ledger::{LedgerError, OutputRef, TokenName};
use thiserror::Error;

/// A validator refused the transaction
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The spent output carries no datum
    #[error("Missing datum on spent output {0}")]
    MissingDatum(OutputRef),

    /// Datum bytes did not decode to the validator's datum type
    #[error("Datum decoding failed: {0}")]
    Datum(#[from] LedgerError),

    /// The redeemer is not legal against the decoded datum
    #[error("Redeemer {redeemer:?} not accepted against {datum} datum")]
    IllegalMove {
        datum: &'static str,
        redeemer: RedeemerTag,
    },

    /// No participant signed the transaction
    #[error("Transaction is signed by no participant")]
    NoParticipantSignature,

    /// The required participant did not sign
    #[error("Missing signature from the committing participant")]
    MissingParticipantSignature,

    /// A participation token was consumed instead of forwarded
    #[error("Participation token {0:?} is not forwarded through the transaction")]
    TokenNotForwarded(TokenName),

    /// A participation token escaped the abort burn
    #[error("Participation token {name:?} minted at {got}, expected -1")]
    TokenNotBurned { name: TokenName, got: i64 },

    /// Tokens must not be minted or burned on this branch
    #[error("Unexpected mint under the head policy")]
    UnexpectedMint,

    /// Minting outside the seed-spending transaction
    #[error("One-shot seed {0} is not spent by the minting transaction")]
    SeedNotSpent(OutputRef),

    /// Minted token name outside the deterministic participant set
    #[error("Unexpected token name {0:?} under the head policy")]
    UnexpectedTokenName(TokenName),

    /// Minted quantity differs from one per participant
    #[error("Token {name:?} minted at {got}, expected 1")]
    WrongMintQuantity { name: TokenName, got: i64 },

    /// Positive quantities in a burn
    #[error("Burn contains positive quantity for token {0:?}")]
    PositiveBurnQuantity(TokenName),

    /// The transaction must pay exactly one output to the head address
    #[error("Expected exactly one head output, found {0}")]
    HeadOutputCount(usize),

    /// The transaction must spend exactly one head state input
    #[error("Expected exactly one head input, found {0}")]
    HeadInputCount(usize),

    /// The new head datum differs from the enforced successor state
    #[error("Head output datum does not match the enforced successor state")]
    HeadDatumMismatch,

    /// Committed-output list in the Open datum differs from the decoded
    /// token-carrying inputs
    #[error("Open datum's committed set does not match the collected commitments")]
    CommittedSetMismatch,

    /// Head output value differs from the collected input value
    #[error("Head output value does not match the collected value")]
    CollectedValueMismatch,

    /// Abort must pay the final datum with zero value
    #[error("Final head output must carry zero value")]
    NonZeroFinalValue,

    /// Close must preserve the head input's value
    #[error("Final head output value does not preserve the closed head value")]
    ClosedValueMismatch,

    /// Snapshot verification failed on the Close branch
    #[error("Snapshot verification failed: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The guarded initial output is not spent alone
    #[error("Initial validator at {0} must be the only initial input")]
    InitialInputNotAlone(OutputRef),

    /// The committed fragment is not spent by the transaction
    #[error("Committed fragment {0} is not spent by the transaction")]
    FragmentNotSpent(OutputRef),

    /// The fragment input differs from the redeemer's claim
    #[error("Committed fragment {0} does not match the spent output")]
    FragmentMismatch(OutputRef),

    /// Commit output missing or not unique
    #[error("Expected exactly one commit output, found {0}")]
    CommitOutputCount(usize),

    /// Commit output datum or value malformed
    #[error("Commit output does not carry the committed fragment and forwarded token")]
    CommitOutputMismatch,

    /// Reimbursement output absent on the abort path
    #[error("Committed output {0} is not paid back to its owner")]
    ReimbursementMissing(OutputRef),

    /// A declared sibling execution is absent from the bundle
    #[error("Missing co-required execution: {0:?}")]
    MissingCoRequirement(CoRequirement),

    /// The policy execution does not match the head's policy id
    #[error("Policy id mismatch between execution and head parameters")]
    PolicyMismatch,

    /// Key aggregation failure while checking the Open datum
    #[error("Multisignature error: {0}")]
    Multisig(#[from] isthmus_multisig::MultisigError),
}
