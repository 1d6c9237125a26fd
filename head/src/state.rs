//! Head state and snapshot data types
//!
//! All of these are explicit sum/product types so the transition table
//! stays exhaustiveness-checked. `HeadState` is the single mutable entity
//! of a head, and it only ever changes through a confirmed base-ledger
//! transaction; off-chain code proposes successor values, nothing more.

use isthmus_ledger::{OutputRef, Transaction, TxOut, UtxoSet};
use isthmus_multisig::{AggregateKey, MultiSignature, VerificationKey};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a head
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HeadState {
    /// Created, no commitments yet
    Initial,
    /// Commitments being gathered (tracked externally by the watcher)
    Collecting,
    /// Operational off-ledger
    Open(OpenState),
    /// Settled; terminal
    Closed,
}

impl HeadState {
    /// Short tag for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            HeadState::Initial => "Initial",
            HeadState::Collecting => "Collecting",
            HeadState::Open(_) => "Open",
            HeadState::Closed => "Closed",
        }
    }
}

/// Payload of an operational head
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenState {
    /// Aggregate public key of all participants
    pub key_aggregate: AggregateKey,
    /// Last confirmed snapshot
    pub eta: Eta,
}

/// A confirmed snapshot: the last state all participants agreed on
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eta {
    /// Agreed UTXO set
    pub utxos: UtxoSet,
    /// Monotonically non-decreasing sequence number
    pub seq: u64,
    /// Transactions already folded into `utxos`, in fold order
    pub transactions: Vec<Transaction>,
}

impl Eta {
    /// The snapshot before anything was confirmed
    pub fn genesis() -> Self {
        Self::default()
    }

    /// The initial snapshot of a freshly opened head
    pub fn open(utxos: UtxoSet) -> Self {
        Self {
            utxos,
            seq: 0,
            transactions: Vec::new(),
        }
    }
}

/// A head-internal transaction with its aggregate authorization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    /// One combined signature standing in for all participants
    pub signature: MultiSignature,
}

/// A close proposal — untrusted until the snapshot engine verifies it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Xi {
    /// Proposed UTXO set (ignored when `seq == 0`)
    pub utxos: UtxoSet,
    /// Proposed sequence number
    pub seq: u64,
    /// Aggregate signature over `(utxos, seq)`; required when `seq > 0`
    pub snapshot_signature: Option<MultiSignature>,
    /// Transactions to fold, each with its own aggregate signature
    pub transactions: Vec<SignedTransaction>,
}

/// A participant's locked contribution to a head
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// The committing participant
    pub participant: VerificationKey,
    /// The output locked at the commit address (carries the token)
    pub lock: OutputRef,
    /// The contributed UTXO fragment: original reference and output
    pub fragment: (OutputRef, TxOut),
}

impl Commitment {
    /// Reference of the underlying contributed output
    pub fn fragment_ref(&self) -> OutputRef {
        self.fragment.0
    }
}
