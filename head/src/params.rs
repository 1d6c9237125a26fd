//! Head parameters and address derivation

use isthmus_ledger::{Address, KeyHash, PolicyId, ScriptHash, TokenName};
use isthmus_multisig::{AggregateKey, MultisigResult, VerificationKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Domain tags for script address derivation
const TAG_HEAD: &[u8] = b"isthmus/script/head";
const TAG_INITIAL: &[u8] = b"isthmus/script/initial";
const TAG_COMMIT: &[u8] = b"isthmus/script/commit";

/// The immutable parameters of a head
///
/// Fixed at head creation; uniquely determine the head's script addresses
/// and its participation-token currency. The participant list is
/// order-significant: token names and indices derive from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadParameters {
    /// Ordered participant verification keys (size N, fixed for the head)
    pub participants: Vec<VerificationKey>,
    /// The head's monetary-policy identifier
    pub policy_id: PolicyId,
    /// Deadline after which a head stuck collecting commitments is aborted
    pub commit_deadline: Duration,
}

impl HeadParameters {
    pub fn new(
        participants: Vec<VerificationKey>,
        policy_id: PolicyId,
        commit_deadline: Duration,
    ) -> Self {
        Self {
            participants,
            policy_id,
            commit_deadline,
        }
    }

    /// Number of participants N
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// True when the key belongs to the participant set
    pub fn is_participant(&self, key: &VerificationKey) -> bool {
        self.participants.contains(key)
    }

    /// A participant's payment key hash
    pub fn key_hash(key: &VerificationKey) -> KeyHash {
        KeyHash(key.hash())
    }

    /// Deterministic participation-token name for a participant
    pub fn token_name(key: &VerificationKey) -> TokenName {
        TokenName(key.hash())
    }

    /// Token names for the whole participant set, in participant order
    pub fn token_names(&self) -> Vec<TokenName> {
        self.participants.iter().map(Self::token_name).collect()
    }

    /// Aggregate public key of the participant set
    pub fn key_aggregate(&self) -> MultisigResult<AggregateKey> {
        AggregateKey::aggregate(&self.participants)
    }

    /// The head validator's script address
    pub fn head_address(&self) -> Address {
        Address::Script(self.script_hash(TAG_HEAD, &[]))
    }

    /// The initial validator's address for one participant
    ///
    /// The initial validator is parameterized per participant, so each
    /// participant's pre-commit output lives at a distinct address.
    pub fn initial_address(&self, participant: &VerificationKey) -> Address {
        Address::Script(self.script_hash(TAG_INITIAL, &participant.to_bytes()))
    }

    /// The commit validator's script address
    pub fn commit_address(&self) -> Address {
        Address::Script(self.script_hash(TAG_COMMIT, &[]))
    }

    fn script_hash(&self, tag: &[u8], extra: &[u8]) -> ScriptHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag);
        hasher.update(&self.policy_id.0);
        for key in &self.participants {
            hasher.update(&key.to_bytes());
        }
        hasher.update(extra);
        ScriptHash(*hasher.finalize().as_bytes())
    }
}
