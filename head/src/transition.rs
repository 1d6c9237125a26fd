//! The head transition function
//!
//! `transition(params, state, input)` is the single decision point for the
//! off-chain lifecycle: given the current state and a proposed input it
//! either rejects the move or returns the successor state together with the
//! base-ledger effects the move requires. Pure — no I/O, no clock, no
//! network state. The deadline that triggers an `Abort` is the watcher's
//! business; this function only decides whether an abort is legal from the
//! current state.

use crate::errors::TransitionError;
use crate::params::HeadParameters;
use crate::snapshot;
use crate::state::{Commitment, Eta, HeadState, OpenState, Xi};
use isthmus_ledger::{OutputRef, TokenName, UtxoSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An input proposed against the current head state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Input {
    /// Start gathering commitments
    Init,
    /// All commitments observed; open the head
    CollectCom { commitments: Vec<Commitment> },
    /// Close with a candidate final snapshot
    Close { xi: Xi },
    /// Give up before opening; burn tokens and reimburse
    Abort { commitments: Vec<Commitment> },
}

impl Input {
    /// Short tag for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            Input::Init => "Init",
            Input::CollectCom { .. } => "CollectCom",
            Input::Close { .. } => "Close",
            Input::Abort { .. } => "Abort",
        }
    }
}

/// A base-ledger effect a legal transition requires
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Consume the commitment output locked at `lock`
    ConsumeCommitment { lock: OutputRef },
    /// Burn one participation token
    BurnToken { name: TokenName },
    /// Pay a committed fragment back unchanged to its owner
    Reimburse { commitment: Commitment },
}

/// A legal move: required effects plus the successor state
#[derive(Clone, Debug)]
pub struct Transition {
    pub effects: Vec<Effect>,
    pub next: HeadState,
}

impl Transition {
    fn to(next: HeadState) -> Self {
        Self {
            effects: Vec::new(),
            next,
        }
    }
}

/// Decide whether `input` is legal in `state`
///
/// Every pair outside the transition table is rejected with
/// [`TransitionError::InvalidTransition`]; the guards of matching rows
/// reject with the specific failure. Rejection mutates nothing — the caller
/// simply does not attempt the move.
pub fn transition(
    params: &HeadParameters,
    state: &HeadState,
    input: &Input,
) -> Result<Transition, TransitionError> {
    match (state, input) {
        (HeadState::Initial, Input::Init) => Ok(Transition::to(HeadState::Collecting)),

        (HeadState::Collecting, Input::CollectCom { commitments }) => {
            collect_com(params, commitments)
        }

        (HeadState::Open(open), Input::Close { xi }) => {
            snapshot::close(&open.key_aggregate, &open.eta, xi)?;
            Ok(Transition::to(HeadState::Closed))
        }

        (HeadState::Initial | HeadState::Collecting, Input::Abort { commitments }) => {
            abort(params, commitments)
        }

        (state, input) => Err(TransitionError::InvalidTransition {
            state: state.tag(),
            input: input.tag(),
        }),
    }
}

/// CollectCom guard: exactly one commitment per participant
///
/// Order-independent: the resulting `Open` state is the same for any
/// permutation of the commitment list.
fn collect_com(
    params: &HeadParameters,
    commitments: &[Commitment],
) -> Result<Transition, TransitionError> {
    if commitments.len() != params.participant_count() {
        return Err(TransitionError::ParticipantCountMismatch {
            got: commitments.len(),
            need: params.participant_count(),
        });
    }

    let mut seen_participants = BTreeSet::new();
    let mut seen_fragments = BTreeSet::new();
    let mut utxos = UtxoSet::new();
    let mut effects = Vec::with_capacity(commitments.len());

    for commitment in commitments {
        if !params.is_participant(&commitment.participant) {
            return Err(TransitionError::UnknownParticipant(hex::encode(
                &commitment.participant.to_bytes()[..8],
            )));
        }
        if !seen_participants.insert(commitment.participant.clone()) {
            return Err(TransitionError::DuplicateCommitment(hex::encode(
                &commitment.participant.to_bytes()[..8],
            )));
        }
        if !seen_fragments.insert(commitment.fragment_ref()) {
            return Err(TransitionError::DuplicateFragment(commitment.fragment_ref()));
        }
        let (reference, output) = commitment.fragment.clone();
        utxos.insert(reference, output);
        effects.push(Effect::ConsumeCommitment {
            lock: commitment.lock,
        });
    }

    // Effects in deterministic order regardless of the submitted ordering
    effects.sort_by_key(|e| match e {
        Effect::ConsumeCommitment { lock } => *lock,
        _ => unreachable!("collect_com only consumes"),
    });

    Ok(Transition {
        effects,
        next: HeadState::Open(OpenState {
            key_aggregate: params.key_aggregate()?,
            eta: Eta::open(utxos),
        }),
    })
}

/// Abort: burn every participant's token, reimburse what was locked
fn abort(
    params: &HeadParameters,
    commitments: &[Commitment],
) -> Result<Transition, TransitionError> {
    let mut seen = BTreeSet::new();
    for commitment in commitments {
        if !params.is_participant(&commitment.participant) {
            return Err(TransitionError::UnknownParticipant(hex::encode(
                &commitment.participant.to_bytes()[..8],
            )));
        }
        if !seen.insert(commitment.participant.clone()) {
            return Err(TransitionError::DuplicateCommitment(hex::encode(
                &commitment.participant.to_bytes()[..8],
            )));
        }
    }

    let mut effects: Vec<Effect> = params
        .token_names()
        .into_iter()
        .map(|name| Effect::BurnToken { name })
        .collect();
    for commitment in commitments {
        effects.push(Effect::ConsumeCommitment {
            lock: commitment.lock,
        });
        effects.push(Effect::Reimburse {
            commitment: commitment.clone(),
        });
    }

    Ok(Transition {
        effects,
        next: HeadState::Closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use isthmus_ledger::{KeyHash, PolicyId, TxOut, Value};
    use isthmus_multisig::SigningKey;
    use std::time::Duration;

    fn setup(n: usize) -> (Vec<SigningKey>, HeadParameters) {
        let keys: Vec<SigningKey> = (0..n)
            .map(|i| SigningKey::from_seed([0x10 + i as u8; 32]))
            .collect();
        let participants = keys.iter().map(|k| k.verification_key()).collect();
        let params =
            HeadParameters::new(participants, PolicyId([0xEEu8; 32]), Duration::from_secs(60));
        (keys, params)
    }

    fn commitment_for(params: &HeadParameters, index: usize, coin: u64) -> Commitment {
        let participant = params.participants[index].clone();
        Commitment {
            participant,
            lock: OutputRef::new([0xB0 + index as u8; 32], 0),
            fragment: (
                OutputRef::new([0xC0 + index as u8; 32], 0),
                TxOut::to_key(KeyHash([0xD0 + index as u8; 32]), Value::coin(coin)),
            ),
        }
    }

    #[test]
    fn test_init_starts_collecting() {
        let (_, params) = setup(3);
        let t = transition(&params, &HeadState::Initial, &Input::Init).unwrap();
        assert_eq!(t.next, HeadState::Collecting);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_collect_com_requires_full_quorum() {
        let (_, params) = setup(3);
        let commitments = vec![commitment_for(&params, 0, 5), commitment_for(&params, 1, 7)];
        let err = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::ParticipantCountMismatch { got: 2, need: 3 }
        ));
    }

    #[test]
    fn test_collect_com_opens_with_committed_fragments() {
        let (_, params) = setup(3);
        let commitments: Vec<_> = (0..3).map(|i| commitment_for(&params, i, 5 + i as u64)).collect();
        let t = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom {
                commitments: commitments.clone(),
            },
        )
        .unwrap();

        match &t.next {
            HeadState::Open(open) => {
                assert_eq!(open.eta.seq, 0);
                assert_eq!(open.eta.utxos.len(), 3);
                for c in &commitments {
                    assert_eq!(open.eta.utxos.get(&c.fragment.0), Some(&c.fragment.1));
                }
            }
            other => panic!("expected Open, got {:?}", other.tag()),
        }
        assert_eq!(t.effects.len(), 3);
    }

    #[test]
    fn test_collect_com_is_order_independent() {
        let (_, params) = setup(3);
        let commitments: Vec<_> = (0..3).map(|i| commitment_for(&params, i, 9)).collect();
        let mut permuted = commitments.clone();
        permuted.rotate_left(1);

        let a = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments },
        )
        .unwrap();
        let b = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom {
                commitments: permuted,
            },
        )
        .unwrap();
        assert_eq!(a.next, b.next);
        assert_eq!(a.effects, b.effects);
    }

    #[test]
    fn test_collect_com_rejects_duplicate_participant() {
        let (_, params) = setup(3);
        let mut commitments: Vec<_> = (0..3).map(|i| commitment_for(&params, i, 4)).collect();
        commitments[2].participant = commitments[0].participant.clone();

        let err = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::DuplicateCommitment(_)));
    }

    #[test]
    fn test_collect_com_rejects_outsider() {
        let (_, params) = setup(3);
        let mut commitments: Vec<_> = (0..3).map(|i| commitment_for(&params, i, 4)).collect();
        commitments[1].participant = SigningKey::from_seed([0xFFu8; 32]).verification_key();

        let err = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::UnknownParticipant(_)));
    }

    #[test]
    fn test_abort_burns_all_tokens_and_reimburses_locked() {
        let (_, params) = setup(3);
        // Only two of three committed so far
        let commitments: Vec<_> = (0..2).map(|i| commitment_for(&params, i, 4)).collect();
        let t = transition(
            &params,
            &HeadState::Collecting,
            &Input::Abort {
                commitments: commitments.clone(),
            },
        )
        .unwrap();

        assert_eq!(t.next, HeadState::Closed);
        let burns = t
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::BurnToken { .. }))
            .count();
        let reimbursements = t
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Reimburse { .. }))
            .count();
        assert_eq!(burns, 3);
        assert_eq!(reimbursements, 2);
    }

    #[test]
    fn test_off_table_pairs_rejected() {
        let (_, params) = setup(2);
        let cases: Vec<(HeadState, Input)> = vec![
            (HeadState::Collecting, Input::Init),
            (HeadState::Closed, Input::Init),
            (
                HeadState::Initial,
                Input::CollectCom { commitments: vec![] },
            ),
            (
                HeadState::Closed,
                Input::Abort { commitments: vec![] },
            ),
        ];
        for (state, input) in cases {
            assert!(matches!(
                transition(&params, &state, &input),
                Err(TransitionError::InvalidTransition { .. })
            ));
        }
    }
}
