//! Property-Based Tests for the Head Protocol Core
//!
//! Uses proptest to generate random inputs and verify the transition
//! table's guarantees hold: off-table rejection, order independence,
//! signature binding, and failure idempotence.

use proptest::prelude::*;
use std::time::Duration;

use isthmus::head::{
    snapshot, transition, Commitment, Eta, HeadParameters, HeadState, Input, OpenState,
    SnapshotError, TransitionError, Xi,
};
use isthmus::ledger::{KeyHash, OutputRef, PolicyId, TxOut, UtxoSet, Value};
use isthmus::multisig::{AggregateKey, SigningKey};

// =============================================================================
// PROPTEST STRATEGIES
// =============================================================================

/// Strategy for random 32-byte arrays
fn bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strategy for output references
fn output_ref() -> impl Strategy<Value = OutputRef> {
    (bytes32(), 0u32..4).prop_map(|(tx_id, index)| OutputRef::new(tx_id, index))
}

/// Strategy for small UTXO sets
fn utxo_set(max: usize) -> impl Strategy<Value = UtxoSet> {
    prop::collection::btree_map(
        output_ref(),
        (bytes32(), 1u64..1_000).prop_map(|(owner, coin)| TxOut::to_key(KeyHash(owner), Value::coin(coin))),
        1..=max,
    )
    .prop_map(UtxoSet)
}

fn fixed_keys(n: usize) -> Vec<SigningKey> {
    (0..n)
        .map(|i| SigningKey::from_seed([0xE0 + i as u8; 32]))
        .collect()
}

fn fixed_params(n: usize) -> HeadParameters {
    HeadParameters::new(
        fixed_keys(n).iter().map(|k| k.verification_key()).collect(),
        PolicyId([7u8; 32]),
        Duration::from_secs(600),
    )
}

fn commitment(params: &HeadParameters, index: usize, fragment: (OutputRef, TxOut)) -> Commitment {
    Commitment {
        participant: params.participants[index].clone(),
        lock: OutputRef::new([0x90 + index as u8; 32], 0),
        fragment,
    }
}

/// States to pair against inputs when probing the transition table
fn any_state() -> impl Strategy<Value = HeadState> {
    let keys = fixed_keys(2);
    let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
    let open = HeadState::Open(OpenState {
        key_aggregate: AggregateKey::aggregate(&vks).unwrap(),
        eta: Eta::genesis(),
    });
    prop_oneof![
        Just(HeadState::Initial),
        Just(HeadState::Collecting),
        Just(open),
        Just(HeadState::Closed),
    ]
}

// =============================================================================
// TRANSITION TABLE PROPERTIES
// =============================================================================

proptest! {
    /// Property: every (state, input) pair outside the table is rejected,
    /// and rejection is stable across repeated calls
    #[test]
    fn off_table_pairs_always_rejected(state in any_state(), tag in 0usize..4) {
        let params = fixed_params(2);
        let input = match tag {
            0 => Input::Init,
            1 => Input::CollectCom { commitments: vec![] },
            2 => Input::Close {
                xi: Xi {
                    utxos: UtxoSet::new(),
                    seq: 0,
                    snapshot_signature: None,
                    transactions: vec![],
                },
            },
            _ => Input::Abort { commitments: vec![] },
        };

        let on_table = matches!(
            (&state, &input),
            (HeadState::Initial, Input::Init)
                | (HeadState::Collecting, Input::CollectCom { .. })
                | (HeadState::Open(_), Input::Close { .. })
                | (HeadState::Initial, Input::Abort { .. })
                | (HeadState::Collecting, Input::Abort { .. })
        );

        let first = transition(&params, &state, &input);
        let second = transition(&params, &state, &input);
        if !on_table {
            prop_assert!(matches!(first, Err(TransitionError::InvalidTransition { .. })), "expected InvalidTransition");
            prop_assert!(matches!(second, Err(TransitionError::InvalidTransition { .. })), "expected InvalidTransition");
        }
    }

    /// Property: permuting the commitment list yields the same Open state
    #[test]
    fn collect_com_is_permutation_invariant(
        fragments in prop::collection::vec((output_ref(), 1u64..100), 3),
        rotation in 0usize..3,
    ) {
        let params = fixed_params(3);
        let commitments: Vec<Commitment> = fragments
            .iter()
            .enumerate()
            .map(|(i, (reference, coin))| {
                commitment(
                    &params,
                    i,
                    (*reference, TxOut::to_key(KeyHash([i as u8; 32]), Value::coin(*coin))),
                )
            })
            .collect();
        // Distinct fragment references are a precondition of a valid set
        prop_assume!(
            commitments.iter().map(|c| c.fragment.0).collect::<std::collections::BTreeSet<_>>().len() == 3
        );

        let mut permuted = commitments.clone();
        permuted.rotate_left(rotation);

        let a = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments },
        );
        let b = transition(
            &params,
            &HeadState::Collecting,
            &Input::CollectCom { commitments: permuted },
        );
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.next, b.next);
                prop_assert_eq!(a.effects, b.effects);
            }
            (a, b) => prop_assert!(a.is_err() && b.is_err()),
        }
    }
}

// =============================================================================
// SNAPSHOT SIGNATURE PROPERTIES (fewer cases: each exercises BLS signing)
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Property: a snapshot signature over (utxos, seq) verifies for
    /// exactly that pair; any mutation of either field fails
    #[test]
    fn snapshot_signature_binds_the_pair(
        utxos in utxo_set(3),
        seq in 1u64..50,
        extra in (bytes32(), 1u64..100),
    ) {
        let keys = fixed_keys(2);
        let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
        let aggregate = AggregateKey::aggregate(&vks).unwrap();
        let eta = Eta { utxos: utxos.clone(), seq: 0, transactions: vec![] };

        let signature = snapshot::sign_snapshot(&keys, &utxos, seq).unwrap();
        let good = Xi {
            utxos: utxos.clone(),
            seq,
            snapshot_signature: Some(signature.clone()),
            transactions: vec![],
        };
        prop_assert!(snapshot::close(&aggregate, &eta, &good).is_ok());

        // Mutated sequence number
        let wrong_seq = Xi { seq: seq + 1, ..good.clone() };
        prop_assert!(matches!(
            snapshot::close(&aggregate, &eta, &wrong_seq),
            Err(SnapshotError::SnapshotSignature)
        ));

        // Mutated UTXO set
        let (id, coin) = extra;
        let mut tampered = utxos.clone();
        tampered.insert(
            OutputRef::new(id, u32::MAX),
            TxOut::to_key(KeyHash(id), Value::coin(coin)),
        );
        let wrong_utxos = Xi { utxos: tampered, ..good };
        prop_assert!(matches!(
            snapshot::close(&aggregate, &eta, &wrong_utxos),
            Err(SnapshotError::SnapshotSignature)
        ));
    }

    /// Property: close at sequence 0 never consults a snapshot signature
    #[test]
    fn close_at_genesis_needs_no_signature(utxos in utxo_set(3)) {
        let keys = fixed_keys(2);
        let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
        let aggregate = AggregateKey::aggregate(&vks).unwrap();
        let eta = Eta { utxos: utxos.clone(), seq: 0, transactions: vec![] };

        let xi = Xi {
            utxos: UtxoSet::new(),
            seq: 0,
            snapshot_signature: None,
            transactions: vec![],
        };
        let settled = snapshot::close(&aggregate, &eta, &xi).unwrap();
        // The confirmed set wins; the proposal's set is ignored
        prop_assert_eq!(settled.utxos, utxos);
    }

    /// Property: failure is idempotent — the same invalid proposal yields
    /// the same rejection every time, and the confirmed snapshot never moves
    #[test]
    fn close_failure_is_idempotent(utxos in utxo_set(3), seq in 1u64..50) {
        let keys = fixed_keys(2);
        let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
        let aggregate = AggregateKey::aggregate(&vks).unwrap();
        let eta = Eta { utxos: utxos.clone(), seq: 0, transactions: vec![] };

        let invalid = Xi {
            utxos: utxos.clone(),
            seq,
            snapshot_signature: None,
            transactions: vec![],
        };
        let first = snapshot::close(&aggregate, &eta, &invalid);
        let second = snapshot::close(&aggregate, &eta, &invalid);
        prop_assert!(matches!(first, Err(SnapshotError::MissingSnapshotSignature { .. })), "expected MissingSnapshotSignature");
        prop_assert!(matches!(second, Err(SnapshotError::MissingSnapshotSignature { .. })), "expected MissingSnapshotSignature");
        prop_assert_eq!(&eta.utxos, &utxos);
    }
}

// =============================================================================
// EDGE CASE TESTS (not proptest)
// =============================================================================

#[test]
fn collect_com_rejects_reused_fragment() {
    let params = fixed_params(2);
    let shared = (
        OutputRef::new([0x55u8; 32], 0),
        TxOut::to_key(KeyHash([0x55u8; 32]), Value::coin(5)),
    );
    let commitments = vec![
        commitment(&params, 0, shared.clone()),
        commitment(&params, 1, shared),
    ];
    let err = transition(
        &params,
        &HeadState::Collecting,
        &Input::CollectCom { commitments },
    )
    .unwrap_err();
    assert!(matches!(err, TransitionError::DuplicateFragment(_)));
}

#[test]
fn sequence_regression_is_reported_as_such() {
    let keys = fixed_keys(2);
    let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
    let aggregate = AggregateKey::aggregate(&vks).unwrap();
    let mut utxos = UtxoSet::new();
    utxos.insert(
        OutputRef::new([0x66u8; 32], 0),
        TxOut::to_key(KeyHash([0x66u8; 32]), Value::coin(9)),
    );
    let eta = Eta {
        utxos: utxos.clone(),
        seq: 8,
        transactions: vec![],
    };

    let xi = Xi {
        utxos: utxos.clone(),
        seq: 3,
        snapshot_signature: Some(snapshot::sign_snapshot(&keys, &utxos, 3).unwrap()),
        transactions: vec![],
    };
    assert!(matches!(
        snapshot::close(&aggregate, &eta, &xi),
        Err(SnapshotError::SequenceRegression {
            proposed: 3,
            confirmed: 8
        })
    ));
}

#[test]
fn abort_from_initial_with_no_commitments() {
    let params = fixed_params(3);
    let authorized = transition(
        &params,
        &HeadState::Initial,
        &Input::Abort { commitments: vec![] },
    )
    .unwrap();
    assert_eq!(authorized.next, HeadState::Closed);
    // Still burns the full token set
    assert_eq!(authorized.effects.len(), 3);
}
