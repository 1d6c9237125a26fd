//! Lifecycle transaction assembly
//!
//! Packages each head move into the base-ledger transaction that executes
//! it, together with the script executions the transaction must run. The
//! builders construct exactly what the validator triad accepts; they do not
//! submit or sign — signatories travel as key hashes for the caller's
//! wallet to witness.

use crate::bundle::ScriptExecution;
use crate::data::{
    CommitDatum, CommitRedeemer, HeadDatum, HeadRedeemer, InitialDatum, InitialRedeemer,
    PolicyRedeemer,
};
use crate::errors::ScriptError;
use crate::ScriptResult;
use isthmus_head::{snapshot, Eta, HeadParameters, OpenState, Xi};
use isthmus_ledger::{
    Datum, KeyHash, MintValue, OutputRef, Transaction, TxOut, UtxoSet, Value,
};
use isthmus_multisig::VerificationKey;

/// A transaction plus the script context needed to submit it
#[derive(Clone, Debug)]
pub struct BuiltTransaction {
    /// The assembled transaction
    pub transaction: Transaction,
    /// Script executions the transaction runs
    pub executions: Vec<ScriptExecution>,
    /// Key hashes that must witness the transaction
    pub signatories: Vec<KeyHash>,
}

/// Build the init transaction: spend the seed, mint the full token set,
/// lock the head state and one pre-commit output per participant
pub fn build_init(
    params: &HeadParameters,
    seed: (OutputRef, TxOut),
    initiator: &VerificationKey,
) -> ScriptResult<BuiltTransaction> {
    let (seed_ref, seed_out) = seed;

    let mut mint = MintValue::none();
    let mut outputs = vec![TxOut {
        address: params.head_address(),
        value: Value::zero(),
        datum: Some(Datum::encode(&HeadDatum::Initial)?),
    }];
    for participant in &params.participants {
        let asset = crate::data::token_asset(params, participant);
        mint = mint.with(asset, 1);
        outputs.push(TxOut {
            address: params.initial_address(participant),
            value: Value::zero().with_asset(asset, 1),
            datum: Some(Datum::encode(&InitialDatum {
                token_name: asset.name,
            })?),
        });
    }
    // Seed value returns to the initiator as change
    outputs.push(TxOut::to_key(
        HeadParameters::key_hash(initiator),
        seed_out.value,
    ));

    Ok(BuiltTransaction {
        transaction: Transaction {
            inputs: vec![seed_ref],
            outputs,
            mint,
        },
        executions: vec![ScriptExecution::Policy {
            redeemer: PolicyRedeemer::Mint,
        }],
        signatories: vec![HeadParameters::key_hash(initiator)],
    })
}

/// Build a commit transaction: spend the participant's pre-commit output
/// and the contributed fragment, lock both at the commit address
pub fn build_commit(
    params: &HeadParameters,
    participant: &VerificationKey,
    initial: (OutputRef, TxOut),
    fragment: (OutputRef, TxOut),
) -> ScriptResult<BuiltTransaction> {
    let (initial_ref, initial_out) = initial;
    let commit_value = fragment.1.value.add(&initial_out.value);
    let datum = CommitDatum {
        participant: participant.clone(),
        fragment: fragment.clone(),
    };

    Ok(BuiltTransaction {
        transaction: Transaction {
            inputs: vec![initial_ref, fragment.0],
            outputs: vec![TxOut {
                address: params.commit_address(),
                value: commit_value,
                datum: Some(Datum::encode(&datum)?),
            }],
            mint: MintValue::none(),
        },
        executions: vec![ScriptExecution::Initial {
            participant: participant.clone(),
            input: initial_ref,
            redeemer: InitialRedeemer::Commit { fragment },
        }],
        signatories: vec![HeadParameters::key_hash(participant)],
    })
}

/// Build the collect transaction: consume the head state input and every
/// locked commitment, pay the opened head state
pub fn build_collect(
    params: &HeadParameters,
    head: (OutputRef, TxOut),
    commits: &[(OutputRef, TxOut)],
    signer: &VerificationKey,
) -> ScriptResult<BuiltTransaction> {
    let mut utxos = UtxoSet::new();
    let mut collected_value = Value::zero();
    let mut inputs = vec![head.0];
    let mut executions = vec![ScriptExecution::Head {
        input: head.0,
        redeemer: HeadRedeemer::CollectCom,
    }];

    for (lock, output) in commits {
        let datum: CommitDatum = output
            .datum
            .as_ref()
            .ok_or(ScriptError::MissingDatum(*lock))?
            .decode()?;
        let (reference, fragment_out) = datum.fragment;
        utxos.insert(reference, fragment_out);
        collected_value = collected_value.add(&output.value);
        inputs.push(*lock);
        executions.push(ScriptExecution::Commit {
            input: *lock,
            redeemer: CommitRedeemer::Collect,
        });
    }

    let open = OpenState {
        key_aggregate: params.key_aggregate()?,
        eta: Eta::open(utxos),
    };

    Ok(BuiltTransaction {
        transaction: Transaction {
            inputs,
            outputs: vec![TxOut {
                address: params.head_address(),
                value: collected_value,
                datum: Some(Datum::encode(&HeadDatum::Open(open))?),
            }],
            mint: MintValue::none(),
        },
        executions,
        signatories: vec![HeadParameters::key_hash(signer)],
    })
}

/// Build the close transaction: verify the proposal and pay the settled
/// state
pub fn build_close(
    params: &HeadParameters,
    head: (OutputRef, TxOut),
    xi: Xi,
) -> ScriptResult<BuiltTransaction> {
    let open = match head
        .1
        .datum
        .as_ref()
        .ok_or(ScriptError::MissingDatum(head.0))?
        .decode::<HeadDatum>()?
    {
        HeadDatum::Open(open) => open,
        other => {
            return Err(ScriptError::IllegalMove {
                datum: other.tag(),
                redeemer: HeadRedeemer::Close(xi).tag(),
            })
        }
    };
    let settled = snapshot::close(&open.key_aggregate, &open.eta, &xi)?;

    Ok(BuiltTransaction {
        transaction: Transaction {
            inputs: vec![head.0],
            outputs: vec![TxOut {
                address: params.head_address(),
                value: head.1.value,
                datum: Some(Datum::encode(&HeadDatum::Final {
                    utxos: settled.utxos,
                })?),
            }],
            mint: MintValue::none(),
        },
        executions: vec![ScriptExecution::Head {
            input: head.0,
            redeemer: HeadRedeemer::Close(xi),
        }],
        signatories: Vec::new(),
    })
}

/// Build the abort transaction: burn the full token set, reimburse every
/// locked commitment, settle empty
pub fn build_abort(
    params: &HeadParameters,
    head: (OutputRef, TxOut),
    initials: &[(VerificationKey, OutputRef, TxOut)],
    commits: &[(OutputRef, TxOut)],
    signer: &VerificationKey,
) -> ScriptResult<BuiltTransaction> {
    let mut inputs = vec![head.0];
    let mut executions = vec![
        ScriptExecution::Head {
            input: head.0,
            redeemer: HeadRedeemer::Abort,
        },
        ScriptExecution::Policy {
            redeemer: PolicyRedeemer::Burn,
        },
    ];
    let mut outputs = vec![TxOut {
        address: params.head_address(),
        value: Value::zero(),
        datum: Some(Datum::encode(&HeadDatum::Final {
            utxos: UtxoSet::new(),
        })?),
    }];

    let mut mint = MintValue::none();
    for participant in &params.participants {
        mint = mint.with(crate::data::token_asset(params, participant), -1);
    }

    for (participant, reference, _output) in initials {
        inputs.push(*reference);
        executions.push(ScriptExecution::Initial {
            participant: participant.clone(),
            input: *reference,
            redeemer: InitialRedeemer::Abort,
        });
    }

    for (lock, output) in commits {
        let datum: CommitDatum = output
            .datum
            .as_ref()
            .ok_or(ScriptError::MissingDatum(*lock))?
            .decode()?;
        inputs.push(*lock);
        outputs.push(datum.fragment.1);
        executions.push(ScriptExecution::Commit {
            input: *lock,
            redeemer: CommitRedeemer::Abort,
        });
    }

    Ok(BuiltTransaction {
        transaction: Transaction {
            inputs,
            outputs,
            mint,
        },
        executions,
        signatories: vec![HeadParameters::key_hash(signer)],
    })
}
