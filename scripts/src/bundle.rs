//! Transaction bundle validation with co-required checks
//!
//! A base-ledger transaction may run several scripts at once (the head
//! state input, every commitment input, the minting policy). Each validator
//! re-derives only its own locked value's fate and *declares* which sibling
//! execution it relies on; this harness runs every execution and then
//! verifies each declared co-requirement is present in the same bundle.
//! Delegation without duplication: the commit validator never re-checks
//! Abort's burn rules, it requires the head validator — which does — to run
//! alongside it.

use crate::commit::CommitValidator;
use crate::data::{CommitRedeemer, HeadRedeemer, InitialRedeemer, PolicyRedeemer};
use crate::errors::ScriptError;
use crate::head::HeadValidator;
use crate::initial::InitialValidator;
use crate::policy::ParticipationPolicy;
use crate::ScriptResult;
use isthmus_head::HeadParameters;
use isthmus_ledger::{OutputRef, TxInfo};
use isthmus_multisig::VerificationKey;
use serde::{Deserialize, Serialize};

/// Which script a bundle entry runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptKind {
    Head,
    Initial,
    Commit,
    Policy,
}

/// Script + redeemer identity of an execution, used for co-requirement
/// matching
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedeemerTag {
    HeadCollectCom,
    HeadClose,
    HeadAbort,
    InitialCommit,
    InitialAbort,
    CommitCollect,
    CommitAbort,
    PolicyMint,
    PolicyBurn,
}

/// A sibling execution a validator requires in the same transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoRequirement {
    pub script: ScriptKind,
    pub redeemer: RedeemerTag,
}

impl CoRequirement {
    pub const fn new(script: ScriptKind, redeemer: RedeemerTag) -> Self {
        Self { script, redeemer }
    }
}

/// One script execution within a transaction
#[derive(Clone, Debug)]
pub enum ScriptExecution {
    /// The head validator spending the head state input
    Head {
        input: OutputRef,
        redeemer: HeadRedeemer,
    },
    /// An initial validator spending a participant's pre-commit output
    Initial {
        participant: VerificationKey,
        input: OutputRef,
        redeemer: InitialRedeemer,
    },
    /// The commit validator spending a locked commitment
    Commit {
        input: OutputRef,
        redeemer: CommitRedeemer,
    },
    /// The minting policy running over the transaction's mint field
    Policy { redeemer: PolicyRedeemer },
}

impl HeadRedeemer {
    pub(crate) fn tag(&self) -> RedeemerTag {
        match self {
            HeadRedeemer::CollectCom => RedeemerTag::HeadCollectCom,
            HeadRedeemer::Close(_) => RedeemerTag::HeadClose,
            HeadRedeemer::Abort => RedeemerTag::HeadAbort,
        }
    }
}

impl InitialRedeemer {
    pub(crate) fn tag(&self) -> RedeemerTag {
        match self {
            InitialRedeemer::Commit { .. } => RedeemerTag::InitialCommit,
            InitialRedeemer::Abort => RedeemerTag::InitialAbort,
        }
    }
}

impl CommitRedeemer {
    pub(crate) fn tag(&self) -> RedeemerTag {
        match self {
            CommitRedeemer::Collect => RedeemerTag::CommitCollect,
            CommitRedeemer::Abort => RedeemerTag::CommitAbort,
        }
    }
}

impl PolicyRedeemer {
    pub(crate) fn tag(&self) -> RedeemerTag {
        match self {
            PolicyRedeemer::Mint => RedeemerTag::PolicyMint,
            PolicyRedeemer::Burn => RedeemerTag::PolicyBurn,
        }
    }
}

impl ScriptExecution {
    /// The (script, redeemer) identity of this execution
    pub fn tag(&self) -> (ScriptKind, RedeemerTag) {
        match self {
            ScriptExecution::Head { redeemer, .. } => (ScriptKind::Head, redeemer.tag()),
            ScriptExecution::Initial { redeemer, .. } => (ScriptKind::Initial, redeemer.tag()),
            ScriptExecution::Commit { redeemer, .. } => (ScriptKind::Commit, redeemer.tag()),
            ScriptExecution::Policy { redeemer } => (ScriptKind::Policy, redeemer.tag()),
        }
    }
}

/// Validate every execution of a transaction, then every declared
/// co-requirement
///
/// The base ledger runs all scripts of a transaction and accepts only if
/// all succeed; this mirrors that atomicity. Order within the bundle is
/// irrelevant.
pub fn validate_bundle(
    params: &HeadParameters,
    seed: &OutputRef,
    info: &TxInfo,
    executions: &[ScriptExecution],
) -> ScriptResult<()> {
    let head = HeadValidator::new(params.clone());
    let commit = CommitValidator::new(params.clone());
    let policy = ParticipationPolicy::new(params.clone(), *seed);

    let tags: Vec<(ScriptKind, RedeemerTag)> = executions.iter().map(|e| e.tag()).collect();

    for execution in executions {
        let co_required: Vec<CoRequirement> = match execution {
            ScriptExecution::Head { input, redeemer } => {
                head.validate(*input, redeemer, info)?;
                Vec::new()
            }
            ScriptExecution::Initial {
                participant,
                input,
                redeemer,
            } => {
                let validator = InitialValidator::new(params.clone(), participant.clone());
                validator.validate(*input, redeemer, info)?;
                validator.co_requirements(redeemer)
            }
            ScriptExecution::Commit { input, redeemer } => {
                commit.validate(*input, redeemer, info)?;
                commit.co_requirements(redeemer)
            }
            ScriptExecution::Policy { redeemer } => {
                policy.validate(redeemer, info)?;
                policy.co_requirements(redeemer)
            }
        };

        for requirement in co_required {
            let satisfied = tags
                .iter()
                .any(|(script, tag)| *script == requirement.script && *tag == requirement.redeemer);
            if !satisfied {
                return Err(ScriptError::MissingCoRequirement(requirement));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_abort, build_close, build_collect, build_commit, build_init};
    use crate::data::HeadDatum;
    use crate::policy::ParticipationPolicy;
    use isthmus_head::Xi;
    use isthmus_ledger::{Datum, KeyHash, Transaction, TxOut, UtxoSet, Value};
    use isthmus_multisig::SigningKey;
    use std::time::Duration;

    struct Fixture {
        keys: Vec<SigningKey>,
        params: HeadParameters,
        seed: OutputRef,
        utxos: UtxoSet,
    }

    /// A head with `n` participants, a seed output, and one spendable
    /// fragment per participant
    fn fixture(n: usize) -> Fixture {
        let keys: Vec<SigningKey> = (0..n)
            .map(|i| SigningKey::from_seed([0x80 + i as u8; 32]))
            .collect();
        let seed = OutputRef::new([0x01u8; 32], 0);
        let params = HeadParameters::new(
            keys.iter().map(|k| k.verification_key()).collect(),
            ParticipationPolicy::derive_id(&seed),
            Duration::from_secs(60),
        );

        let mut utxos = UtxoSet::new();
        utxos.insert(
            seed,
            TxOut::to_key(
                HeadParameters::key_hash(&keys[0].verification_key()),
                Value::coin(100),
            ),
        );
        for (i, key) in keys.iter().enumerate() {
            utxos.insert(
                OutputRef::new([0x50 + i as u8; 32], 0),
                TxOut::to_key(
                    HeadParameters::key_hash(&key.verification_key()),
                    Value::coin(10 + i as u64),
                ),
            );
        }
        Fixture {
            keys,
            params,
            seed,
            utxos,
        }
    }

    fn fragment_ref(i: usize) -> OutputRef {
        OutputRef::new([0x50 + i as u8; 32], 0)
    }

    /// Validate a built transaction against the chain, then apply it
    fn submit(
        fx: &Fixture,
        built: &crate::builder::BuiltTransaction,
    ) -> Result<UtxoSet, ScriptError> {
        let info = TxInfo::resolve(&fx.utxos, &built.transaction, built.signatories.clone())
            .map_err(ScriptError::Datum)?;
        validate_bundle(&fx.params, &fx.seed, &info, &built.executions)?;

        let mut next = fx.utxos.clone();
        for input in &built.transaction.inputs {
            next.0.remove(input);
        }
        for (i, output) in built.transaction.outputs.iter().enumerate() {
            next.insert(built.transaction.output_ref(i as u32), output.clone());
        }
        Ok(next)
    }

    fn locate(utxos: &UtxoSet, address: &isthmus_ledger::Address) -> Vec<(OutputRef, TxOut)> {
        utxos
            .iter()
            .filter(|(_, o)| o.address == *address)
            .map(|(r, o)| (*r, o.clone()))
            .collect()
    }

    /// Drive init + all commits, returning the chain, head state output,
    /// and commit outputs
    fn open_ready(mut fx: Fixture) -> (Fixture, (OutputRef, TxOut), Vec<(OutputRef, TxOut)>) {
        let initiator = fx.keys[0].verification_key();
        let seed_out = fx.utxos.get(&fx.seed).cloned().unwrap();
        let init = build_init(&fx.params, (fx.seed, seed_out), &initiator).unwrap();
        fx.utxos = submit(&fx, &init).unwrap();

        for i in 0..fx.keys.len() {
            let participant = fx.keys[i].verification_key();
            let initial = locate(&fx.utxos, &fx.params.initial_address(&participant))
                .pop()
                .unwrap();
            let fragment_out = fx.utxos.get(&fragment_ref(i)).cloned().unwrap();
            let commit = build_commit(
                &fx.params,
                &participant,
                initial,
                (fragment_ref(i), fragment_out),
            )
            .unwrap();
            fx.utxos = submit(&fx, &commit).unwrap();
        }

        let head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();
        let commits = locate(&fx.utxos, &fx.params.commit_address());
        (fx, head, commits)
    }

    #[test]
    fn test_full_lifecycle_collect_then_close() {
        let (mut fx, head, commits) = open_ready(fixture(3));
        assert_eq!(commits.len(), 3);

        let signer = fx.keys[1].verification_key();
        let collect = build_collect(&fx.params, head, &commits, &signer).unwrap();
        fx.utxos = submit(&fx, &collect).unwrap();

        let open_head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();
        // All three fragments plus three forwarded tokens are locked
        assert_eq!(open_head.1.value.coin, 10 + 11 + 12);
        assert_eq!(open_head.1.value.assets.len(), 3);

        let xi = Xi {
            utxos: UtxoSet::new(),
            seq: 0,
            snapshot_signature: None,
            transactions: vec![],
        };
        let close = build_close(&fx.params, open_head.clone(), xi).unwrap();
        fx.utxos = submit(&fx, &close).unwrap();

        let final_head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();
        let datum: HeadDatum = final_head.1.datum.as_ref().unwrap().decode().unwrap();
        match datum {
            HeadDatum::Final { utxos } => assert_eq!(utxos.len(), 3),
            other => panic!("expected Final, got {}", other.tag()),
        }
    }

    #[test]
    fn test_collect_without_full_quorum_rejected() {
        let (fx, head, mut commits) = open_ready(fixture(3));
        commits.pop();

        let signer = fx.keys[0].verification_key();
        let collect = build_collect(&fx.params, head, &commits, &signer).unwrap();
        assert!(matches!(
            submit(&fx, &collect),
            Err(ScriptError::TokenNotForwarded(_))
        ));
    }

    #[test]
    fn test_dropped_head_execution_fails_co_requirement() {
        let (fx, head, commits) = open_ready(fixture(2));
        let signer = fx.keys[0].verification_key();
        let mut collect = build_collect(&fx.params, head, &commits, &signer).unwrap();

        // The head input is still spent, but the head validator no longer
        // runs: the commit validators' declared co-requirement must catch it
        collect
            .executions
            .retain(|e| !matches!(e, ScriptExecution::Head { .. }));
        assert!(matches!(
            submit(&fx, &collect),
            Err(ScriptError::MissingCoRequirement(CoRequirement {
                script: ScriptKind::Head,
                redeemer: RedeemerTag::HeadCollectCom,
            }))
        ));
    }

    #[test]
    fn test_abort_reimburses_and_burns_everything() {
        let mut fx = fixture(3);
        let initiator = fx.keys[0].verification_key();
        let seed_out = fx.utxos.get(&fx.seed).cloned().unwrap();
        let init = build_init(&fx.params, (fx.seed, seed_out), &initiator).unwrap();
        fx.utxos = submit(&fx, &init).unwrap();

        // Two of three participants commit
        for i in 0..2 {
            let participant = fx.keys[i].verification_key();
            let initial = locate(&fx.utxos, &fx.params.initial_address(&participant))
                .pop()
                .unwrap();
            let fragment_out = fx.utxos.get(&fragment_ref(i)).cloned().unwrap();
            let commit = build_commit(
                &fx.params,
                &participant,
                initial,
                (fragment_ref(i), fragment_out),
            )
            .unwrap();
            fx.utxos = submit(&fx, &commit).unwrap();
        }

        let head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();
        let commits = locate(&fx.utxos, &fx.params.commit_address());
        let third = fx.keys[2].verification_key();
        let initials: Vec<_> = locate(&fx.utxos, &fx.params.initial_address(&third))
            .into_iter()
            .map(|(r, o)| (third.clone(), r, o))
            .collect();

        let abort = build_abort(&fx.params, head, &initials, &commits, &initiator).unwrap();
        let after = submit(&fx, &abort).unwrap();

        // Both committed fragments are paid back unchanged
        for i in 0..2 {
            let owner = HeadParameters::key_hash(&fx.keys[i].verification_key());
            let reimbursed = after
                .iter()
                .any(|(_, o)| o.address == isthmus_ledger::Address::Key(owner)
                    && o.value == Value::coin(10 + i as u64));
            assert!(reimbursed, "fragment {} not reimbursed", i);
        }
        // No participation token survives anywhere
        let survivors: u64 = after
            .iter()
            .map(|(_, o)| {
                o.value
                    .assets
                    .iter()
                    .filter(|(a, _)| a.policy == fx.params.policy_id)
                    .map(|(_, q)| *q)
                    .sum::<u64>()
            })
            .sum();
        assert_eq!(survivors, 0);
    }

    #[test]
    fn test_abort_burning_fewer_tokens_rejected() {
        let mut fx = fixture(3);
        let initiator = fx.keys[0].verification_key();
        let seed_out = fx.utxos.get(&fx.seed).cloned().unwrap();
        let init = build_init(&fx.params, (fx.seed, seed_out), &initiator).unwrap();
        fx.utxos = submit(&fx, &init).unwrap();

        let head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();
        let initials: Vec<_> = fx
            .keys
            .iter()
            .flat_map(|k| {
                let vk = k.verification_key();
                locate(&fx.utxos, &fx.params.initial_address(&vk))
                    .into_iter()
                    .map(move |(r, o)| (vk.clone(), r, o))
            })
            .collect();

        let mut abort = build_abort(&fx.params, head, &initials, &[], &initiator).unwrap();
        // Drop one burn: the head validator's Abort branch must refuse
        let victim = crate::data::token_asset(&fx.params, &fx.keys[2].verification_key());
        abort.transaction.mint.0.remove(&victim);
        assert!(matches!(
            submit(&fx, &abort),
            Err(ScriptError::TokenNotBurned { .. })
        ));
    }

    #[test]
    fn test_mint_without_seed_rejected() {
        let fx = fixture(2);
        let initiator = fx.keys[0].verification_key();
        // Spend a fragment instead of the seed
        let bogus_seed = fragment_ref(0);
        let bogus_out = fx.utxos.get(&bogus_seed).cloned().unwrap();
        let mut init = build_init(&fx.params, (bogus_seed, bogus_out), &initiator).unwrap();
        init.transaction.inputs = vec![bogus_seed];
        assert!(matches!(
            submit(&fx, &init),
            Err(ScriptError::SeedNotSpent(_))
        ));
    }

    #[test]
    fn test_close_must_preserve_value() {
        let (mut fx, head, commits) = open_ready(fixture(2));
        let signer = fx.keys[0].verification_key();
        let collect = build_collect(&fx.params, head, &commits, &signer).unwrap();
        fx.utxos = submit(&fx, &collect).unwrap();
        let open_head = locate(&fx.utxos, &fx.params.head_address()).pop().unwrap();

        let xi = Xi {
            utxos: UtxoSet::new(),
            seq: 0,
            snapshot_signature: None,
            transactions: vec![],
        };
        let mut close = build_close(&fx.params, open_head, xi).unwrap();
        close.transaction.outputs[0].value = Value::coin(1);
        assert!(matches!(
            submit(&fx, &close),
            Err(ScriptError::ClosedValueMismatch)
        ));
    }

    #[test]
    fn test_tampered_open_datum_rejected() {
        let (fx, head, commits) = open_ready(fixture(2));
        let signer = fx.keys[0].verification_key();
        let mut collect = build_collect(&fx.params, head, &commits, &signer).unwrap();

        // Claim a different committed set than the inputs decode to
        let mut bogus = UtxoSet::new();
        bogus.insert(
            OutputRef::new([0xEEu8; 32], 0),
            TxOut::to_key(KeyHash([0xEEu8; 32]), Value::coin(1_000)),
        );
        collect.transaction.outputs[0].datum = Some(
            Datum::encode(&HeadDatum::Open(isthmus_head::OpenState {
                key_aggregate: fx.params.key_aggregate().unwrap(),
                eta: isthmus_head::Eta::open(bogus),
            }))
            .unwrap(),
        );
        assert!(matches!(
            submit(&fx, &collect),
            Err(ScriptError::CommittedSetMismatch)
        ));
    }

    #[test]
    fn test_unrelated_transaction_untouched_by_scripts() {
        let fx = fixture(2);
        // A plain key-to-key payment resolves and carries no executions
        let tx = Transaction {
            inputs: vec![fragment_ref(0)],
            outputs: vec![TxOut::to_key(KeyHash([0x99u8; 32]), Value::coin(10))],
            mint: isthmus_ledger::MintValue::none(),
        };
        let info = TxInfo::resolve(&fx.utxos, &tx, vec![]).unwrap();
        assert!(validate_bundle(&fx.params, &fx.seed, &info, &[]).is_ok());
    }
}

