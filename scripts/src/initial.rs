//! The initial validator
//!
//! One instance per participant, guarding the pre-commit output that holds
//! that participant's token. The commit path is fully checked here; the
//! abort path only requires the head state input be consumed alongside —
//! the head validator, declared as a co-requirement, carries the actual
//! Abort legality check.

use crate::bundle::{CoRequirement, RedeemerTag, ScriptKind};
use crate::data::{CommitDatum, InitialRedeemer};
use crate::errors::ScriptError;
use crate::ScriptResult;
use isthmus_head::HeadParameters;
use isthmus_ledger::{OutputRef, ResolvedInput, TxInfo, TxOut};
use isthmus_multisig::VerificationKey;

/// Validator for one participant's initial address
#[derive(Clone, Debug)]
pub struct InitialValidator {
    params: HeadParameters,
    participant: VerificationKey,
}

impl InitialValidator {
    pub fn new(params: HeadParameters, participant: VerificationKey) -> Self {
        Self {
            params,
            participant,
        }
    }

    /// Validate spending the guarded initial output
    pub fn validate(
        &self,
        input: OutputRef,
        redeemer: &InitialRedeemer,
        info: &TxInfo,
    ) -> ScriptResult<()> {
        match redeemer {
            InitialRedeemer::Commit { fragment } => self.commit(input, fragment, info),
            InitialRedeemer::Abort => {
                // Delegated: the head validator must run Abort in the same
                // transaction; here only presence of the state input matters
                let head_inputs = info.inputs_from(&self.params.head_address()).count();
                if head_inputs != 1 {
                    return Err(ScriptError::HeadInputCount(head_inputs));
                }
                Ok(())
            }
        }
    }

    /// Sibling executions this validator relies on
    pub fn co_requirements(&self, redeemer: &InitialRedeemer) -> Vec<CoRequirement> {
        match redeemer {
            InitialRedeemer::Commit { .. } => Vec::new(),
            InitialRedeemer::Abort => {
                vec![CoRequirement::new(ScriptKind::Head, RedeemerTag::HeadAbort)]
            }
        }
    }

    /// Commit path: forward the token and lock the fragment
    fn commit(
        &self,
        input: OutputRef,
        fragment: &(OutputRef, TxOut),
        info: &TxInfo,
    ) -> ScriptResult<()> {
        if !info.is_signed_by(&HeadParameters::key_hash(&self.participant)) {
            return Err(ScriptError::MissingParticipantSignature);
        }

        // Exactly the one guarded output is spent from this address
        let address = self.params.initial_address(&self.participant);
        let own_inputs: Vec<&ResolvedInput> = info.inputs_from(&address).collect();
        if own_inputs.len() != 1 || own_inputs[0].reference != input {
            return Err(ScriptError::InitialInputNotAlone(input));
        }
        let own_value = own_inputs[0].output.value.clone();

        // The claimed fragment must really be spent, unchanged
        let (fragment_ref, fragment_out) = fragment;
        match info.inputs.iter().find(|i| i.reference == *fragment_ref) {
            None => return Err(ScriptError::FragmentNotSpent(*fragment_ref)),
            Some(resolved) if resolved.output != *fragment_out => {
                return Err(ScriptError::FragmentMismatch(*fragment_ref))
            }
            Some(_) => {}
        }

        // One commit output carrying the fragment datum and the committed
        // value plus the forwarded token
        let commit_outputs: Vec<&TxOut> =
            info.outputs_to(&self.params.commit_address()).collect();
        if commit_outputs.len() != 1 {
            return Err(ScriptError::CommitOutputCount(commit_outputs.len()));
        }
        let commit_output = commit_outputs[0];

        let datum: CommitDatum = commit_output
            .datum
            .as_ref()
            .ok_or(ScriptError::CommitOutputMismatch)?
            .decode()
            .map_err(|_| ScriptError::CommitOutputMismatch)?;
        if datum.participant != self.participant
            || datum.fragment != (*fragment_ref, fragment_out.clone())
        {
            return Err(ScriptError::CommitOutputMismatch);
        }

        let expected_value = fragment_out.value.add(&own_value);
        if commit_output.value != expected_value {
            return Err(ScriptError::CommitOutputMismatch);
        }
        Ok(())
    }
}
