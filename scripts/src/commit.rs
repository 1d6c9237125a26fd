//! The commit validator
//!
//! Guards a locked commitment until the head either collects it or aborts.
//! Both paths delegate head-wide legality to the head validator running in
//! the same transaction; the abort path additionally re-derives the one
//! fact that is this script's own business — the committed output is paid
//! back unchanged to its original owner.

use crate::bundle::{CoRequirement, RedeemerTag, ScriptKind};
use crate::data::{CommitDatum, CommitRedeemer};
use crate::errors::ScriptError;
use crate::ScriptResult;
use isthmus_head::HeadParameters;
use isthmus_ledger::{OutputRef, TxInfo};

/// Validator for the commit address
#[derive(Clone, Debug)]
pub struct CommitValidator {
    params: HeadParameters,
}

impl CommitValidator {
    pub fn new(params: HeadParameters) -> Self {
        Self { params }
    }

    /// Validate spending a locked commitment
    pub fn validate(
        &self,
        input: OutputRef,
        redeemer: &CommitRedeemer,
        info: &TxInfo,
    ) -> ScriptResult<()> {
        let own = info
            .inputs_from(&self.params.commit_address())
            .find(|i| i.reference == input)
            .ok_or(ScriptError::MissingDatum(input))?;
        let datum: CommitDatum = own
            .output
            .datum
            .as_ref()
            .ok_or(ScriptError::MissingDatum(input))?
            .decode()?;

        // Either path requires the head state input in this transaction
        let head_inputs = info.inputs_from(&self.params.head_address()).count();
        if head_inputs != 1 {
            return Err(ScriptError::HeadInputCount(head_inputs));
        }

        match redeemer {
            CommitRedeemer::Collect => Ok(()),
            CommitRedeemer::Abort => {
                // Reimbursement guarantee: the fragment reappears unchanged
                let (fragment_ref, fragment_out) = &datum.fragment;
                let reimbursed = info.outputs.iter().any(|o| o == fragment_out);
                if !reimbursed {
                    return Err(ScriptError::ReimbursementMissing(*fragment_ref));
                }
                Ok(())
            }
        }
    }

    /// Sibling executions this validator relies on
    pub fn co_requirements(&self, redeemer: &CommitRedeemer) -> Vec<CoRequirement> {
        match redeemer {
            CommitRedeemer::Collect => vec![CoRequirement::new(
                ScriptKind::Head,
                RedeemerTag::HeadCollectCom,
            )],
            CommitRedeemer::Abort => {
                vec![CoRequirement::new(ScriptKind::Head, RedeemerTag::HeadAbort)]
            }
        }
    }
}
