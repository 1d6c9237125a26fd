//! The head validator
//!
//! Guards the head's locked state datum. Every branch enforces, on-chain
//! and independently of the off-chain transition function, that the
//! submitted transaction actually executed the claimed transition:
//! CollectCom forwards every participation token and pays the opened state,
//! Close re-runs the snapshot engine, Abort burns the full token set.

use crate::data::{carries_policy_token, token_asset, CommitDatum, HeadDatum, HeadRedeemer};
use crate::errors::ScriptError;
use crate::ScriptResult;
use isthmus_head::{snapshot, HeadParameters};
use isthmus_ledger::{OutputRef, ResolvedInput, TxInfo, TxOut, UtxoSet, Value};

/// Validator for the head state address
#[derive(Clone, Debug)]
pub struct HeadValidator {
    params: HeadParameters,
}

impl HeadValidator {
    pub fn new(params: HeadParameters) -> Self {
        Self { params }
    }

    /// Validate spending the head state input under the given redeemer
    pub fn validate(
        &self,
        input: OutputRef,
        redeemer: &HeadRedeemer,
        info: &TxInfo,
    ) -> ScriptResult<()> {
        let state_input = self.state_input(input, info)?;
        let datum = state_input
            .output
            .datum
            .as_ref()
            .ok_or(ScriptError::MissingDatum(input))?
            .decode::<HeadDatum>()?;

        match (&datum, redeemer) {
            (HeadDatum::Initial, HeadRedeemer::CollectCom) => self.collect_com(info),
            (HeadDatum::Initial, HeadRedeemer::Abort) => self.abort(info),
            (HeadDatum::Open(open), HeadRedeemer::Close(xi)) => {
                let settled = snapshot::close(&open.key_aggregate, &open.eta, xi)?;
                let head_output = self.sole_head_output(info)?;
                match self.decode_head_datum(head_output)? {
                    HeadDatum::Final { utxos } if utxos == settled.utxos => {}
                    _ => return Err(ScriptError::HeadDatumMismatch),
                }
                if head_output.value != state_input.output.value {
                    return Err(ScriptError::ClosedValueMismatch);
                }
                Ok(())
            }
            (datum, redeemer) => Err(ScriptError::IllegalMove {
                datum: datum.tag(),
                redeemer: redeemer.tag(),
            }),
        }
    }

    /// CollectCom branch: every token forwarded, the opened state paid out
    fn collect_com(&self, info: &TxInfo) -> ScriptResult<()> {
        self.require_participant_signature(info)?;

        // The policy must stay untouched while collecting
        if info.mint.under_policy(&self.params.policy_id).next().is_some() {
            return Err(ScriptError::UnexpectedMint);
        }

        // Every participant's token must be both spent and re-produced:
        // forwarded through the transaction, never consumed
        for participant in &self.params.participants {
            let asset = token_asset(&self.params, participant);
            let spent: u64 = info
                .inputs
                .iter()
                .map(|i| i.output.value.asset_quantity(&asset))
                .sum();
            let produced: u64 = info
                .outputs
                .iter()
                .map(|o| o.value.asset_quantity(&asset))
                .sum();
            if spent == 0 || produced != spent {
                return Err(ScriptError::TokenNotForwarded(asset.name));
            }
        }

        // The committed set is whatever the token-carrying inputs decode to
        let mut collected = UtxoSet::new();
        let mut collected_value = Value::zero();
        for resolved in &info.inputs {
            if !carries_policy_token(&resolved.output.value, &self.params.policy_id) {
                continue;
            }
            let commit: CommitDatum = resolved
                .output
                .datum
                .as_ref()
                .ok_or(ScriptError::MissingDatum(resolved.reference))?
                .decode()?;
            let (reference, output) = commit.fragment;
            collected.insert(reference, output);
            collected_value = collected_value.add(&resolved.output.value);
        }

        let head_output = self.sole_head_output(info)?;
        let open = match self.decode_head_datum(head_output)? {
            HeadDatum::Open(open) => open,
            _ => return Err(ScriptError::HeadDatumMismatch),
        };

        if open.key_aggregate != self.params.key_aggregate()? {
            return Err(ScriptError::HeadDatumMismatch);
        }
        if open.eta.seq != 0
            || !open.eta.transactions.is_empty()
            || open.eta.utxos != collected
        {
            return Err(ScriptError::CommittedSetMismatch);
        }
        if head_output.value != collected_value {
            return Err(ScriptError::CollectedValueMismatch);
        }
        Ok(())
    }

    /// Abort branch: burn the full token set, settle empty with zero value
    fn abort(&self, info: &TxInfo) -> ScriptResult<()> {
        self.require_participant_signature(info)?;

        for participant in &self.params.participants {
            let asset = token_asset(&self.params, participant);
            let got = info.mint.quantity(&asset);
            if got != -1 {
                return Err(ScriptError::TokenNotBurned {
                    name: asset.name,
                    got,
                });
            }
        }

        let head_output = self.sole_head_output(info)?;
        match self.decode_head_datum(head_output)? {
            HeadDatum::Final { utxos } if utxos.is_empty() => {}
            _ => return Err(ScriptError::HeadDatumMismatch),
        }
        if !head_output.value.is_zero() {
            return Err(ScriptError::NonZeroFinalValue);
        }
        Ok(())
    }

    fn require_participant_signature(&self, info: &TxInfo) -> ScriptResult<()> {
        let signed = self
            .params
            .participants
            .iter()
            .any(|p| info.is_signed_by(&HeadParameters::key_hash(p)));
        if signed {
            Ok(())
        } else {
            Err(ScriptError::NoParticipantSignature)
        }
    }

    /// The spent head state input; there must be exactly one
    fn state_input<'a>(
        &self,
        input: OutputRef,
        info: &'a TxInfo,
    ) -> ScriptResult<&'a ResolvedInput> {
        let address = self.params.head_address();
        let head_inputs: Vec<&ResolvedInput> = info.inputs_from(&address).collect();
        if head_inputs.len() != 1 {
            return Err(ScriptError::HeadInputCount(head_inputs.len()));
        }
        if head_inputs[0].reference != input {
            return Err(ScriptError::HeadInputCount(0));
        }
        Ok(head_inputs[0])
    }

    /// The sole payment to the head address
    fn sole_head_output<'a>(&self, info: &'a TxInfo) -> ScriptResult<&'a TxOut> {
        let address = self.params.head_address();
        let outputs: Vec<&TxOut> = info.outputs_to(&address).collect();
        if outputs.len() != 1 {
            return Err(ScriptError::HeadOutputCount(outputs.len()));
        }
        Ok(outputs[0])
    }

    fn decode_head_datum(&self, output: &TxOut) -> ScriptResult<HeadDatum> {
        let datum = output
            .datum
            .as_ref()
            .ok_or(ScriptError::HeadDatumMismatch)?;
        Ok(datum.decode::<HeadDatum>()?)
    }
}
