//! Effect resolution: from required effects to a draft transaction
//!
//! A legal transition names *what* must happen on the base ledger; this
//! module assembles those effects into a draft transaction skeleton the
//! submitting side completes with fees and witnesses. Resolution can fail —
//! a reimbursement without a key owner, an effect list that does nothing —
//! and such failures surface to the caller instead of being retried.

use crate::errors::ConstraintError;
use crate::params::HeadParameters;
use crate::transition::Effect;
use isthmus_ledger::{Address, AssetId, MintValue, OutputRef, TxOut};

/// The base-ledger transaction skeleton a transition's effects resolve to
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftTransaction {
    /// Output references the transaction must consume
    pub consumes: Vec<OutputRef>,
    /// Outputs the transaction must produce
    pub outputs: Vec<TxOut>,
    /// Assets the transaction must mint or burn
    pub mint: MintValue,
}

/// Resolve a transition's effects into a draft transaction
pub fn resolve_effects(
    params: &HeadParameters,
    effects: &[Effect],
) -> Result<DraftTransaction, ConstraintError> {
    let mut draft = DraftTransaction::default();

    for effect in effects {
        match effect {
            Effect::ConsumeCommitment { lock } => {
                if !draft.consumes.contains(lock) {
                    draft.consumes.push(*lock);
                }
            }
            Effect::BurnToken { name } => {
                let asset = AssetId {
                    policy: params.policy_id,
                    name: *name,
                };
                draft.mint = std::mem::take(&mut draft.mint).with(asset, -1);
            }
            Effect::Reimburse { commitment } => {
                let (reference, output) = &commitment.fragment;
                // The fragment must be paid back unchanged, which requires
                // a key owner to pay it back to.
                if !matches!(output.address, Address::Key(_)) {
                    return Err(ConstraintError::NoOwningKey(*reference));
                }
                draft.outputs.push(output.clone());
            }
        }
    }

    if draft.consumes.is_empty() && draft.outputs.is_empty() && draft.mint.is_empty() {
        return Err(ConstraintError::EmptyDraft);
    }
    Ok(draft)
}
