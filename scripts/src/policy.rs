//! The participation-token minting policy
//!
//! One-shot: minting is legal only in the transaction that spends the seed
//! output the policy is parameterized by, so a `(head, policy)` pair can
//! mint its token set exactly once across the head's lifetime. Token names
//! are the blake3 hashes of participant keys — any script recomputes
//! "participant X's token" without a lookup table. Burning is quantity-
//! unrestricted here; the head validator's Abort branch is what pins it to
//! exactly one burn per participant.

use crate::bundle::{CoRequirement, RedeemerTag, ScriptKind};
use crate::data::PolicyRedeemer;
use crate::errors::ScriptError;
use crate::ScriptResult;
use isthmus_head::HeadParameters;
use isthmus_ledger::{OutputRef, PolicyId, TxInfo};
use std::collections::BTreeSet;

/// Domain tag for policy id derivation
const TAG_POLICY: &[u8] = b"isthmus/policy/participation";

/// The one-shot minting policy for a head's participation tokens
#[derive(Clone, Debug)]
pub struct ParticipationPolicy {
    params: HeadParameters,
    seed: OutputRef,
}

impl ParticipationPolicy {
    pub fn new(params: HeadParameters, seed: OutputRef) -> Self {
        Self { params, seed }
    }

    /// Derive the policy id for a given seed input
    pub fn derive_id(seed: &OutputRef) -> PolicyId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TAG_POLICY);
        hasher.update(&seed.tx_id);
        hasher.update(&seed.index.to_le_bytes());
        PolicyId(*hasher.finalize().as_bytes())
    }

    /// This policy's id
    pub fn id(&self) -> PolicyId {
        Self::derive_id(&self.seed)
    }

    /// Validate the transaction's mint under this policy
    pub fn validate(&self, redeemer: &PolicyRedeemer, info: &TxInfo) -> ScriptResult<()> {
        if self.id() != self.params.policy_id {
            return Err(ScriptError::PolicyMismatch);
        }

        match redeemer {
            PolicyRedeemer::Mint => self.mint(info),
            PolicyRedeemer::Burn => self.burn(info),
        }
    }

    /// Sibling executions this policy relies on
    pub fn co_requirements(&self, redeemer: &PolicyRedeemer) -> Vec<CoRequirement> {
        match redeemer {
            PolicyRedeemer::Mint => Vec::new(),
            PolicyRedeemer::Burn => {
                vec![CoRequirement::new(ScriptKind::Head, RedeemerTag::HeadAbort)]
            }
        }
    }

    /// Mint path: the seed is spent and exactly the deterministic token
    /// set is produced, one per participant
    fn mint(&self, info: &TxInfo) -> ScriptResult<()> {
        if !info.spends(&self.seed) {
            return Err(ScriptError::SeedNotSpent(self.seed));
        }

        let expected: BTreeSet<_> = self.params.token_names().into_iter().collect();
        let mut minted = BTreeSet::new();
        for (asset, quantity) in info.mint.under_policy(&self.params.policy_id) {
            if !expected.contains(&asset.name) {
                return Err(ScriptError::UnexpectedTokenName(asset.name));
            }
            if quantity != 1 {
                return Err(ScriptError::WrongMintQuantity {
                    name: asset.name,
                    got: quantity,
                });
            }
            minted.insert(asset.name);
        }
        for name in expected {
            if !minted.contains(&name) {
                return Err(ScriptError::WrongMintQuantity { name, got: 0 });
            }
        }
        Ok(())
    }

    /// Burn path: only negative quantities under this policy
    fn burn(&self, info: &TxInfo) -> ScriptResult<()> {
        for (asset, quantity) in info.mint.under_policy(&self.params.policy_id) {
            if quantity > 0 {
                return Err(ScriptError::PositiveBurnQuantity(asset.name));
            }
        }
        Ok(())
    }
}
