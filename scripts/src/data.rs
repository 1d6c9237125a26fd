//! Typed datums and redeemers
//!
//! The wire form of every datum and redeemer is its bincode encoding via
//! [`isthmus_ledger::Datum`]; validators must agree on these bytes exactly,
//! so the types here are the single source of the on-chain data format.

use isthmus_head::{OpenState, Xi};
use isthmus_ledger::{OutputRef, TxOut, UtxoSet};
use isthmus_multisig::VerificationKey;
use serde::{Deserialize, Serialize};

/// State datum locked at the head address
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HeadDatum {
    /// Head created, commitments not yet collected
    Initial,
    /// Head operational; carries the aggregate key and confirmed snapshot
    Open(OpenState),
    /// Head settled; carries the final UTXO set for settlement
    Final { utxos: UtxoSet },
}

impl HeadDatum {
    /// Short tag for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            HeadDatum::Initial => "Initial",
            HeadDatum::Open(_) => "Open",
            HeadDatum::Final { .. } => "Final",
        }
    }
}

/// Redeemer for the head validator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HeadRedeemer {
    /// Collect all commitments and open the head
    CollectCom,
    /// Close with a candidate final snapshot
    Close(Xi),
    /// Abort before opening
    Abort,
}

/// Datum locked at a participant's initial address: that participant's
/// token name, so the output is self-describing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialDatum {
    pub token_name: isthmus_ledger::TokenName,
}

/// Redeemer for the initial validator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum InitialRedeemer {
    /// Commit a UTXO fragment, forwarding the token to the commit address
    Commit {
        /// The contributed fragment: original reference and output
        fragment: (OutputRef, TxOut),
    },
    /// Abort path: legality delegated to the head validator
    Abort,
}

/// Datum locked at the commit address: the committed fragment and its owner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitDatum {
    /// The committing participant
    pub participant: VerificationKey,
    /// The contributed UTXO fragment: original reference and output
    pub fragment: (OutputRef, TxOut),
}

/// Redeemer for the commit validator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CommitRedeemer {
    /// Collected into the opening head
    Collect,
    /// Aborted; fragment must be reimbursed
    Abort,
}

/// Redeemer for the participation-token policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PolicyRedeemer {
    /// One-shot mint of the full token set
    Mint,
    /// Burn on abort
    Burn,
}

/// The participation-token asset for one participant
pub(crate) fn token_asset(
    params: &isthmus_head::HeadParameters,
    key: &VerificationKey,
) -> isthmus_ledger::AssetId {
    isthmus_ledger::AssetId {
        policy: params.policy_id,
        name: isthmus_head::HeadParameters::token_name(key),
    }
}

/// True when the value carries any token under the head's policy
pub(crate) fn carries_policy_token(
    value: &isthmus_ledger::Value,
    policy: &isthmus_ledger::PolicyId,
) -> bool {
    value.assets.iter().any(|(asset, q)| asset.policy == *policy && *q > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isthmus_ledger::Datum;

    #[test]
    fn test_head_datum_wire_roundtrip() {
        let datum = Datum::encode(&HeadDatum::Initial).unwrap();
        let decoded: HeadDatum = datum.decode().unwrap();
        assert_eq!(decoded, HeadDatum::Initial);
    }

    #[test]
    fn test_commit_datum_wire_roundtrip() {
        use isthmus_ledger::{KeyHash, TxOut, Value};
        use isthmus_multisig::SigningKey;

        let datum = CommitDatum {
            participant: SigningKey::from_seed([3u8; 32]).verification_key(),
            fragment: (
                OutputRef::new([1u8; 32], 2),
                TxOut::to_key(KeyHash([4u8; 32]), Value::coin(11)),
            ),
        };
        let wire = Datum::encode(&datum).unwrap();
        let decoded: CommitDatum = wire.decode().unwrap();
        assert_eq!(decoded, datum);
    }
}
