//! UTXO set and the deterministic transaction fold

use crate::errors::LedgerError;
use crate::transaction::{OutputRef, Transaction, TxOut};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of unspent transaction outputs, keyed by output reference
///
/// Backed by a `BTreeMap` so iteration order — and therefore every derived
/// serialization and hash — is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet(pub BTreeMap<OutputRef, TxOut>);

impl UtxoSet {
    /// The empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no outputs are held
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an output
    pub fn get(&self, reference: &OutputRef) -> Option<&TxOut> {
        self.0.get(reference)
    }

    /// True when the reference is unspent in this set
    pub fn contains(&self, reference: &OutputRef) -> bool {
        self.0.contains_key(reference)
    }

    /// Insert an output, replacing any previous entry
    pub fn insert(&mut self, reference: OutputRef, output: TxOut) {
        self.0.insert(reference, output);
    }

    /// Iterate entries in reference order
    pub fn iter(&self) -> impl Iterator<Item = (&OutputRef, &TxOut)> {
        self.0.iter()
    }

    /// Total value held across all outputs
    pub fn total_value(&self) -> Value {
        Value::sum(self.0.values().map(|o| &o.value))
    }

    /// Apply a single transaction, returning the successor set
    ///
    /// Pure: `self` is never modified. Fails without partial effects on the
    /// first violated rule — missing input, colliding output reference,
    /// unexpected mint, or value non-conservation.
    pub fn apply_transaction(&self, tx: &Transaction) -> Result<UtxoSet, LedgerError> {
        if tx.inputs.is_empty() {
            return Err(LedgerError::NoInputs);
        }
        if !tx.mint.is_empty() {
            return Err(LedgerError::UnexpectedMint);
        }

        let mut next = self.0.clone();
        let mut consumed = Value::zero();
        for input in &tx.inputs {
            match next.remove(input) {
                Some(out) => consumed = consumed.add(&out.value),
                None => return Err(LedgerError::MissingInput(*input)),
            }
        }

        let produced = tx.produced_value();
        if consumed.coin != produced.coin {
            return Err(LedgerError::ValueNotConserved {
                consumed: consumed.coin,
                produced: produced.coin,
            });
        }
        for asset in consumed.assets.keys().chain(produced.assets.keys()) {
            if consumed.asset_quantity(asset) != produced.asset_quantity(asset) {
                return Err(LedgerError::AssetNotConserved { asset: *asset });
            }
        }

        let tx_id = tx.id();
        for (index, output) in tx.outputs.iter().enumerate() {
            let reference = OutputRef::new(tx_id, index as u32);
            if next.contains_key(&reference) {
                return Err(LedgerError::DuplicateOutput(reference));
            }
            next.insert(reference, output.clone());
        }

        Ok(UtxoSet(next))
    }

    /// Fold a list of transactions in order
    ///
    /// Any failure aborts the whole fold; the input set is untouched either
    /// way.
    pub fn apply_transactions(&self, txs: &[Transaction]) -> Result<UtxoSet, LedgerError> {
        let mut current = self.clone();
        for tx in txs {
            current = current.apply_transaction(tx)?;
        }
        Ok(current)
    }
}

impl FromIterator<(OutputRef, TxOut)> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = (OutputRef, TxOut)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
