//! Resolved transaction context for on-chain validation
//!
//! A validator never sees the chain; it sees one transaction with its
//! inputs resolved to the outputs they consume, plus the signatories and
//! minted value. This triple of (datum, redeemer, context) is the entire
//! on-chain interface surface.

use crate::errors::LedgerError;
use crate::transaction::{Address, KeyHash, OutputRef, Transaction, TxOut};
use crate::utxo::UtxoSet;
use crate::value::{MintValue, Value};
use serde::{Deserialize, Serialize};

/// An input together with the output it consumes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
    /// The consumed reference
    pub reference: OutputRef,
    /// The output it resolves to
    pub output: TxOut,
}

/// The transaction view a validator inspects
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    /// Resolved inputs, in transaction order
    pub inputs: Vec<ResolvedInput>,
    /// Produced outputs, index-ordered
    pub outputs: Vec<TxOut>,
    /// Minted and burned assets
    pub mint: MintValue,
    /// Key hashes that signed the transaction
    pub signatories: Vec<KeyHash>,
}

impl TxInfo {
    /// Resolve a transaction against the UTXO set it spends from
    pub fn resolve(
        utxos: &UtxoSet,
        tx: &Transaction,
        signatories: Vec<KeyHash>,
    ) -> Result<Self, LedgerError> {
        let mut inputs = Vec::with_capacity(tx.inputs.len());
        for reference in &tx.inputs {
            let output = utxos
                .get(reference)
                .cloned()
                .ok_or(LedgerError::MissingInput(*reference))?;
            inputs.push(ResolvedInput {
                reference: *reference,
                output,
            });
        }
        Ok(Self {
            inputs,
            outputs: tx.outputs.clone(),
            mint: tx.mint.clone(),
            signatories,
        })
    }

    /// True when the given key hash signed
    pub fn is_signed_by(&self, key: &KeyHash) -> bool {
        self.signatories.contains(key)
    }

    /// Resolved inputs paying from the given address
    pub fn inputs_from(&self, address: &Address) -> impl Iterator<Item = &ResolvedInput> + '_ {
        let address = *address;
        self.inputs.iter().filter(move |i| i.output.address == address)
    }

    /// Outputs paying to the given address
    pub fn outputs_to(&self, address: &Address) -> impl Iterator<Item = &TxOut> + '_ {
        let address = *address;
        self.outputs.iter().filter(move |o| o.address == address)
    }

    /// Total value consumed by the transaction's inputs
    pub fn consumed_value(&self) -> Value {
        Value::sum(self.inputs.iter().map(|i| &i.output.value))
    }

    /// True when the input at `reference` is spent by this transaction
    pub fn spends(&self, reference: &OutputRef) -> bool {
        self.inputs.iter().any(|i| i.reference == *reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::ScriptHash;

    #[test]
    fn test_resolve_missing_input_fails() {
        let utxos = UtxoSet::new();
        let tx = Transaction {
            inputs: vec![OutputRef::new([1u8; 32], 0)],
            outputs: vec![],
            mint: MintValue::none(),
        };
        assert!(matches!(
            TxInfo::resolve(&utxos, &tx, vec![]),
            Err(LedgerError::MissingInput(_))
        ));
    }

    #[test]
    fn test_address_filters() {
        let script = Address::Script(ScriptHash([5u8; 32]));
        let key = Address::Key(KeyHash([6u8; 32]));
        let info = TxInfo {
            inputs: vec![ResolvedInput {
                reference: OutputRef::new([1u8; 32], 0),
                output: TxOut {
                    address: script,
                    value: Value::coin(3),
                    datum: None,
                },
            }],
            outputs: vec![
                TxOut {
                    address: key,
                    value: Value::coin(1),
                    datum: None,
                },
                TxOut {
                    address: script,
                    value: Value::coin(2),
                    datum: None,
                },
            ],
            mint: MintValue::none(),
            signatories: vec![KeyHash([6u8; 32])],
        };

        assert_eq!(info.inputs_from(&script).count(), 1);
        assert_eq!(info.outputs_to(&script).count(), 1);
        assert_eq!(info.consumed_value(), Value::coin(3));
        assert!(info.is_signed_by(&KeyHash([6u8; 32])));
        assert!(!info.is_signed_by(&KeyHash([7u8; 32])));
    }
}
