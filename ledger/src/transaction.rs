//! Transactions, outputs, and addressing

use crate::errors::LedgerError;
use crate::value::{MintValue, Value};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Reference to a transaction output: `(transaction id, output index)`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Producing transaction id
    pub tx_id: [u8; 32],
    /// Output position within that transaction
    pub index: u32,
}

impl OutputRef {
    pub fn new(tx_id: [u8; 32], index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl std::fmt::Debug for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", hex::encode(&self.tx_id[..8]), self.index)
    }
}

impl std::fmt::Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", hex::encode(&self.tx_id[..8]), self.index)
    }
}

/// blake3 hash of a payment verification key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyHash(pub [u8; 32]);

impl std::fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KeyHash").field(&hex::encode(&self.0[..8])).finish()
    }
}

/// blake3 hash identifying a validator script
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScriptHash(pub [u8; 32]);

impl std::fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScriptHash").field(&hex::encode(&self.0[..8])).finish()
    }
}

/// An output's payment address
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Address {
    /// Spendable by the holder of the hashed key
    Key(KeyHash),
    /// Guarded by the hashed validator script
    Script(ScriptHash),
}

/// Opaque datum bytes attached to an output
///
/// Validators agree on the bincode encoding of their typed datums, so the
/// wire form is bit-exact across implementations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum(pub Vec<u8>);

impl Datum {
    /// Encode a typed value into datum bytes
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, LedgerError> {
        let bytes =
            bincode::serialize(value).map_err(|e| LedgerError::DatumEncoding(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Decode datum bytes into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, LedgerError> {
        bincode::deserialize(&self.0).map_err(|e| LedgerError::DatumDecoding(e.to_string()))
    }
}

impl std::fmt::Debug for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Datum({} bytes)", self.0.len())
    }
}

/// A transaction output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Payment address
    pub address: Address,
    /// Carried value
    pub value: Value,
    /// Optional attached datum
    pub datum: Option<Datum>,
}

impl TxOut {
    /// Output to a key address with no datum
    pub fn to_key(key: KeyHash, value: Value) -> Self {
        Self {
            address: Address::Key(key),
            value,
            datum: None,
        }
    }

    /// Output to a script address with a datum
    pub fn to_script(script: ScriptHash, value: Value, datum: Datum) -> Self {
        Self {
            address: Address::Script(script),
            value,
            datum: Some(datum),
        }
    }
}

/// A ledger transaction
///
/// The same shape serves both layers: base-ledger transactions carry mints
/// and script interactions, head-internal transactions move plain outputs
/// and must not mint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Consumed output references
    pub inputs: Vec<OutputRef>,
    /// Produced outputs, index-ordered
    pub outputs: Vec<TxOut>,
    /// Minted (positive) and burned (negative) assets
    pub mint: MintValue,
}

impl Transaction {
    /// Transaction id: blake3 over the bincode serialized form
    pub fn id(&self) -> [u8; 32] {
        let bytes = bincode::serialize(self).unwrap_or_default();
        *blake3::hash(&bytes).as_bytes()
    }

    /// Reference to this transaction's output at `index`
    pub fn output_ref(&self, index: u32) -> OutputRef {
        OutputRef::new(self.id(), index)
    }

    /// Sum of produced values
    pub fn produced_value(&self) -> Value {
        Value::sum(self.outputs.iter().map(|o| &o.value))
    }
}
