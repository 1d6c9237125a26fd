//! Ledger error types

use crate::transaction::OutputRef;
use crate::value::AssetId;
use thiserror::Error;

/// Errors that can occur while folding transactions over a UTXO set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced input is absent (already spent or never existed)
    #[error("Input not present in UTXO set: {0}")]
    MissingInput(OutputRef),

    /// A produced output reference collides with an existing one
    #[error("Output reference already exists: {0}")]
    DuplicateOutput(OutputRef),

    /// Coin value differs between consumed and produced sides
    #[error("Value not conserved: consumed {consumed} coin, produced {produced} coin")]
    ValueNotConserved { consumed: u64, produced: u64 },

    /// An asset quantity differs between consumed and produced sides
    #[error("Asset not conserved: {asset}")]
    AssetNotConserved { asset: AssetId },

    /// Transaction spends nothing
    #[error("Transaction has no inputs")]
    NoInputs,

    /// Off-ledger transactions may not mint or burn
    #[error("Unexpected mint in off-ledger transaction")]
    UnexpectedMint,

    /// Datum bytes did not decode to the expected type
    #[error("Datum decoding failed: {0}")]
    DatumDecoding(String),

    /// Datum value could not be encoded
    #[error("Datum encoding failed: {0}")]
    DatumEncoding(String),
}
