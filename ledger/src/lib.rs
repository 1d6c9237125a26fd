//! ISTHMUS Ledger Model
//!
//! The UTXO data model shared by both layers of a head:
//! - Base-ledger outputs, multi-asset values, and addresses
//! - Transactions with a blake3-over-bincode identity
//! - The deterministic, side-effect-free UTXO fold used by snapshot closing
//! - The resolved transaction context on-chain validators inspect
//!
//! Everything here is plain data: no I/O, no clocks, no global state. The
//! same `(UtxoSet, transactions)` pair always folds to the same result or
//! the same failure.

mod context;
mod errors;
mod transaction;
mod utxo;
mod value;

pub use context::{ResolvedInput, TxInfo};
pub use errors::LedgerError;
pub use transaction::{Address, Datum, KeyHash, OutputRef, ScriptHash, Transaction, TxOut};
pub use utxo::UtxoSet;
pub use value::{AssetId, MintValue, PolicyId, TokenName, Value};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
