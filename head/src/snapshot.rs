//! Snapshot engine: close-proposal verification
//!
//! Validates a proposed closing snapshot against the head's aggregate key
//! and the previously confirmed snapshot, then folds the proposal's
//! transactions onto the chosen base UTXO set. The engine has no idea which
//! participant initiated the close: a verifying aggregate signature already
//! proves sufficient consensus existed.
//!
//! The on-chain head validator runs this exact function for its Close
//! branch, so the off-chain and on-chain sides cannot drift.

use crate::errors::SnapshotError;
use crate::state::{Eta, SignedTransaction, Xi};
use isthmus_ledger::{Transaction, UtxoSet};
use isthmus_multisig::{hash_many, AggregateKey, MultiSignature, MultisigResult, SigningKey};

/// Message a head-internal transaction is signed over
pub fn transaction_message(tx: &Transaction) -> [u8; 32] {
    let bytes = bincode::serialize(tx).unwrap_or_default();
    *blake3::hash(&bytes).as_bytes()
}

/// Message a snapshot signature covers: the `(utxos, seq)` pair as a unit
///
/// Binding both fields under one hash is what stops a participant replaying
/// an old snapshot's UTXO set with a newer sequence number, or vice versa.
pub fn snapshot_message(utxos: &UtxoSet, seq: u64) -> [u8; 32] {
    let utxo_bytes = bincode::serialize(utxos).unwrap_or_default();
    let seq_bytes = bincode::serialize(&seq).unwrap_or_default();
    hash_many(&[&utxo_bytes, &seq_bytes])
}

/// Sign a head-internal transaction with every participant key
pub fn sign_transaction(keys: &[SigningKey], tx: &Transaction) -> MultisigResult<SignedTransaction> {
    let signature = isthmus_multisig::sign_all(keys, &transaction_message(tx))?;
    Ok(SignedTransaction {
        transaction: tx.clone(),
        signature,
    })
}

/// Sign a `(utxos, seq)` snapshot pair with every participant key
pub fn sign_snapshot(
    keys: &[SigningKey],
    utxos: &UtxoSet,
    seq: u64,
) -> MultisigResult<MultiSignature> {
    isthmus_multisig::sign_all(keys, &snapshot_message(utxos, seq))
}

/// Verify a close proposal and produce the settled snapshot
///
/// Rules, in order:
/// 1. Every proposed transaction must carry an aggregate signature over its
///    own hash — one combined check per transaction, not N.
/// 2. `seq == 0` closes on the confirmed snapshot's UTXO set with no
///    snapshot signature consulted; `seq > 0` requires a signature over the
///    proposed `(utxos, seq)` pair and forbids regressing behind the
///    confirmed sequence number.
/// 3. The proposed transactions fold deterministically onto the chosen base
///    set; any fold failure rejects the whole proposal.
///
/// Pure: failure leaves no trace, and the same invalid `xi` yields the same
/// rejection every time.
pub fn close(key_aggregate: &AggregateKey, eta: &Eta, xi: &Xi) -> Result<Eta, SnapshotError> {
    for (index, signed) in xi.transactions.iter().enumerate() {
        let message = transaction_message(&signed.transaction);
        if !key_aggregate.verify(&message, &signed.signature) {
            return Err(SnapshotError::TransactionSignature { index });
        }
    }

    let base = if xi.seq == 0 {
        // Closing with nothing confirmed beyond genesis: the proposal's
        // UTXO set is ignored in favor of the last confirmed state.
        eta.utxos.clone()
    } else {
        let signature = xi
            .snapshot_signature
            .as_ref()
            .ok_or(SnapshotError::MissingSnapshotSignature { seq: xi.seq })?;
        if !key_aggregate.verify(&snapshot_message(&xi.utxos, xi.seq), signature) {
            return Err(SnapshotError::SnapshotSignature);
        }
        if xi.seq < eta.seq {
            return Err(SnapshotError::SequenceRegression {
                proposed: xi.seq,
                confirmed: eta.seq,
            });
        }
        xi.utxos.clone()
    };

    let transactions: Vec<Transaction> = xi
        .transactions
        .iter()
        .map(|signed| signed.transaction.clone())
        .collect();
    let utxos = base.apply_transactions(&transactions)?;

    Ok(Eta {
        utxos,
        seq: xi.seq,
        transactions,
    })
}
