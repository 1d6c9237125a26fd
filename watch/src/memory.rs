//! In-memory base ledger for tests and local simulation
//!
//! Applies submitted transactions atomically: script validation, value
//! conservation modulo mint, then UTXO replacement. Submission failures
//! leave the chain untouched, mirroring the atomicity of real ledger
//! transactions. UTXO-consumption exclusivity gives the same single-writer
//! behavior as the real chain: the second spender of an output fails to
//! resolve.

use crate::collector::{ChainPoint, ChainQuery};
use crate::errors::WatchError;
use async_trait::async_trait;
use isthmus_head::HeadParameters;
use isthmus_ledger::{Address, OutputRef, Transaction, TxInfo, TxOut, UtxoSet};
use isthmus_scripts::{validate_bundle, BuiltTransaction};
use parking_lot::RwLock;
use tracing::debug;

struct Inner {
    utxos: UtxoSet,
    /// Confirmed transactions with the height they confirmed at
    log: Vec<(ChainPoint, Transaction)>,
    height: ChainPoint,
}

/// A simulated base ledger holding one head's chain state
pub struct MemoryChain {
    params: HeadParameters,
    seed: OutputRef,
    inner: RwLock<Inner>,
}

impl MemoryChain {
    pub fn new(params: HeadParameters, seed: OutputRef, genesis: UtxoSet) -> Self {
        Self {
            params,
            seed,
            inner: RwLock::new(Inner {
                utxos: genesis,
                log: Vec::new(),
                height: 0,
            }),
        }
    }

    /// Submit a built transaction: validate scripts, check conservation,
    /// confirm atomically
    pub fn submit(&self, built: &BuiltTransaction) -> Result<(), WatchError> {
        let mut inner = self.inner.write();

        let info = TxInfo::resolve(&inner.utxos, &built.transaction, built.signatories.clone())?;
        validate_bundle(&self.params, &self.seed, &info, &built.executions)?;
        check_conservation(&info)?;

        let mut next = inner.utxos.clone();
        for input in &built.transaction.inputs {
            next.0.remove(input);
        }
        for (index, output) in built.transaction.outputs.iter().enumerate() {
            next.insert(
                built.transaction.output_ref(index as u32),
                output.clone(),
            );
        }

        inner.utxos = next;
        inner.height += 1;
        let height = inner.height;
        inner.log.push((height, built.transaction.clone()));
        debug!(height, tx = %hex::encode(&built.transaction.id()[..8]), "transaction confirmed");
        Ok(())
    }

    /// Snapshot of the current UTXO set
    pub fn utxos(&self) -> UtxoSet {
        self.inner.read().utxos.clone()
    }

    /// Current chain height
    pub fn height(&self) -> ChainPoint {
        self.inner.read().height
    }

    /// Unspent outputs at an address
    pub fn outputs_at(&self, address: &Address) -> Vec<(OutputRef, TxOut)> {
        self.inner
            .read()
            .utxos
            .iter()
            .filter(|(_, o)| o.address == *address)
            .map(|(r, o)| (*r, o.clone()))
            .collect()
    }
}

/// Coin must balance exactly; assets balance once the mint is added in
fn check_conservation(info: &TxInfo) -> Result<(), WatchError> {
    let consumed = info.consumed_value();
    let mut produced_coin = 0u64;
    let mut produced_assets = std::collections::BTreeMap::new();
    for output in &info.outputs {
        produced_coin += output.value.coin;
        for (asset, quantity) in &output.value.assets {
            *produced_assets.entry(*asset).or_insert(0i128) += *quantity as i128;
        }
    }

    if consumed.coin != produced_coin {
        return Err(WatchError::ValueNotConserved);
    }

    let mut balance = produced_assets;
    for (asset, quantity) in &consumed.assets {
        *balance.entry(*asset).or_insert(0) -= *quantity as i128;
    }
    for (asset, quantity) in &info.mint.0 {
        *balance.entry(*asset).or_insert(0) -= *quantity as i128;
    }
    if balance.values().any(|q| *q != 0) {
        return Err(WatchError::ValueNotConserved);
    }
    Ok(())
}

#[async_trait]
impl ChainQuery for MemoryChain {
    async fn transactions_at(
        &self,
        address: &Address,
        from: ChainPoint,
    ) -> Result<(Vec<Transaction>, ChainPoint), WatchError> {
        let inner = self.inner.read();
        let transactions = inner
            .log
            .iter()
            .filter(|(height, _)| *height > from)
            .filter(|(_, tx)| tx.outputs.iter().any(|o| o.address == *address))
            .map(|(_, tx)| tx.clone())
            .collect();
        Ok((transactions, inner.height))
    }
}
