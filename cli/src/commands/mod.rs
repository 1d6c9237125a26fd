//! CLI Commands

mod abort;
mod keys;
mod run;

pub use abort::AbortCommand;
pub use keys::KeysCommand;
pub use run::RunCommand;

use crate::config::HeadConfig;
use isthmus_head::HeadParameters;
use isthmus_ledger::{OutputRef, TxOut, UtxoSet, Value};
use isthmus_multisig::SigningKey;
use isthmus_scripts::ParticipationPolicy;
use isthmus_watch::MemoryChain;
use std::time::Duration;

/// A head simulation: participant keys, parameters, and a fresh chain
pub(crate) struct Simulation {
    pub keys: Vec<SigningKey>,
    pub params: HeadParameters,
    pub seed: OutputRef,
    pub chain: MemoryChain,
}

/// Seed the chain with one funding output and one fragment per participant
pub(crate) fn simulation(
    config: &HeadConfig,
    deadline: Option<Duration>,
) -> anyhow::Result<Simulation> {
    let keys = config.signing_keys()?;
    let seed = OutputRef::new(*blake3::hash(b"isthmus/sim/seed").as_bytes(), 0);
    let params = HeadParameters::new(
        keys.iter().map(|k| k.verification_key()).collect(),
        ParticipationPolicy::derive_id(&seed),
        deadline.unwrap_or_else(|| config.commit_deadline()),
    );

    let mut genesis = UtxoSet::new();
    genesis.insert(
        seed,
        TxOut::to_key(
            HeadParameters::key_hash(&keys[0].verification_key()),
            Value::coin(100),
        ),
    );
    for (i, key) in keys.iter().enumerate() {
        genesis.insert(
            fragment_ref(i),
            TxOut::to_key(
                HeadParameters::key_hash(&key.verification_key()),
                Value::coin(10 * (i as u64 + 1)),
            ),
        );
    }

    let chain = MemoryChain::new(params.clone(), seed, genesis);
    Ok(Simulation {
        keys,
        params,
        seed,
        chain,
    })
}

/// Deterministic reference for participant `i`'s spendable fragment
pub(crate) fn fragment_ref(i: usize) -> OutputRef {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"isthmus/sim/fragment");
    hasher.update(&(i as u64).to_le_bytes());
    OutputRef::new(*hasher.finalize().as_bytes(), 0)
}

/// Load the config or fall back to `n` generated participants
pub(crate) fn load_or_generate(
    path: Option<std::path::PathBuf>,
    n: usize,
) -> anyhow::Result<HeadConfig> {
    match path {
        Some(path) => Ok(HeadConfig::load(&path)?),
        None => Ok(HeadConfig::generate(n)),
    }
}
