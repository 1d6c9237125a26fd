//! Run Command - full lifecycle to a successful close

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::commands::{fragment_ref, load_or_generate, simulation};
use isthmus_head::{
    snapshot, transition, Eta, HeadState, Input, Xi,
};
use isthmus_ledger::{Transaction, TxOut};
use isthmus_scripts::{build_close, build_collect, build_commit, build_init};
use isthmus_watch::{CollectorConfig, CommitCollector};

/// Run init, commits, collect, snapshot rounds, and close
#[derive(Args)]
pub struct RunCommand {
    /// Number of participants when no config is given
    #[arg(long, default_value_t = 3)]
    participants: usize,

    /// Number of confirmed snapshot rounds before closing
    #[arg(long, default_value_t = 2)]
    snapshots: u64,
}

impl RunCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> anyhow::Result<()> {
        let config = load_or_generate(config_path, self.participants)?;
        let sim = simulation(&config, None)?;
        let n = sim.params.participant_count();

        // Off-chain lifecycle state
        let mut state = HeadState::Initial;
        state = transition(&sim.params, &state, &Input::Init)?.next;
        info!(participants = n, "head initialized, collecting commitments");

        // Init on-chain: mint tokens, lock head state and pre-commit outputs
        let initiator = sim.keys[0].verification_key();
        let seed_out = sim
            .chain
            .utxos()
            .get(&sim.seed)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("seed output missing from genesis"))?;
        sim.chain
            .submit(&build_init(&sim.params, (sim.seed, seed_out), &initiator)?)?;

        // Every participant commits a fragment
        for (i, key) in sim.keys.iter().enumerate() {
            let participant = key.verification_key();
            let initial = sim
                .chain
                .outputs_at(&sim.params.initial_address(&participant))
                .pop()
                .ok_or_else(|| anyhow::anyhow!("no initial output for participant"))?;
            let fragment_out = sim
                .chain
                .utxos()
                .get(&fragment_ref(i))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("fragment missing from genesis"))?;
            sim.chain.submit(&build_commit(
                &sim.params,
                &participant,
                initial,
                (fragment_ref(i), fragment_out),
            )?)?;
        }

        // The watcher accumulates until quorum and authorizes CollectCom
        let mut collector = CommitCollector::new(
            sim.params.clone(),
            CollectorConfig {
                poll_interval: Duration::from_millis(10),
            },
        );
        let authorized = collector.run(&sim.chain).await?;
        let draft = isthmus_head::resolve_effects(&sim.params, &authorized.effects)?;
        info!(consumes = draft.consumes.len(), "resolved collect effects");
        state = authorized.next;

        // Execute the collect on-chain
        let head = sim
            .chain
            .outputs_at(&sim.params.head_address())
            .pop()
            .ok_or_else(|| anyhow::anyhow!("head state output missing"))?;
        let commits = sim.chain.outputs_at(&sim.params.commit_address());
        let signer = sim.keys[0].verification_key();
        sim.chain
            .submit(&build_collect(&sim.params, head, &commits, &signer)?)?;
        info!("head is open");

        // Off-ledger operation: confirm a few snapshot rounds
        let mut eta = match &state {
            HeadState::Open(open) => open.eta.clone(),
            other => anyhow::bail!("expected open head, got {}", other.tag()),
        };
        for round in 1..=self.snapshots {
            let tx = rotate_fragment(&eta, round as usize % n);
            let folded = eta.utxos.apply_transactions(&[tx.clone()])?;
            eta = Eta {
                utxos: folded,
                seq: round,
                transactions: vec![tx],
            };
            info!(seq = round, utxos = eta.utxos.len(), "snapshot confirmed");
        }

        // One more transaction still in flight when the head closes
        let pending = rotate_fragment(&eta, 0);
        let xi = Xi {
            utxos: eta.utxos.clone(),
            seq: eta.seq,
            snapshot_signature: if eta.seq == 0 {
                None
            } else {
                Some(snapshot::sign_snapshot(&sim.keys, &eta.utxos, eta.seq)?)
            },
            transactions: vec![snapshot::sign_transaction(&sim.keys, &pending)?],
        };

        state = transition(&sim.params, &state, &Input::Close { xi: xi.clone() })?.next;

        let open_head = sim
            .chain
            .outputs_at(&sim.params.head_address())
            .pop()
            .ok_or_else(|| anyhow::anyhow!("open head output missing"))?;
        sim.chain
            .submit(&build_close(&sim.params, open_head, xi)?)?;

        let settled = sim
            .chain
            .outputs_at(&sim.params.head_address())
            .pop()
            .ok_or_else(|| anyhow::anyhow!("settled head output missing"))?;

        println!();
        println!("Head lifecycle complete");
        println!("  Participants:        {}", n);
        println!("  Confirmed snapshots: {}", self.snapshots);
        println!("  Final state:         {}", state.tag());
        println!("  Settled value:       {}", settled.1.value);
        Ok(())
    }
}

/// A head-internal transfer: move the first fragment to another owner
fn rotate_fragment(eta: &Eta, to_index: usize) -> Transaction {
    let (reference, output) = eta
        .utxos
        .iter()
        .next()
        .map(|(r, o)| (*r, o.clone()))
        .expect("open head holds fragments");
    let mut moved = output.clone();
    if let isthmus_ledger::Address::Key(hash) = &mut moved.address {
        hash.0[0] = hash.0[0].wrapping_add(to_index as u8 + 1);
    }
    Transaction {
        inputs: vec![reference],
        outputs: vec![TxOut {
            address: moved.address,
            value: output.value,
            datum: None,
        }],
        mint: isthmus_ledger::MintValue::none(),
    }
}
