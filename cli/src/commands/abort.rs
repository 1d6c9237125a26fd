//! Abort Command - partial commits, deadline expiry, reimbursement

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::commands::{fragment_ref, load_or_generate, simulation};
use isthmus_head::{transition, HeadState, Input};
use isthmus_ledger::Address;
use isthmus_scripts::{build_abort, build_commit, build_init};
use isthmus_watch::{CollectorConfig, CommitCollector};

/// Run the abort path: only some participants commit, the deadline passes,
/// tokens burn and commitments are reimbursed
#[derive(Args)]
pub struct AbortCommand {
    /// Number of participants when no config is given
    #[arg(long, default_value_t = 3)]
    participants: usize,

    /// How many participants commit before the head gives up
    #[arg(long, default_value_t = 2)]
    commits: usize,

    /// Commit deadline in milliseconds for the simulation
    #[arg(long, default_value_t = 200)]
    deadline_ms: u64,
}

impl AbortCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> anyhow::Result<()> {
        let config = load_or_generate(config_path, self.participants)?;
        let sim = simulation(&config, Some(Duration::from_millis(self.deadline_ms)))?;
        let n = sim.params.participant_count();
        if self.commits >= n {
            anyhow::bail!("abort demo needs fewer commits than participants");
        }

        let mut state = HeadState::Initial;
        state = transition(&sim.params, &state, &Input::Init)?.next;

        let initiator = sim.keys[0].verification_key();
        let seed_out = sim
            .chain
            .utxos()
            .get(&sim.seed)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("seed output missing from genesis"))?;
        sim.chain
            .submit(&build_init(&sim.params, (sim.seed, seed_out), &initiator)?)?;

        // Only the first `commits` participants follow through
        for (i, key) in sim.keys.iter().take(self.commits).enumerate() {
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
        info!(commits = self.commits, need = n, "waiting out the deadline");

        // Quorum never arrives; the watcher authorizes the abort instead
        let mut collector = CommitCollector::new(
            sim.params.clone(),
            CollectorConfig {
                poll_interval: Duration::from_millis(20),
            },
        );
        let authorized = collector.run(&sim.chain).await?;
        let draft = isthmus_head::resolve_effects(&sim.params, &authorized.effects)?;
        info!(
            consumes = draft.consumes.len(),
            reimbursements = draft.outputs.len(),
            "resolved abort effects"
        );
        state = authorized.next;

        // Execute the abort on-chain: burn every token, reimburse the locked
        // commitments
        let head = sim
            .chain
            .outputs_at(&sim.params.head_address())
            .pop()
            .ok_or_else(|| anyhow::anyhow!("head state output missing"))?;
        let commits = sim.chain.outputs_at(&sim.params.commit_address());
        let initials: Vec<_> = sim
            .keys
            .iter()
            .skip(self.commits)
            .flat_map(|key| {
                let participant = key.verification_key();
                sim.chain
                    .outputs_at(&sim.params.initial_address(&participant))
                    .into_iter()
                    .map(move |(r, o)| (participant.clone(), r, o))
            })
            .collect();

        sim.chain
            .submit(&build_abort(&sim.params, head, &initials, &commits, &initiator)?)?;

        // Every committed fragment is back with its owner
        let mut reimbursed = 0usize;
        for (i, key) in sim.keys.iter().take(self.commits).enumerate() {
            let owner = Address::Key(isthmus_head::HeadParameters::key_hash(
                &key.verification_key(),
            ));
            let expected = 10 * (i as u64 + 1);
            if sim
                .chain
                .outputs_at(&owner)
                .iter()
                .any(|(_, o)| o.value.coin == expected)
            {
                reimbursed += 1;
            }
        }

        println!();
        println!("Head aborted");
        println!("  Participants:  {}", n);
        println!("  Committed:     {}", self.commits);
        println!("  Reimbursed:    {}", reimbursed);
        println!("  Tokens burned: {}", n);
        println!("  Final state:   {}", state.tag());
        Ok(())
    }
}
