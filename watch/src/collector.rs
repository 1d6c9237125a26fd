//! Commit collector: accumulate commitments until quorum or deadline

use crate::errors::WatchError;
use async_trait::async_trait;
use isthmus_head::{transition, Commitment, HeadParameters, HeadState, Input, Transition};
use isthmus_ledger::{Address, OutputRef, Transaction};
use isthmus_scripts::CommitDatum;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A position in the chain's transaction history
pub type ChainPoint = u64;

/// The narrow seam to a base-ledger client
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Transactions paying to `address`, strictly after `from`, together
    /// with the new cursor position
    async fn transactions_at(
        &self,
        address: &Address,
        from: ChainPoint,
    ) -> Result<(Vec<Transaction>, ChainPoint), WatchError>;
}

/// Collector tunables
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Delay between polling ticks
    pub poll_interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Collector state
#[derive(Debug, Clone)]
pub enum CollectorState {
    /// Accumulating commitments, keyed by locked output reference
    Waiting {
        accumulated: BTreeMap<OutputRef, Commitment>,
    },
    /// Quorum reached; the full set was handed to the transition function
    Done,
    /// Deadline passed first; the partial set was handed to Abort
    Expired,
}

/// Result of one polling tick
#[derive(Debug)]
pub enum PollOutcome {
    /// Still waiting for commitments
    Pending { seen: usize, need: usize },
    /// All participants committed; the CollectCom transition is authorized
    Quorum(Transition),
    /// The commit deadline passed; the Abort transition is authorized
    Expired(Transition),
}

/// Watches the commit address until every participant has committed
///
/// Deduplicates by locked output reference and by participant, and ignores
/// transactions whose outputs are not exactly the single commit payment —
/// spurious traffic that merely touches the address proves nothing.
pub struct CommitCollector {
    params: HeadParameters,
    config: CollectorConfig,
    state: CollectorState,
    cursor: ChainPoint,
    started_at: Instant,
}

impl CommitCollector {
    pub fn new(params: HeadParameters, config: CollectorConfig) -> Self {
        Self {
            params,
            config,
            state: CollectorState::Waiting {
                accumulated: BTreeMap::new(),
            },
            cursor: 0,
            started_at: Instant::now(),
        }
    }

    /// Current collector state
    pub fn state(&self) -> &CollectorState {
        &self.state
    }

    /// One polling tick: fetch, filter, merge, then decide
    pub async fn poll_once<Q: ChainQuery + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Result<PollOutcome, WatchError> {
        let accumulated = match &mut self.state {
            CollectorState::Waiting { accumulated } => accumulated,
            CollectorState::Done | CollectorState::Expired => {
                return Err(WatchError::Query("collector already finished".into()))
            }
        };

        let commit_address = self.params.commit_address();
        let (transactions, cursor) = query.transactions_at(&commit_address, self.cursor).await?;
        self.cursor = cursor;

        for tx in &transactions {
            match observe_commit(&self.params, tx) {
                Some(commitment) => {
                    let duplicate_participant = accumulated
                        .values()
                        .any(|c| c.participant == commitment.participant);
                    if duplicate_participant || accumulated.contains_key(&commitment.lock) {
                        debug!(lock = %commitment.lock, "ignoring duplicate commitment");
                        continue;
                    }
                    info!(
                        lock = %commitment.lock,
                        seen = accumulated.len() + 1,
                        need = self.params.participant_count(),
                        "observed commitment"
                    );
                    accumulated.insert(commitment.lock, commitment);
                }
                None => {
                    warn!(tx = %hex_id(tx), "ignoring spurious transaction at commit address");
                }
            }
        }

        let seen = accumulated.len();
        let need = self.params.participant_count();

        if seen == need {
            let commitments: Vec<Commitment> = accumulated.values().cloned().collect();
            let authorized = transition(
                &self.params,
                &HeadState::Collecting,
                &Input::CollectCom { commitments },
            )?;
            info!(count = seen, "quorum reached, collect authorized");
            self.state = CollectorState::Done;
            return Ok(PollOutcome::Quorum(authorized));
        }

        if self.started_at.elapsed() >= self.params.commit_deadline {
            let commitments: Vec<Commitment> = accumulated.values().cloned().collect();
            let authorized = transition(
                &self.params,
                &HeadState::Collecting,
                &Input::Abort { commitments },
            )?;
            warn!(seen, need, "commit deadline passed, abort authorized");
            self.state = CollectorState::Expired;
            return Ok(PollOutcome::Expired(authorized));
        }

        Ok(PollOutcome::Pending { seen, need })
    }

    /// Poll until quorum or deadline, at the configured interval
    pub async fn run<Q: ChainQuery + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Result<Transition, WatchError> {
        let mut ticks = tokio::time::interval(self.config.poll_interval);
        loop {
            ticks.tick().await;
            match self.poll_once(query).await? {
                PollOutcome::Pending { seen, need } => {
                    debug!(seen, need, "still collecting");
                }
                PollOutcome::Quorum(transition) | PollOutcome::Expired(transition) => {
                    return Ok(transition)
                }
            }
        }
    }
}

/// Decode a commitment from a transaction at the commit address
///
/// Only transactions whose sole output is the commit payment count.
fn observe_commit(params: &HeadParameters, tx: &Transaction) -> Option<Commitment> {
    if tx.outputs.len() != 1 {
        return None;
    }
    let output = &tx.outputs[0];
    if output.address != params.commit_address() {
        return None;
    }
    let datum: CommitDatum = output.datum.as_ref()?.decode().ok()?;
    if !params.is_participant(&datum.participant) {
        return None;
    }
    Some(Commitment {
        participant: datum.participant,
        lock: tx.output_ref(0),
        fragment: datum.fragment,
    })
}

fn hex_id(tx: &Transaction) -> String {
    hex::encode(&tx.id()[..8])
}
