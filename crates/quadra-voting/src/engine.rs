//! Voting engine: the single entry point for callers.
//!
//! Every mutating call takes the state write lock for its whole
//! validate-then-commit sequence, so concurrent callers observe each call
//! as atomic. Events are emitted after the commit, still under the lock, so
//! sinks see them in commit order.

use std::sync::Arc;

use parking_lot::RwLock;
use quadra_types::{Address, Timestamp};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::VotingError;
use crate::events::{EventSink, TracingEventSink, VotingEvent};
use crate::proposal::{ProposalStatus, ProposalStore, ProposalView};
use crate::registry::{VoterInfo, VoterRegistry};
use crate::snapshot::{EngineSnapshot, SNAPSHOT_VERSION};
use crate::sqrt::isqrt;

/// Proof of an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub proposal_id: u64,
    pub voter: Address,
    pub credits: u64,
    pub votes: u64,
}

#[derive(Debug)]
struct EngineState {
    registry: VoterRegistry,
    proposals: ProposalStore,
}

/// Quadratic voting engine.
pub struct VotingEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for VotingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingEngine")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .finish()
    }
}

fn rejected(operation: &'static str, err: VotingError) -> VotingError {
    debug!(operation, error = %err, "call rejected");
    err
}

impl VotingEngine {
    /// Create an engine that logs its events through `tracing`.
    pub fn new(config: EngineConfig) -> Result<Self, VotingError> {
        Self::with_event_sink(config, Arc::new(TracingEventSink))
    }

    /// Create an engine delivering events to `sink`.
    pub fn with_event_sink(
        config: EngineConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, VotingError> {
        config.validate()?;
        let state = EngineState {
            registry: VoterRegistry::new(config.admin, config.initial_credits),
            proposals: ProposalStore::new(config.admin),
        };
        info!(admin = %config.admin, initial_credits = config.initial_credits, "voting engine created");
        Ok(Self {
            config,
            state: RwLock::new(state),
            sink,
        })
    }

    /// Restore an engine from a snapshot, rejecting any inconsistent state.
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, VotingError> {
        if let Err(err) = snapshot.validate() {
            tracing::warn!(error = %err, "snapshot rejected");
            return Err(err);
        }

        let config = EngineConfig {
            admin: snapshot.admin,
            initial_credits: snapshot.initial_credits,
        };
        let state = EngineState {
            registry: VoterRegistry::from_records(
                config.admin,
                config.initial_credits,
                snapshot.voters,
            ),
            proposals: ProposalStore::from_records(config.admin, snapshot.proposals),
        };
        info!(
            admin = %config.admin,
            proposals = state.proposals.count(),
            voters = state.registry.records().len(),
            "voting engine restored"
        );
        Ok(Self {
            config,
            state: RwLock::new(state),
            sink,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn admin(&self) -> Address {
        self.config.admin
    }

    /// Register a voter. Admin only.
    pub fn register_voter(&self, caller: &Address, voter: Address) -> Result<(), VotingError> {
        let mut state = self.state.write();
        let record = state
            .registry
            .register(caller, voter)
            .map_err(|e| rejected("register_voter", e))?;

        info!(%voter, credits = record.total_credits, "voter registered");
        self.sink.emit(&VotingEvent::VoterRegistered {
            voter,
            credits: record.total_credits,
        });
        Ok(())
    }

    /// Open a proposal for `duration_secs` starting at `now`. Admin only.
    pub fn create_proposal(
        &self,
        caller: &Address,
        title: &str,
        description: &str,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<u64, VotingError> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .create(caller, title, description, duration_secs, now)
            .map_err(|e| rejected("create_proposal", e))?;

        info!(id = proposal.id, title, voting_end_time = %proposal.voting_end_time, "proposal created");
        self.sink.emit(&VotingEvent::ProposalCreated {
            id: proposal.id,
            title: proposal.title.clone(),
            voting_end_time: proposal.voting_end_time,
        });
        Ok(proposal.id)
    }

    /// Spend `credits` of `voter`'s budget on `proposal_id` for isqrt(credits) votes.
    pub fn cast_vote(
        &self,
        voter: Address,
        proposal_id: u64,
        credits: u64,
        now: Timestamp,
    ) -> Result<VoteReceipt, VotingError> {
        let mut state = self.state.write();
        let votes = Self::apply_vote(&mut state, voter, proposal_id, credits, now)
            .map_err(|e| rejected("cast_vote", e))?;

        let receipt = VoteReceipt {
            proposal_id,
            voter,
            credits,
            votes,
        };
        info!(proposal_id, %voter, credits, votes, "vote cast");
        self.sink.emit(&VotingEvent::VoteCast {
            proposal_id,
            voter,
            credits,
            votes,
        });
        Ok(receipt)
    }

    /// Check every cast_vote precondition in order, then record the vote
    /// and the spend. Nothing changes unless all checks pass.
    fn apply_vote(
        state: &mut EngineState,
        voter: Address,
        proposal_id: u64,
        credits: u64,
        now: Timestamp,
    ) -> Result<u64, VotingError> {
        if !state.registry.is_registered(&voter) {
            return Err(VotingError::NotRegistered);
        }
        let proposal = state.proposals.votable(proposal_id, &voter, now)?;
        if credits == 0 {
            return Err(VotingError::InvalidCredits);
        }
        let record = state.registry.spendable(&voter, credits)?;

        // Unreachable while credits > 0 holds; kept as a guard.
        let votes = isqrt(credits);
        if votes == 0 {
            return Err(VotingError::ZeroVoteResult);
        }

        proposal.add_vote(voter, credits, votes);
        record.spend(credits);
        Ok(votes)
    }

    /// Mark a closed proposal executed. Admin only.
    pub fn execute_proposal(
        &self,
        caller: &Address,
        proposal_id: u64,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .execute(caller, proposal_id, now)
            .map_err(|e| rejected("execute_proposal", e))?;

        info!(id = proposal_id, total_votes = proposal.total_votes, "proposal executed");
        self.sink.emit(&VotingEvent::ProposalExecuted {
            id: proposal_id,
            total_votes: proposal.total_votes,
        });
        Ok(())
    }

    pub fn get_proposal(&self, proposal_id: u64) -> Option<ProposalView> {
        self.state.read().proposals.get(proposal_id).map(|p| p.view())
    }

    pub fn get_voter_info(&self, voter: &Address) -> Option<VoterInfo> {
        self.state.read().registry.info(voter)
    }

    pub fn has_voted_on_proposal(&self, proposal_id: u64, voter: &Address) -> bool {
        self.state.read().proposals.has_voted_on(proposal_id, voter)
    }

    /// Credits `voter` spent on `proposal_id`, if they voted on it.
    pub fn voter_credits_on(&self, proposal_id: u64, voter: &Address) -> Option<u64> {
        self.state
            .read()
            .proposals
            .get(proposal_id)
            .and_then(|p| p.voter_credits.get(voter).copied())
    }

    pub fn proposal_status(&self, proposal_id: u64, now: Timestamp) -> Option<ProposalStatus> {
        self.state.read().proposals.get(proposal_id).map(|p| p.status(now))
    }

    /// All proposals in id order.
    pub fn proposals(&self) -> Vec<ProposalView> {
        self.state
            .read()
            .proposals
            .records()
            .values()
            .map(|p| p.view())
            .collect()
    }

    pub fn proposal_count(&self) -> u64 {
        self.state.read().proposals.count()
    }

    /// Consistent image of the whole state, taken under the read lock.
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.read();
        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            admin: self.config.admin,
            initial_credits: self.config.initial_credits,
            proposal_counter: state.proposals.count(),
            voters: state.registry.records().clone(),
            proposals: state.proposals.records().clone(),
        }
    }
}
