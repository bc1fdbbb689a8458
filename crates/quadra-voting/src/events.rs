//! Events emitted by the engine after each committed state change.
//!
//! Delivery is up to the sink; the engine only guarantees that events are
//! emitted after the change is applied, in commit order.

use parking_lot::Mutex;
use quadra_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Observable engine event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VotingEvent {
    /// A voter was registered with its initial credit budget
    VoterRegistered { voter: Address, credits: u64 },
    /// A proposal was opened for voting
    ProposalCreated {
        id: u64,
        title: String,
        voting_end_time: Timestamp,
    },
    /// A vote was accepted
    VoteCast {
        proposal_id: u64,
        voter: Address,
        credits: u64,
        votes: u64,
    },
    /// A closed proposal was executed
    ProposalExecuted { id: u64, total_votes: u64 },
}

impl VotingEvent {
    /// Short event name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            VotingEvent::VoterRegistered { .. } => "VoterRegistered",
            VotingEvent::ProposalCreated { .. } => "ProposalCreated",
            VotingEvent::VoteCast { .. } => "VoteCast",
            VotingEvent::ProposalExecuted { .. } => "ProposalExecuted",
        }
    }
}

/// Receiver for engine events.
///
/// Called while the engine holds its state lock, so implementations must
/// not call back into the engine.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VotingEvent);
}

/// Sink that writes every event to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &VotingEvent) {
        match event {
            VotingEvent::VoterRegistered { voter, credits } => {
                info!(event = event.kind(), %voter, credits, "voting event");
            }
            VotingEvent::ProposalCreated { id, title, voting_end_time } => {
                info!(event = event.kind(), id, %title, %voting_end_time, "voting event");
            }
            VotingEvent::VoteCast { proposal_id, voter, credits, votes } => {
                info!(event = event.kind(), proposal_id, %voter, credits, votes, "voting event");
            }
            VotingEvent::ProposalExecuted { id, total_votes } => {
                info!(event = event.kind(), id, total_votes, "voting event");
            }
        }
    }
}

/// Sink that buffers events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<VotingEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far.
    pub fn events(&self) -> Vec<VotingEvent> {
        self.events.lock().clone()
    }

    /// Drain buffered events.
    pub fn take(&self) -> Vec<VotingEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &VotingEvent) {
        self.events.lock().push(event.clone());
    }
}
