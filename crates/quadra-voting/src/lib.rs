//! Quadra Voting - Quadratic voting engine.
//!
//! This crate provides:
//! - Voter registration with a fixed credit budget
//! - Proposal lifecycle (Open -> Closed -> Executed)
//! - Quadratic vote casting: spending `c` credits yields `floor(sqrt(c))` votes
//! - Event delivery and state snapshots
//!
//! [`VotingEngine`] is the only entry point; the voter registry and the
//! proposal store behind it are not reachable from outside the crate.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod snapshot;
pub mod sqrt;
mod proposal;
mod registry;

pub use config::{EngineConfig, DEFAULT_INITIAL_CREDITS};
pub use engine::{VoteReceipt, VotingEngine};
pub use error::VotingError;
pub use events::{EventSink, MemoryEventSink, TracingEventSink, VotingEvent};
pub use proposal::{Proposal, ProposalStatus, ProposalView};
pub use registry::{Voter, VoterInfo};
pub use snapshot::{EngineSnapshot, SNAPSHOT_VERSION};
pub use sqrt::isqrt;
