//! Serializable image of the engine state.
//!
//! Holds the voter table keyed by identity, the proposal table keyed by id,
//! the proposal counter and the admin identity. Restoring re-checks every
//! accounting invariant so a tampered or truncated file is rejected whole.

use std::collections::BTreeMap;

use quadra_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::VotingError;
use crate::proposal::Proposal;
use crate::registry::Voter;
use crate::sqrt::isqrt;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    pub admin: Address,
    pub initial_credits: u64,
    /// Highest proposal id assigned so far
    pub proposal_counter: u64,
    pub voters: BTreeMap<Address, Voter>,
    pub proposals: BTreeMap<u64, Proposal>,
}

fn invalid(reason: impl Into<String>) -> VotingError {
    VotingError::InvalidSnapshot(reason.into())
}

impl EngineSnapshot {
    /// Check that the snapshot describes a state the engine could have reached.
    pub fn validate(&self) -> Result<(), VotingError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(invalid(format!(
                "unsupported version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.admin.is_zero() {
            return Err(invalid("admin is the zero address"));
        }

        for (address, voter) in &self.voters {
            if address.is_zero() {
                return Err(invalid("zero address registered as voter"));
            }
            if voter.total_credits != self.initial_credits {
                return Err(invalid(format!(
                    "voter {} holds {} credits but registration grants {}",
                    address, voter.total_credits, self.initial_credits
                )));
            }
            if voter.used_credits > voter.total_credits {
                return Err(invalid(format!(
                    "voter {} used {} of {} credits",
                    address, voter.used_credits, voter.total_credits
                )));
            }
        }

        if self.proposals.len() as u64 != self.proposal_counter {
            return Err(invalid(format!(
                "{} proposals stored but counter is {}",
                self.proposals.len(),
                self.proposal_counter
            )));
        }

        let mut spent: BTreeMap<Address, u64> = BTreeMap::new();
        for (expected_id, (id, proposal)) in (1u64..).zip(&self.proposals) {
            if *id != expected_id || proposal.id != expected_id {
                return Err(invalid(format!(
                    "proposal ids are not dense: expected {}, found key {} id {}",
                    expected_id, id, proposal.id
                )));
            }
            if proposal.title.is_empty() {
                return Err(invalid(format!("proposal {} has an empty title", id)));
            }

            let mut tally = 0u64;
            for (voter, credits) in &proposal.voter_credits {
                if *credits == 0 {
                    return Err(invalid(format!(
                        "proposal {} records a zero-credit vote by {}",
                        id, voter
                    )));
                }
                if !self.voters.contains_key(voter) {
                    return Err(invalid(format!(
                        "proposal {} has a vote from unregistered {}",
                        id, voter
                    )));
                }
                tally = tally
                    .checked_add(isqrt(*credits))
                    .ok_or_else(|| invalid(format!("proposal {} vote tally overflows", id)))?;
                let total = spent.entry(*voter).or_insert(0);
                *total = total
                    .checked_add(*credits)
                    .ok_or_else(|| invalid(format!("voter {} spend overflows", voter)))?;
            }
            if tally != proposal.total_votes {
                return Err(invalid(format!(
                    "proposal {} total votes {} does not match recorded spend ({})",
                    id, proposal.total_votes, tally
                )));
            }
        }

        for (address, voter) in &self.voters {
            let recorded = spent.get(address).copied().unwrap_or(0);
            if recorded != voter.used_credits {
                return Err(invalid(format!(
                    "voter {} used {} credits but proposals record {}",
                    address, voter.used_credits, recorded
                )));
            }
        }

        Ok(())
    }
}
