//! Voter registration and credit balances.

use std::collections::BTreeMap;

use quadra_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Credit balance of a registered voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    /// Budget fixed at registration
    pub total_credits: u64,
    /// Credits spent so far, never above `total_credits`
    pub used_credits: u64,
}

impl Voter {
    fn new(total_credits: u64) -> Self {
        Self {
            total_credits,
            used_credits: 0,
        }
    }

    pub fn remaining_credits(&self) -> u64 {
        self.total_credits.saturating_sub(self.used_credits)
    }

    /// Deduct `amount` already checked by `VoterRegistry::spendable`.
    pub(crate) fn spend(&mut self, amount: u64) {
        self.used_credits += amount;
    }
}

/// Read-only view of a voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoterInfo {
    pub voter: Address,
    pub is_registered: bool,
    pub total_credits: u64,
    pub used_credits: u64,
    pub remaining_credits: u64,
}

/// Registered voters keyed by identity.
#[derive(Debug)]
pub(crate) struct VoterRegistry {
    admin: Address,
    initial_credits: u64,
    voters: BTreeMap<Address, Voter>,
}

impl VoterRegistry {
    pub fn new(admin: Address, initial_credits: u64) -> Self {
        Self {
            admin,
            initial_credits,
            voters: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted records. Records must already be validated.
    pub fn from_records(
        admin: Address,
        initial_credits: u64,
        voters: BTreeMap<Address, Voter>,
    ) -> Self {
        Self {
            admin,
            initial_credits,
            voters,
        }
    }

    /// Register `voter` with the configured credit budget.
    pub fn register(&mut self, caller: &Address, voter: Address) -> Result<Voter, VotingError> {
        if caller != &self.admin {
            return Err(VotingError::NotAuthorized);
        }
        if voter.is_zero() {
            return Err(VotingError::InvalidIdentity);
        }
        if self.voters.contains_key(&voter) {
            return Err(VotingError::AlreadyRegistered);
        }

        let record = Voter::new(self.initial_credits);
        self.voters.insert(voter, record);
        Ok(record)
    }

    pub fn is_registered(&self, voter: &Address) -> bool {
        self.voters.contains_key(voter)
    }

    /// Look up `voter` and check that `amount` fits their remaining credits.
    /// Nothing is deducted; the caller spends on the returned record.
    pub fn spendable(&mut self, voter: &Address, amount: u64) -> Result<&mut Voter, VotingError> {
        let record = self.voters.get_mut(voter).ok_or(VotingError::NotRegistered)?;
        let remaining = record.remaining_credits();
        if amount > remaining {
            return Err(VotingError::InsufficientCredits {
                requested: amount,
                remaining,
            });
        }
        Ok(record)
    }

    pub fn info(&self, voter: &Address) -> Option<VoterInfo> {
        self.voters.get(voter).map(|record| VoterInfo {
            voter: *voter,
            is_registered: true,
            total_credits: record.total_credits,
            used_credits: record.used_credits,
            remaining_credits: record.remaining_credits(),
        })
    }

    pub fn records(&self) -> &BTreeMap<Address, Voter> {
        &self.voters
    }
}
