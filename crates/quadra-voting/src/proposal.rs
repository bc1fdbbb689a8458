//! Proposal lifecycle management.
//!
//! Proposals go through states: Open -> Closed -> Executed

use std::collections::BTreeMap;

use quadra_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Proposal status, derived from the current time and the executed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Voting is active (now < voting_end_time)
    Open,
    /// Voting ended, waiting for execution
    Closed,
    /// Proposal was executed (terminal)
    Executed,
}

impl ProposalStatus {
    /// Check if voting is still possible.
    pub fn can_vote(&self) -> bool {
        matches!(self, ProposalStatus::Open)
    }
}

/// Stored proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential proposal ID, starting at 1
    pub id: u64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// First instant at which voting is closed
    pub voting_end_time: Timestamp,
    /// Sum of isqrt(credits) over accepted votes
    pub total_votes: u64,
    /// Set once by execution
    pub executed: bool,
    /// Credits spent per voter; presence means the voter has voted
    pub voter_credits: BTreeMap<Address, u64>,
}

impl Proposal {
    fn new(id: u64, title: String, description: String, voting_end_time: Timestamp) -> Self {
        Self {
            id,
            title,
            description,
            voting_end_time,
            total_votes: 0,
            executed: false,
            voter_credits: BTreeMap::new(),
        }
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if now < self.voting_end_time {
            ProposalStatus::Open
        } else {
            ProposalStatus::Closed
        }
    }

    /// Check if voter has voted.
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voter_credits.contains_key(voter)
    }

    /// Record an accepted vote. Callers obtain the proposal through
    /// `ProposalStore::votable`, which rules out a second vote by `voter`.
    pub(crate) fn add_vote(&mut self, voter: Address, credits: u64, votes: u64) {
        self.voter_credits.insert(voter, credits);
        self.total_votes = self.total_votes.saturating_add(votes);
    }

    pub fn view(&self) -> ProposalView {
        ProposalView {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            voting_end_time: self.voting_end_time,
            total_votes: self.total_votes,
            executed: self.executed,
            voter_count: self.voter_credits.len(),
        }
    }
}

/// Read-only snapshot of a proposal, without per-voter records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub voting_end_time: Timestamp,
    pub total_votes: u64,
    pub executed: bool,
    /// Number of voters who voted on this proposal
    pub voter_count: usize,
}

/// Proposal table keyed by sequential id.
#[derive(Debug)]
pub(crate) struct ProposalStore {
    admin: Address,
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
}

impl ProposalStore {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            proposals: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild from persisted records. Records must already be validated.
    pub fn from_records(admin: Address, proposals: BTreeMap<u64, Proposal>) -> Self {
        let next_id = proposals.len() as u64 + 1;
        Self {
            admin,
            proposals,
            next_id,
        }
    }

    /// Create a new proposal and return the stored record.
    pub fn create(
        &mut self,
        caller: &Address,
        title: &str,
        description: &str,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<&Proposal, VotingError> {
        if caller != &self.admin {
            return Err(VotingError::NotAuthorized);
        }
        if title.is_empty() {
            return Err(VotingError::EmptyTitle);
        }
        if duration_secs == 0 {
            return Err(VotingError::InvalidDuration(duration_secs));
        }
        let voting_end_time = now
            .checked_add_secs(duration_secs)
            .ok_or(VotingError::InvalidDuration(duration_secs))?;

        let id = self.next_id;
        self.next_id += 1;

        let proposal = Proposal::new(id, title.to_string(), description.to_string(), voting_end_time);
        Ok(&*self.proposals.entry(id).or_insert(proposal))
    }

    /// Look up `proposal_id` and check that `voter` may vote on it at `now`.
    pub fn votable(
        &mut self,
        proposal_id: u64,
        voter: &Address,
        now: Timestamp,
    ) -> Result<&mut Proposal, VotingError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;

        if !proposal.status(now).can_vote() {
            return Err(VotingError::VotingClosed);
        }
        if proposal.has_voted(voter) {
            return Err(VotingError::AlreadyVoted);
        }
        Ok(proposal)
    }

    /// Execute a closed proposal.
    pub fn execute(
        &mut self,
        caller: &Address,
        proposal_id: u64,
        now: Timestamp,
    ) -> Result<&Proposal, VotingError> {
        if caller != &self.admin {
            return Err(VotingError::NotAuthorized);
        }
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;

        match proposal.status(now) {
            ProposalStatus::Open => return Err(VotingError::VotingStillOpen),
            ProposalStatus::Executed => return Err(VotingError::AlreadyExecuted),
            ProposalStatus::Closed => {}
        }

        proposal.executed = true;
        Ok(&*proposal)
    }

    pub fn get(&self, proposal_id: u64) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    pub fn has_voted_on(&self, proposal_id: u64, voter: &Address) -> bool {
        self.proposals
            .get(&proposal_id)
            .is_some_and(|p| p.has_voted(voter))
    }

    /// Number of proposals ever created (the highest assigned id).
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }

    pub fn records(&self) -> &BTreeMap<u64, Proposal> {
        &self.proposals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_bytes([0xaa; 20])
    }

    fn voter(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    const T0: Timestamp = Timestamp::new(1_000);

    fn vote(
        store: &mut ProposalStore,
        id: u64,
        voter: Address,
        credits: u64,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        store
            .votable(id, &voter, now)
            .map(|p| p.add_vote(voter, credits, crate::sqrt::isqrt(credits)))
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = ProposalStore::new(admin());
        let first = store.create(&admin(), "First", "", 3600, T0).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.voting_end_time, Timestamp::new(4_600));
        assert_eq!(first.status(T0), ProposalStatus::Open);

        let second = store.create(&admin(), "Second", "desc", 60, T0).unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_create_rejections() {
        let mut store = ProposalStore::new(admin());
        assert_eq!(
            store.create(&voter(1), "T", "D", 60, T0).unwrap_err(),
            VotingError::NotAuthorized
        );
        assert_eq!(store.create(&admin(), "", "D", 60, T0).unwrap_err(), VotingError::EmptyTitle);
        assert_eq!(
            store.create(&admin(), "T", "D", 0, T0).unwrap_err(),
            VotingError::InvalidDuration(0)
        );
        assert_eq!(
            store.create(&admin(), "T", "D", u64::MAX, T0).unwrap_err(),
            VotingError::InvalidDuration(u64::MAX)
        );
        // Failed creations do not consume ids
        assert_eq!(store.count(), 0);
        assert_eq!(store.create(&admin(), "T", "D", 60, T0).unwrap().id, 1);
    }

    #[test]
    fn test_vote_recording() {
        let mut store = ProposalStore::new(admin());
        store.create(&admin(), "T", "D", 3600, T0).unwrap();

        vote(&mut store, 1, voter(1), 36, Timestamp::new(1_001)).unwrap();
        assert!(store.has_voted_on(1, &voter(1)));
        assert!(!store.has_voted_on(1, &voter(2)));
        assert_eq!(store.get(1).unwrap().total_votes, 6);

        assert_eq!(
            vote(&mut store, 1, voter(1), 4, Timestamp::new(1_002)),
            Err(VotingError::AlreadyVoted)
        );
        assert_eq!(store.get(1).unwrap().total_votes, 6);

        assert_eq!(
            vote(&mut store, 2, voter(2), 4, T0),
            Err(VotingError::ProposalNotFound(2))
        );
    }

    #[test]
    fn test_vote_window_end_is_exclusive() {
        let mut store = ProposalStore::new(admin());
        store.create(&admin(), "T", "D", 3600, T0).unwrap();

        assert!(store.votable(1, &voter(1), Timestamp::new(4_599)).is_ok());
        assert_eq!(
            store.votable(1, &voter(1), Timestamp::new(4_600)).unwrap_err(),
            VotingError::VotingClosed
        );
        assert_eq!(
            store.votable(1, &voter(1), Timestamp::new(9_999)).unwrap_err(),
            VotingError::VotingClosed
        );
    }

    #[test]
    fn test_execute_lifecycle() {
        let mut store = ProposalStore::new(admin());
        store.create(&admin(), "T", "D", 3600, T0).unwrap();

        assert_eq!(
            store.execute(&admin(), 1, Timestamp::new(4_599)).unwrap_err(),
            VotingError::VotingStillOpen
        );
        assert_eq!(
            store.execute(&voter(1), 1, Timestamp::new(4_600)).unwrap_err(),
            VotingError::NotAuthorized
        );
        assert_eq!(
            store.execute(&admin(), 5, Timestamp::new(4_600)).unwrap_err(),
            VotingError::ProposalNotFound(5)
        );

        // Exactly at the end instant succeeds
        let executed = store.execute(&admin(), 1, Timestamp::new(4_600)).unwrap();
        assert!(executed.executed);
        assert_eq!(store.get(1).unwrap().status(Timestamp::new(4_600)), ProposalStatus::Executed);

        assert_eq!(
            store.execute(&admin(), 1, Timestamp::new(5_000)).unwrap_err(),
            VotingError::AlreadyExecuted
        );
    }

    #[test]
    fn test_executed_proposal_rejects_votes() {
        let mut store = ProposalStore::new(admin());
        store.create(&admin(), "T", "D", 10, T0).unwrap();
        store.execute(&admin(), 1, Timestamp::new(1_010)).unwrap();
        assert_eq!(
            store.votable(1, &voter(1), Timestamp::new(1_010)).unwrap_err(),
            VotingError::VotingClosed
        );
    }

    #[test]
    fn test_view_hides_voter_records() {
        let mut store = ProposalStore::new(admin());
        store.create(&admin(), "T", "D", 3600, T0).unwrap();
        vote(&mut store, 1, voter(1), 9, T0).unwrap();
        vote(&mut store, 1, voter(2), 16, T0).unwrap();

        let view = store.get(1).unwrap().view();
        assert_eq!(view.total_votes, 7);
        assert_eq!(view.voter_count, 2);
        assert!(!view.executed);
    }

    #[test]
    fn test_status_helpers() {
        assert!(ProposalStatus::Open.can_vote());
        assert!(!ProposalStatus::Closed.can_vote());
        assert!(!ProposalStatus::Executed.can_vote());
    }
}
