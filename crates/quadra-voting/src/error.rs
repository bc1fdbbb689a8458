use thiserror::Error;

/// Errors returned by voting engine operations.
///
/// Every variant is recoverable: a failed call leaves the engine state
/// untouched and the engine usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("Caller is not authorized for this operation")]
    NotAuthorized,

    #[error("Voter is not registered")]
    NotRegistered,

    #[error("Voter is already registered")]
    AlreadyRegistered,

    #[error("Invalid identity: the zero address cannot participate")]
    InvalidIdentity,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Proposal title must not be empty")]
    EmptyTitle,

    #[error("Invalid voting duration: {0}s")]
    InvalidDuration(u64),

    #[error("Voting period ended")]
    VotingClosed,

    #[error("Voting period still open")]
    VotingStillOpen,

    #[error("Proposal already executed")]
    AlreadyExecuted,

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Credit amount must be greater than zero")]
    InvalidCredits,

    #[error("Insufficient credits: requested {requested}, remaining {remaining}")]
    InsufficientCredits { requested: u64, remaining: u64 },

    #[error("Credit spend yields zero votes")]
    ZeroVoteResult,

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VotingError::ProposalNotFound(7);
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_insufficient_credits_display() {
        let err = VotingError::InsufficientCredits { requested: 65, remaining: 64 };
        assert!(err.to_string().contains("65"));
        assert!(err.to_string().contains("64"));
    }
}
