//! Engine construction parameters.

use quadra_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Credits granted to every voter at registration unless configured otherwise.
pub const DEFAULT_INITIAL_CREDITS: u64 = 100;

fn default_initial_credits() -> u64 {
    DEFAULT_INITIAL_CREDITS
}

/// Configuration fixed for the lifetime of an engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identity allowed to register voters, create and execute proposals
    pub admin: Address,
    /// Credit budget assigned to each voter at registration
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u64,
}

impl EngineConfig {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            initial_credits: DEFAULT_INITIAL_CREDITS,
        }
    }

    pub fn with_initial_credits(mut self, initial_credits: u64) -> Self {
        self.initial_credits = initial_credits;
        self
    }

    /// The admin must be a real identity.
    pub fn validate(&self) -> Result<(), VotingError> {
        if self.admin.is_zero() {
            return Err(VotingError::InvalidIdentity);
        }
        Ok(())
    }
}
