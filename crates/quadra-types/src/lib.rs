//! Quadra Types - Core type definitions shared by the Quadra crates.
//!
//! - Addresses (20-byte, Bech32m encoded) identifying voters and the admin
//! - Timestamps (Unix seconds) supplied explicitly by callers

pub mod address;
pub mod time;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use address::Address;
pub use time::Timestamp;
pub use error::TypesError;
