//! Timestamp type used by the voting engine.
//!
//! Timestamps are Unix epoch seconds. The engine never reads a clock itself;
//! callers pass the current time into every time-sensitive operation.

use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp moved forward by `secs`, or `None` on overflow.
    pub fn checked_add_secs(&self, secs: u64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Seconds from `self` until `later`, zero if `later` is not after `self`.
    pub fn secs_until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = TypesError;

    /// Accepts plain seconds ("1700000000") or the display form ("1700000000s").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_suffix('s').unwrap_or(s);
        Ok(Self(digits.parse::<u64>()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add() {
        let t = Timestamp::new(100);
        assert_eq!(t.checked_add_secs(3600), Some(Timestamp::new(3700)));
        assert_eq!(Timestamp::new(u64::MAX).checked_add_secs(1), None);
    }

    #[test]
    fn test_secs_until() {
        let t = Timestamp::new(100);
        assert_eq!(t.secs_until(Timestamp::new(160)), 60);
        assert_eq!(t.secs_until(Timestamp::new(50)), 0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("42".parse::<Timestamp>().unwrap(), Timestamp::new(42));
        assert_eq!("42s".parse::<Timestamp>().unwrap(), Timestamp::new(42));
        assert!(matches!(
            "forty".parse::<Timestamp>(),
            Err(TypesError::InvalidTimestamp(_))
        ));
        assert_eq!(Timestamp::new(7).to_string(), "7s");
    }
}
