//! Numeric compiler diagnostic codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiler diagnostic code, displayed as `TS` followed by the number
/// (e.g. `TS2322`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCode(pub u32);

impl DiagnosticCode {
    /// Parses a code written as `TS1234` (the prefix is required).
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("TS")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(DiagnosticCode)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS{}", self.0)
    }
}
