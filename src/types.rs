//! Shared primitive IDs and skid-related enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store-assigned sequential skid number.
pub type Sn = u64;
/// Value drawn from the durable unique-ID counter.
pub type CounterValue = u64;

/// Site prefix leading every serial printed at this dock.
pub const SERIAL_PREFIX: &str = "04";
/// Operation type used for inbound intake labels.
pub const OP_INTAKE: &str = "01";
/// Total length of a formatted serial, check digit included.
pub const SERIAL_LEN: usize = 20;

/// Completion state of a skid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SkidStatus {
    /// Label issued, skid not yet scanned.
    Open,
    /// Skid scanned at the dock.
    Done,
}

impl SkidStatus {
    /// Stable text form used in storage and exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for SkidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "DONE" => Ok(Self::Done),
            other => Err(format!("unknown skid status: {other}")),
        }
    }
}

/// Ordering applied to record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first, used by daily views.
    #[default]
    Ascending,
    /// Newest first, used by full exports.
    Descending,
}
