//! Skid record and query filter types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{SkidStatus, Sn};

/// Fully materialized, persisted skid record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkidRecord {
    /// Store-assigned sequential number.
    pub sn: Sn,
    /// Vendor code copied at creation time.
    pub vendor_code: String,
    /// Vendor name copied at creation time.
    pub vendor_name: String,
    /// Creation date.
    pub date: NaiveDate,
    /// Size of the batch this record belongs to.
    pub total_skids: u32,
    /// Position in the batch, `1..=total_skids`.
    pub current_skid: u32,
    /// Free-form invoice reference.
    pub invoice_no: String,
    /// Formatted, checksummed label serial.
    pub serial_no: String,
    /// Completion state.
    pub status: SkidStatus,
}

impl SkidRecord {
    /// Returns true once the skid has been scanned.
    pub fn is_done(&self) -> bool {
        self.status == SkidStatus::Done
    }
}

/// Optional equality filters applied to record queries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Only records created on this date.
    pub date: Option<NaiveDate>,
    /// Only records for this vendor.
    pub vendor_code: Option<String>,
}

impl RecordFilter {
    /// Filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching one day.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            vendor_code: None,
        }
    }

    /// Narrows the filter to one vendor.
    pub fn vendor(mut self, vendor_code: impl Into<String>) -> Self {
        self.vendor_code = Some(vendor_code.into());
        self
    }

    /// Returns true when `rec` passes every set field.
    pub fn matches(&self, rec: &SkidRecord) -> bool {
        self.date.is_none_or(|d| rec.date == d)
            && self
                .vendor_code
                .as_deref()
                .is_none_or(|v| rec.vendor_code == v)
    }
}
