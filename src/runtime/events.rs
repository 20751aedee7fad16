//! Runtime event stream payloads.

use serde::Serialize;

use crate::types::Sn;

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SkidEvent {
    /// An intake batch was written in full.
    BatchCommitted {
        /// Delivering vendor.
        vendor_code: String,
        /// Invoice shared by the batch.
        invoice_no: String,
        /// First SN of the batch.
        first_sn: Sn,
        /// Last SN of the batch.
        last_sn: Sn,
    },
    /// A skid was scanned and marked done.
    SkidCompleted {
        /// SN of the completed skid.
        sn: Sn,
        /// Scanned serial.
        serial_no: String,
    },
}
