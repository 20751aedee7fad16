//! Batch intake workflow and scan routing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    core::serial::{SerialError, allocate_serial, is_valid_serial, looks_like_serial},
    persist::{PersistError, RecordStore},
    skid::SkidRecord,
    types::{OP_INTAKE, SkidStatus, Sn},
    vendor::{Vendor, VendorDirectory},
};

/// Default upper bound on skids in one intake submission.
pub const DEFAULT_MAX_SKIDS: u32 = 999;

/// Progress of one intake submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    /// Vendor code not yet checked.
    VendorUnvalidated,
    /// Vendor found in the directory.
    VendorValidated,
    /// Records being numbered and formatted.
    BatchExpanding,
    /// Whole batch persisted.
    BatchCommitted,
}

/// One intake submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRequest {
    /// Vendor delivering the skids.
    pub vendor_code: String,
    /// Number of skids in the delivery.
    pub total_skids: u32,
    /// Free-form invoice reference.
    pub invoice_no: String,
}

/// Intake failures.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Vendor code absent from the directory.
    #[error("unknown vendor {0:?}")]
    UnknownVendor(String),
    /// Skid count outside `1..=max`.
    #[error("total_skids {total_skids} must be between 1 and {max}")]
    InvalidBatch {
        /// Requested count.
        total_skids: u32,
        /// Configured maximum.
        max: u32,
    },
    /// Serial formatting failed.
    #[error(transparent)]
    Serial(#[from] SerialError),
    /// The store rejected a read or the batch write.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Records created by one committed batch, in `current_skid` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Committed records.
    pub records: Vec<SkidRecord>,
}

impl BatchReceipt {
    /// First SN of the batch.
    pub fn first_sn(&self) -> Option<Sn> {
        self.records.first().map(|r| r.sn)
    }

    /// Last SN of the batch.
    pub fn last_sn(&self) -> Option<Sn> {
        self.records.last().map(|r| r.sn)
    }
}

/// Validates `req`, numbers its skids after the store's current maximum SN,
/// and writes the whole batch at once.
///
/// Callers must serialise invocations against one store; the store's unique
/// keys turn any remaining race into [`PersistError::DuplicateKey`] for the
/// whole batch.
pub fn run_intake(
    store: &mut dyn RecordStore,
    directory: &VendorDirectory,
    date: NaiveDate,
    req: &IntakeRequest,
    max_skids: u32,
) -> Result<BatchReceipt, IntakeError> {
    let mut state = IntakeState::VendorUnvalidated;
    debug!(?state, vendor_code = %req.vendor_code, "intake received");

    let vendor = directory
        .lookup(&req.vendor_code)
        .ok_or_else(|| IntakeError::UnknownVendor(req.vendor_code.trim().to_string()))?;
    if req.total_skids == 0 || req.total_skids > max_skids {
        return Err(IntakeError::InvalidBatch {
            total_skids: req.total_skids,
            max: max_skids,
        });
    }
    state = IntakeState::VendorValidated;
    debug!(?state, vendor_code = %vendor.vendor_code);

    let base_sn = store.max_sn()?;
    let first_id = store.reserve_counter_values(u64::from(req.total_skids))?;
    state = IntakeState::BatchExpanding;
    debug!(?state, base_sn, first_id);

    let records = expand_batch(vendor, req, base_sn, first_id, date)?;
    store.insert_batch(&records)?;

    state = IntakeState::BatchCommitted;
    info!(
        ?state,
        vendor_code = %vendor.vendor_code,
        invoice_no = %req.invoice_no,
        first_sn = base_sn + 1,
        last_sn = base_sn + u64::from(req.total_skids),
        "intake batch committed"
    );
    Ok(BatchReceipt { records })
}

fn expand_batch(
    vendor: &Vendor,
    req: &IntakeRequest,
    base_sn: Sn,
    first_id: u64,
    date: NaiveDate,
) -> Result<Vec<SkidRecord>, SerialError> {
    let invoice_no = req.invoice_no.trim();
    (1..=req.total_skids)
        .map(|current_skid| {
            let offset = u64::from(current_skid);
            let serial_no = allocate_serial(OP_INTAKE, first_id + offset - 1, date)?;
            Ok(SkidRecord {
                sn: base_sn + offset,
                vendor_code: vendor.vendor_code.clone(),
                vendor_name: vendor.vendor_name.clone(),
                date,
                total_skids: req.total_skids,
                current_skid,
                invoice_no: invoice_no.to_string(),
                serial_no,
                status: SkidStatus::Open,
            })
        })
        .collect()
}

/// What a scanned code looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKind {
    /// Serial-shaped: fixed length and site prefix.
    Serial(String),
    /// Anything else is taken as a vendor code.
    VendorCode(String),
}

/// Routes a scanned code on shape alone.
pub fn classify_scan(code: &str) -> ScanKind {
    let code = code.trim();
    if looks_like_serial(code) {
        ScanKind::Serial(code.to_string())
    } else {
        ScanKind::VendorCode(code.to_string())
    }
}

/// Result of handling one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The skid flipped from open to done.
    Completed {
        /// Record after the flip.
        record: SkidRecord,
    },
    /// The skid was already done; nothing changed.
    AlreadyDone {
        /// Scanned serial.
        serial_no: String,
    },
    /// No record carries this serial.
    UnknownSerial {
        /// Scanned serial.
        serial_no: String,
    },
    /// A known vendor code; continue with intake for it.
    VendorFound {
        /// Directory entry.
        vendor: Vendor,
    },
    /// Neither a serial nor a known vendor code.
    UnknownVendor {
        /// Scanned code.
        code: String,
    },
    /// Serial-shaped but failing the check digit.
    Rejected {
        /// Scanned code.
        code: String,
    },
}

/// Applies one scan: completes a serial or resolves a vendor code.
pub fn handle_scan(
    store: &mut dyn RecordStore,
    directory: &VendorDirectory,
    code: &str,
    verify_checksum: bool,
) -> Result<ScanOutcome, PersistError> {
    match classify_scan(code) {
        ScanKind::Serial(serial_no) => {
            if verify_checksum && !is_valid_serial(&serial_no) {
                debug!(code = %serial_no, "scan rejected by check digit");
                return Ok(ScanOutcome::Rejected { code: serial_no });
            }
            if store.set_status_done(&serial_no)? {
                let record = store.find_by_serial(&serial_no)?.ok_or_else(|| {
                    PersistError::Message(format!("record {serial_no} vanished after update"))
                })?;
                info!(serial_no = %record.serial_no, sn = record.sn, "skid completed");
                return Ok(ScanOutcome::Completed { record });
            }
            Ok(match store.find_by_serial(&serial_no)? {
                Some(_) => ScanOutcome::AlreadyDone { serial_no },
                None => ScanOutcome::UnknownSerial { serial_no },
            })
        }
        ScanKind::VendorCode(code) => Ok(match directory.lookup(&code) {
            Some(vendor) => ScanOutcome::VendorFound {
                vendor: vendor.clone(),
            },
            None => ScanOutcome::UnknownVendor { code },
        }),
    }
}
