use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    persist::{PersistResult, RecordStore},
    skid::{RecordFilter, SkidRecord},
    types::SortOrder,
};

/// Data printed on one skid label. `serial_no` is the barcode payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub serial_no: String,
    pub vendor_code: String,
    pub vendor_name: String,
    pub invoice_no: String,
    pub date: NaiveDate,
    /// "current of total", e.g. "2 of 3".
    pub position: String,
}

impl From<&SkidRecord> for Label {
    fn from(rec: &SkidRecord) -> Self {
        Self {
            serial_no: rec.serial_no.clone(),
            vendor_code: rec.vendor_code.clone(),
            vendor_name: rec.vendor_name.clone(),
            invoice_no: rec.invoice_no.clone(),
            date: rec.date,
            position: format!("{} of {}", rec.current_skid, rec.total_skids),
        }
    }
}

/// Labels for `date`, optionally narrowed to one vendor, oldest first.
pub fn labels_for(
    store: &dyn RecordStore,
    date: NaiveDate,
    vendor_code: Option<&str>,
) -> PersistResult<Vec<Label>> {
    let mut filter = RecordFilter::on(date);
    if let Some(code) = vendor_code {
        filter = filter.vendor(code);
    }
    Ok(store
        .query(&filter, SortOrder::Ascending)?
        .iter()
        .map(Label::from)
        .collect())
}
