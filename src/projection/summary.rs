use chrono::NaiveDate;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{
    persist::{PersistResult, RecordStore},
    skid::{RecordFilter, SkidRecord},
    types::{SkidStatus, SortOrder},
};

/// Finished versus total skids for one vendor on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProgress {
    pub vendor_code: String,
    pub vendor_name: String,
    pub finished_tasks: u64,
    pub total_tasks: u64,
}

/// Everything received on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_skids: u64,
    pub unique_vendors: usize,
    /// Vendors in order of their first skid that day.
    pub vendors: Vec<VendorProgress>,
    /// Oldest first.
    pub records: Vec<SkidRecord>,
}

impl DailySummary {
    pub fn vendor(&self, vendor_code: &str) -> Option<&VendorProgress> {
        self.vendors.iter().find(|v| v.vendor_code == vendor_code)
    }
}

pub fn daily_summary(store: &dyn RecordStore, date: NaiveDate) -> PersistResult<DailySummary> {
    let filter = RecordFilter::on(date);
    let records = store.query(&filter, SortOrder::Ascending)?;
    let vendors = vendor_progress(store, &filter, &records)?;

    Ok(DailySummary {
        date,
        total_skids: records.len() as u64,
        unique_vendors: vendors.len(),
        vendors,
        records,
    })
}

fn vendor_progress(
    store: &dyn RecordStore,
    filter: &RecordFilter,
    records: &[SkidRecord],
) -> PersistResult<Vec<VendorProgress>> {
    let mut seen = HashSet::new();
    let mut vendors = Vec::new();
    for rec in records {
        if !seen.insert(rec.vendor_code.as_str()) {
            continue;
        }
        let vendor_filter = filter.clone().vendor(rec.vendor_code.as_str());
        vendors.push(VendorProgress {
            vendor_code: rec.vendor_code.clone(),
            vendor_name: rec.vendor_name.clone(),
            finished_tasks: store.count(&vendor_filter, Some(SkidStatus::Done))?,
            total_tasks: store.count(&vendor_filter, None)?,
        });
    }
    Ok(vendors)
}
