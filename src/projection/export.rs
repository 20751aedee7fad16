use crate::{
    csv::write_record,
    persist::{PersistResult, RecordStore},
    skid::{RecordFilter, SkidRecord},
    types::SortOrder,
};

/// Fixed export column order.
pub const EXPORT_COLUMNS: [&str; 9] = [
    "SN",
    "vendorCode",
    "vendorName",
    "date",
    "total_skids",
    "current_skid",
    "invoiceNo",
    "serialNo",
    "status",
];

/// Renders `records` as CSV with a header row.
pub fn records_to_csv(records: &[SkidRecord]) -> String {
    let mut out = String::new();
    write_record(&mut out, &EXPORT_COLUMNS[..]);
    for rec in records {
        write_record(
            &mut out,
            &[
                rec.sn.to_string(),
                rec.vendor_code.clone(),
                rec.vendor_name.clone(),
                rec.date.format("%Y-%m-%d").to_string(),
                rec.total_skids.to_string(),
                rec.current_skid.to_string(),
                rec.invoice_no.clone(),
                rec.serial_no.clone(),
                rec.status.to_string(),
            ][..],
        );
    }
    out
}

/// Exports every record, newest first.
pub fn export_csv(store: &dyn RecordStore) -> PersistResult<String> {
    let records = store.query(&RecordFilter::all(), SortOrder::Descending)?;
    Ok(records_to_csv(&records))
}
