//! Test doubles shared by the integration suites.

use skidlog::{
    persist::{PersistError, PersistResult, RecordStore},
    skid::{RecordFilter, SkidRecord},
    types::{CounterValue, SkidStatus, Sn, SortOrder},
};

/// Store whose disk has gone away: every call fails with an I/O error.
pub struct DownStore;

fn io_error() -> PersistError {
    PersistError::Unavailable(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some("disk I/O error".to_string()),
    ))
}

impl RecordStore for DownStore {
    fn max_sn(&self) -> PersistResult<Sn> {
        Err(io_error())
    }

    fn reserve_counter_values(&mut self, _n: u64) -> PersistResult<CounterValue> {
        Err(io_error())
    }

    fn insert_batch(&mut self, _records: &[SkidRecord]) -> PersistResult<()> {
        Err(io_error())
    }

    fn find_by_serial(&self, _serial_no: &str) -> PersistResult<Option<SkidRecord>> {
        Err(io_error())
    }

    fn set_status_done(&mut self, _serial_no: &str) -> PersistResult<bool> {
        Err(io_error())
    }

    fn query(&self, _filter: &RecordFilter, _order: SortOrder) -> PersistResult<Vec<SkidRecord>> {
        Err(io_error())
    }

    fn count(&self, _filter: &RecordFilter, _status: Option<SkidStatus>) -> PersistResult<u64> {
        Err(io_error())
    }
}
