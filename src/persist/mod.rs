pub mod sqlite;

use thiserror::Error;

use crate::{
    skid::{RecordFilter, SkidRecord},
    types::{CounterValue, SkidStatus, Sn, SortOrder},
};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("store unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("{0}")]
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, msg)
                if matches!(
                    err.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
            {
                Self::DuplicateKey(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::QueryReturnedNoRows => Self::Corrupt(value.to_string()),
            _ => Self::Unavailable(value),
        }
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

pub trait RecordStore: Send {
    fn max_sn(&self) -> PersistResult<Sn>;

    /// Durably advances the unique-ID counter by `n` and returns the first
    /// reserved value. Values handed out are never returned again.
    fn reserve_counter_values(&mut self, n: u64) -> PersistResult<CounterValue>;

    fn next_counter_value(&mut self) -> PersistResult<CounterValue> {
        self.reserve_counter_values(1)
    }

    /// Appends all of `records` or none of them.
    fn insert_batch(&mut self, records: &[SkidRecord]) -> PersistResult<()>;

    fn insert(&mut self, record: SkidRecord) -> PersistResult<()> {
        self.insert_batch(std::slice::from_ref(&record))
    }

    fn find_by_serial(&self, serial_no: &str) -> PersistResult<Option<SkidRecord>>;

    /// Flips open records with `serial_no` to done. Returns whether any row changed.
    fn set_status_done(&mut self, serial_no: &str) -> PersistResult<bool>;

    fn query(&self, filter: &RecordFilter, order: SortOrder) -> PersistResult<Vec<SkidRecord>>;

    fn count(&self, filter: &RecordFilter, status: Option<SkidStatus>) -> PersistResult<u64>;

    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
