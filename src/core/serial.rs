//! Structured serial allocation and the clock it reads dates from.

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error;

use crate::{
    core::checksum::{ChecksumError, luhn_check_digit, luhn_is_valid},
    types::{CounterValue, SERIAL_LEN, SERIAL_PREFIX},
};

/// Largest unique ID that fits the 8-digit serial field.
pub const MAX_UNIQUE_ID: CounterValue = 99_999_999;

/// Serial allocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    /// A value does not fit its fixed-width field.
    #[error("{field} value {value} overflows its serial field")]
    CounterOverflow {
        /// Name of the overflowing field.
        field: &'static str,
        /// Offending value.
        value: u64,
    },
    /// Operation type is not exactly two ASCII digits.
    #[error("operation type {0:?} must be two digits")]
    InvalidOperationType(String),
    /// Check digit computation rejected the payload.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Formats a serial for `operation_type` and `unique_id` dated `date`.
///
/// Layout: prefix(2) operation(2) year(4) day-of-year(3) unique-id(8) check(1).
pub fn allocate_serial(
    operation_type: &str,
    unique_id: CounterValue,
    date: NaiveDate,
) -> Result<String, SerialError> {
    if operation_type.len() != 2 || !operation_type.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SerialError::InvalidOperationType(operation_type.to_string()));
    }
    if unique_id == 0 || unique_id > MAX_UNIQUE_ID {
        return Err(SerialError::CounterOverflow {
            field: "unique_id",
            value: unique_id,
        });
    }
    let year = date.year();
    if !(0..=9999).contains(&year) {
        return Err(SerialError::CounterOverflow {
            field: "year",
            value: year.unsigned_abs().into(),
        });
    }

    let payload = format!(
        "{SERIAL_PREFIX}{operation_type}{year:04}{:03}{unique_id:08}",
        date.ordinal()
    );
    let check = luhn_check_digit(&payload)?;
    Ok(format!("{payload}{check}"))
}

/// Allocates a serial dated by `clock`.
pub fn allocate_serial_now(
    clock: &dyn Clock,
    operation_type: &str,
    unique_id: CounterValue,
) -> Result<String, SerialError> {
    allocate_serial(operation_type, unique_id, clock.today())
}

/// Shape test used by scan routing: fixed length and site prefix.
pub fn looks_like_serial(code: &str) -> bool {
    code.len() == SERIAL_LEN && code.starts_with(SERIAL_PREFIX)
}

/// Full validation: serial shape, digits only, and a passing check digit.
pub fn is_valid_serial(code: &str) -> bool {
    looks_like_serial(code) && luhn_is_valid(code)
}
