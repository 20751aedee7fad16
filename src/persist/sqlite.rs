//! SQLite-backed skid record store.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::{
    skid::{RecordFilter, SkidRecord},
    types::{CounterValue, SkidStatus, Sn, SortOrder},
};

use super::{PersistError, PersistResult, RecordStore};

const UNIQUE_ID_COUNTER: &str = "serial_unique_id";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT sn, vendor_code, vendor_name, date, total_skids, current_skid, invoice_no, serial_no, status FROM skids";

/// SQLite implementation of [`crate::persist::RecordStore`].
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Returns the last value handed out by the unique-ID counter.
    pub fn counter_value(&self) -> PersistResult<CounterValue> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM counters WHERE name = ?1",
                params![UNIQUE_ID_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0) as CounterValue)
    }
}

impl RecordStore for SqliteRecordStore {
    fn max_sn(&self) -> PersistResult<Sn> {
        let sn: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(sn), 0) FROM skids", [], |row| row.get(0))?;
        Ok(sn as Sn)
    }

    fn reserve_counter_values(&mut self, n: u64) -> PersistResult<CounterValue> {
        if n == 0 {
            return Err(PersistError::Message("cannot reserve zero counter values".to_string()));
        }
        // Committed on its own so a later failed insert leaves a gap, never a reuse.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let end: i64 = tx
            .query_row(
                "UPDATE counters SET value = value + ?1 WHERE name = ?2 RETURNING value",
                params![n as i64, UNIQUE_ID_COUNTER],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| PersistError::Corrupt(format!("counter row {UNIQUE_ID_COUNTER} is missing")))?;
        tx.commit()?;
        Ok(end as CounterValue - n + 1)
    }

    fn insert_batch(&mut self, records: &[SkidRecord]) -> PersistResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO skids(sn, vendor_code, vendor_name, date, total_skids, current_skid, invoice_no, serial_no, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for rec in records {
                stmt.execute(params![
                    rec.sn as i64,
                    rec.vendor_code,
                    rec.vendor_name,
                    rec.date.format(DATE_FORMAT).to_string(),
                    rec.total_skids,
                    rec.current_skid,
                    rec.invoice_no,
                    rec.serial_no,
                    rec.status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_by_serial(&self, serial_no: &str) -> PersistResult<Option<SkidRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE serial_no = ?1");
        let rec = self
            .conn
            .query_row(&sql, params![serial_no], record_from_row)
            .optional()?;
        Ok(rec)
    }

    fn set_status_done(&mut self, serial_no: &str) -> PersistResult<bool> {
        let changed = self.conn.execute(
            "UPDATE skids SET status = 'DONE' WHERE serial_no = ?1 AND status = 'OPEN'",
            params![serial_no],
        )?;
        Ok(changed > 0)
    }

    fn query(&self, filter: &RecordFilter, order: SortOrder) -> PersistResult<Vec<SkidRecord>> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            "{SELECT_COLUMNS} WHERE (?1 IS NULL OR date = ?1) AND (?2 IS NULL OR vendor_code = ?2) \
             ORDER BY date {direction}, sn {direction}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![filter_date(filter), filter.vendor_code],
            record_from_row,
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn count(&self, filter: &RecordFilter, status: Option<SkidStatus>) -> PersistResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM skids WHERE (?1 IS NULL OR date = ?1) \
             AND (?2 IS NULL OR vendor_code = ?2) AND (?3 IS NULL OR status = ?3)",
            params![
                filter_date(filter),
                filter.vendor_code,
                status.map(SkidStatus::as_str)
            ],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn filter_date(filter: &RecordFilter) -> Option<String> {
    filter.date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SkidRecord> {
    let sn: i64 = row.get(0)?;
    let date: String = row.get(3)?;
    let status: String = row.get(8)?;

    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|err| conversion_failure(3, err.to_string()))?;
    let status = status
        .parse::<SkidStatus>()
        .map_err(|err| conversion_failure(8, err))?;

    Ok(SkidRecord {
        sn: sn as Sn,
        vendor_code: row.get(1)?,
        vendor_name: row.get(2)?,
        date,
        total_skids: row.get(4)?,
        current_skid: row.get(5)?,
        invoice_no: row.get(6)?,
        serial_no: row.get(7)?,
        status,
    })
}

fn conversion_failure(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::other(message)),
    )
}
