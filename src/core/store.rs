use chrono::NaiveDate;
use hashbrown::{HashMap, HashSet};

use crate::{
    persist::{PersistError, PersistResult, RecordStore},
    skid::{RecordFilter, SkidRecord},
    types::{CounterValue, SkidStatus, Sn, SortOrder},
};

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: HashMap<Sn, SkidRecord>,
    order: Vec<Sn>,
    by_serial: HashMap<String, Sn>,
    by_date: HashMap<NaiveDate, Vec<Sn>>,
    counter: CounterValue,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the unique-ID counter after `counter`, as if that many values
    /// had already been handed out.
    pub fn with_counter(counter: CounterValue) -> Self {
        Self {
            counter,
            ..Self::default()
        }
    }

    /// Last value handed out by the unique-ID counter.
    pub fn counter_value(&self) -> CounterValue {
        self.counter
    }

    fn candidates(&self, filter: &RecordFilter) -> Vec<&SkidRecord> {
        let ids: &[Sn] = match filter.date {
            Some(date) => self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.order,
        };
        ids.iter()
            .filter_map(|sn| self.records.get(sn))
            .filter(|rec| filter.matches(rec))
            .collect()
    }

    fn check_batch(&self, records: &[SkidRecord]) -> PersistResult<()> {
        let mut sns = HashSet::with_capacity(records.len());
        let mut serials = HashSet::with_capacity(records.len());
        for rec in records {
            if self.records.contains_key(&rec.sn) || !sns.insert(rec.sn) {
                return Err(PersistError::DuplicateKey(format!("sn {}", rec.sn)));
            }
            if self.by_serial.contains_key(&rec.serial_no) || !serials.insert(rec.serial_no.as_str()) {
                return Err(PersistError::DuplicateKey(format!("serial_no {}", rec.serial_no)));
            }
        }
        Ok(())
    }
}

impl RecordStore for MemoryRecordStore {
    fn max_sn(&self) -> PersistResult<Sn> {
        Ok(self.records.keys().copied().max().unwrap_or(0))
    }

    fn reserve_counter_values(&mut self, n: u64) -> PersistResult<CounterValue> {
        if n == 0 {
            return Err(PersistError::Message("cannot reserve zero counter values".to_string()));
        }
        self.counter = self
            .counter
            .checked_add(n)
            .ok_or_else(|| PersistError::Message("unique-id counter exhausted".to_string()))?;
        Ok(self.counter - n + 1)
    }

    fn insert_batch(&mut self, records: &[SkidRecord]) -> PersistResult<()> {
        self.check_batch(records)?;
        for rec in records {
            self.by_serial.insert(rec.serial_no.clone(), rec.sn);
            self.by_date.entry(rec.date).or_default().push(rec.sn);
            self.order.push(rec.sn);
            self.records.insert(rec.sn, rec.clone());
        }
        Ok(())
    }

    fn find_by_serial(&self, serial_no: &str) -> PersistResult<Option<SkidRecord>> {
        Ok(self
            .by_serial
            .get(serial_no)
            .and_then(|sn| self.records.get(sn))
            .cloned())
    }

    fn set_status_done(&mut self, serial_no: &str) -> PersistResult<bool> {
        let Some(rec) = self
            .by_serial
            .get(serial_no)
            .and_then(|sn| self.records.get_mut(sn))
        else {
            return Ok(false);
        };
        if rec.status == SkidStatus::Done {
            return Ok(false);
        }
        rec.status = SkidStatus::Done;
        Ok(true)
    }

    fn query(&self, filter: &RecordFilter, order: SortOrder) -> PersistResult<Vec<SkidRecord>> {
        let mut out: Vec<SkidRecord> = self.candidates(filter).into_iter().cloned().collect();
        out.sort_by_key(|rec| (rec.date, rec.sn));
        if order == SortOrder::Descending {
            out.reverse();
        }
        Ok(out)
    }

    fn count(&self, filter: &RecordFilter, status: Option<SkidStatus>) -> PersistResult<u64> {
        let n = self
            .candidates(filter)
            .into_iter()
            .filter(|rec| status.is_none_or(|s| rec.status == s))
            .count();
        Ok(n as u64)
    }
}
