//! Chronologically ordered match collection
//!
//! The engine only accepts a [`Dataset`], so the date ordering it depends on
//! holds by construction.

use chrono::NaiveDate;

use crate::models::MatchRecord;

/// Matches sorted by date (stable: same-day order is preserved)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<MatchRecord>,
}

impl Dataset {
    pub fn new(mut records: Vec<MatchRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last match dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date, self.records.last()?.date))
    }

    /// Split into (train, test)
    ///
    /// Train holds every match on or before `train_end`, test every match on
    /// or after `test_start`. Matches strictly between the two dates belong
    /// to neither side.
    pub fn split(&self, train_end: NaiveDate, test_start: NaiveDate) -> (Dataset, Dataset) {
        let train = self
            .records
            .iter()
            .filter(|r| r.date <= train_end)
            .cloned()
            .collect();
        let test = self
            .records
            .iter()
            .filter(|r| r.date >= test_start)
            .cloned()
            .collect();

        (Self { records: train }, Self { records: test })
    }
}

impl From<Vec<MatchRecord>> for Dataset {
    fn from(records: Vec<MatchRecord>) -> Self {
        Self::new(records)
    }
}
