use std::collections::HashMap;

use chrono::{Datelike as _, NaiveDate};
use serde::Serialize;
use tracing::{debug, trace};

use crate::utils::YearMonth;

/// Shift counts per day for the month currently on screen
///
/// Filled from one grouped query instead of one query per calendar cell.
/// The owner keeps it in step with writes: single adds and deletes inside
/// the loaded month adjust it in place, anything else must call
/// [`DayCountCache::invalidate`] and rebuild.
///
/// Every change bumps a generation number. A reload whose query ran without
/// holding the cache goes through [`DayCountCache::try_rebuild`].
#[derive(Debug, Default)]
pub struct DayCountCache {
    month: Option<YearMonth>,
    counts: HashMap<NaiveDate, u32>,
    generation: u64,
}

impl DayCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn month(&self) -> Option<YearMonth> {
        self.month
    }

    pub fn is_loaded(&self, month: YearMonth) -> bool {
        self.month == Some(month)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// [`DayCountCache::rebuild`] unless anything changed since `generation` was read
    ///
    /// Returns `false` when the counts are stale and must be queried again.
    pub fn try_rebuild(&mut self, generation: u64, month: YearMonth, counts: impl IntoIterator<Item = (NaiveDate, u32)>) -> bool {
        if self.generation != generation {
            debug!(%month, expected = generation, actual = self.generation, "day counts changed while loading");
            return false;
        }

        self.rebuild(month, counts);
        true
    }

    /// Replace everything with the result of the grouped count query
    pub fn rebuild(&mut self, month: YearMonth, counts: impl IntoIterator<Item = (NaiveDate, u32)>) {
        self.counts.clear();

        for (date, count) in counts {
            if !month.contains(date) {
                debug!(%date, %month, "ignoring day count outside of the month");
                continue;
            }

            if count > 0 {
                *self.counts.entry(date).or_default() += count;
            }
        }

        self.month = Some(month);
        self.generation += 1;
        trace!(%month, days = self.counts.len(), "day count cache rebuilt");
    }

    /// `None` when `date` is not in the loaded month
    pub fn count(&self, date: NaiveDate) -> Option<u32> {
        let month = self.month?;
        if !month.contains(date) {
            return None;
        }

        Some(self.counts.get(&date).copied().unwrap_or(0))
    }

    /// Every day of the loaded month with its count
    pub fn days(&self) -> Option<Vec<(NaiveDate, u32)>> {
        let month = self.month?;

        Some(month.dates()
            .map(|date| (date, self.counts.get(&date).copied().unwrap_or(0)))
            .collect())
    }

    pub fn record_added(&mut self, date: NaiveDate) {
        self.generation += 1;
        if self.month.is_some_and(|month| month.contains(date)) {
            *self.counts.entry(date).or_default() += 1;
        }
    }

    pub fn record_removed(&mut self, date: NaiveDate) {
        self.generation += 1;
        if !self.month.is_some_and(|month| month.contains(date)) {
            return;
        }

        if let Some(count) = self.counts.get_mut(&date) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&date);
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.month = None;
        self.counts.clear();
    }
}

/// A month laid out in Monday-first weeks
///
/// Slots before the 1st and after the last day are `None`; every other slot
/// holds whatever `cell` produced for that date.
#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid<T> {
    pub month: YearMonth,
    pub weeks: Vec<[Option<T>; 7]>,
}

impl<T> MonthGrid<T> {
    pub fn build(month: YearMonth, mut cell: impl FnMut(NaiveDate) -> T) -> Self {
        let mut weeks = Vec::new();
        let mut week: [Option<T>; 7] = Default::default();
        let mut slot = month.first_day().weekday().num_days_from_monday() as usize;

        for date in month.dates() {
            week[slot] = Some(cell(date));
            slot += 1;

            if slot == week.len() {
                weeks.push(std::mem::take(&mut week));
                slot = 0;
            }
        }

        if slot > 0 {
            weeks.push(week);
        }

        Self { month, weeks }
    }
}
