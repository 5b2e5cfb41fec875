use std::{fmt, str::FromStr};

use chrono::{Datelike as _, Months, NaiveDate};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::consts::MONTH_NAMES;

/// A calendar month, stored as its first day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date - chrono::Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.0.month0() as usize]
    }

    pub fn days(&self) -> u32 {
        match self.month() {
            4 | 6 | 9 | 11 => 30,
            2 if NaiveDate::from_ymd_opt(self.year(), 2, 29).is_some() => 29,
            2 => 28,
            _ => 31,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0.with_day(self.days()).unwrap_or(self.0)
    }

    /// `None` when `day` is past the end of the month
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        self.0.with_day(day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.0.iter_days().take(self.days() as usize)
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    pub fn pred(&self) -> Option<Self> {
        self.0.checked_sub_months(Months::new(1)).map(Self)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses `YYYY-MM`
impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.split_once('-')
            .ok_or_else(|| format!("`{s}` is not in YYYY-MM format"))?;

        let year = year.parse().map_err(|_| format!("invalid year in `{s}`"))?;
        let month = month.parse().map_err(|_| format!("invalid month in `{s}`"))?;

        Self::new(year, month).ok_or_else(|| format!("`{s}` is not a valid month"))
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(de::Error::custom)
    }
}

/// Money is persisted in minor units (cents)
pub fn from_minor_units(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// `None` when the amount has sub-cent digits or does not fit
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount.round_dp(2) != amount {
        return None;
    }

    (amount * Decimal::ONE_HUNDRED).to_i64()
}

/// Rescale to exactly two decimal places
pub fn money(amount: Decimal) -> Decimal {
    let mut amount = amount;
    amount.rescale(2);
    amount
}
