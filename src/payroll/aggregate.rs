use std::{
    collections::BTreeMap,
    iter::Sum,
    ops::Add,
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::money;

/// One employee posted to one site for one day
///
/// The rate is whatever the site charged when the shift was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub id: i32,
    pub employee_id: i32,
    pub site_id: i32,
    pub date: NaiveDate,
    pub hours: i32,
    pub hourly_rate: Decimal,
    pub is_absent: bool,
    pub absent_comment: Option<String>,
    pub bonus: Decimal,
    pub bonus_comment: Option<String>,
    pub deduction: Decimal,
}

impl ShiftRecord {
    /// Hours that count towards pay
    pub fn worked_hours(&self) -> i32 {
        if self.is_absent { 0 } else { self.hours }
    }

    pub fn gross_pay(&self) -> Decimal {
        Decimal::from(self.worked_hours()) * self.hourly_rate
    }

    /// Absence voids the bonus whatever is stored
    pub fn effective_bonus(&self) -> Decimal {
        if self.is_absent { Decimal::ZERO } else { self.bonus }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub total_hours: i64,
    pub gross_pay: Decimal,
    pub bonus_total: Decimal,
    pub deduction_total: Decimal,
    pub net_pay: Decimal,
}

impl Default for MonthlyAggregate {
    fn default() -> Self {
        Self {
            total_hours: 0,
            gross_pay: money(Decimal::ZERO),
            bonus_total: money(Decimal::ZERO),
            deduction_total: money(Decimal::ZERO),
            net_pay: money(Decimal::ZERO),
        }
    }
}

/// Adds already clamped totals, so a sum of aggregates never goes negative
impl Add for MonthlyAggregate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            total_hours: self.total_hours + rhs.total_hours,
            gross_pay: money(self.gross_pay + rhs.gross_pay),
            bonus_total: money(self.bonus_total + rhs.bonus_total),
            deduction_total: money(self.deduction_total + rhs.deduction_total),
            net_pay: money(self.net_pay + rhs.net_pay),
        }
    }
}

impl Sum for MonthlyAggregate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Totals for a set of shifts already narrowed down to one employee and month
///
/// Absent shifts only contribute their deduction. Net pay is floored at zero.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a ShiftRecord>) -> MonthlyAggregate {
    let mut total_hours = 0i64;
    let mut gross_pay = Decimal::ZERO;
    let mut bonus_total = Decimal::ZERO;
    let mut deduction_total = Decimal::ZERO;

    for record in records {
        deduction_total += record.deduction;

        if record.is_absent {
            continue;
        }

        total_hours += i64::from(record.hours);
        gross_pay += record.gross_pay();
        bonus_total += record.bonus;
    }

    let net_pay = (gross_pay + bonus_total - deduction_total).max(Decimal::ZERO);

    MonthlyAggregate {
        total_hours,
        gross_pay: money(gross_pay),
        bonus_total: money(bonus_total),
        deduction_total: money(deduction_total),
        net_pay: money(net_pay),
    }
}

/// One aggregate per employee found in `records`, ordered by employee id
pub fn aggregate_by_employee<'a>(records: impl IntoIterator<Item = &'a ShiftRecord>) -> BTreeMap<i32, MonthlyAggregate> {
    let mut grouped = BTreeMap::<i32, Vec<&ShiftRecord>>::new();
    for record in records {
        grouped.entry(record.employee_id).or_default().push(record);
    }

    grouped.into_iter()
        .map(|(employee_id, records)| (employee_id, aggregate(records)))
        .collect()
}

/// One employee's month over every site they worked at
///
/// Each site is floored at zero on its own, matching the per-site rows of
/// the payroll sheets, then the site totals are added up.
pub fn aggregate_across_sites<'a>(records: impl IntoIterator<Item = &'a ShiftRecord>) -> MonthlyAggregate {
    let mut grouped = BTreeMap::<i32, Vec<&ShiftRecord>>::new();
    for record in records {
        grouped.entry(record.site_id).or_default().push(record);
    }

    grouped.into_values()
        .map(aggregate)
        .sum()
}
