use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    consts::SHEET_DAYS,
    entity::sea_orm_active_enums::PaymentMethod,
    payroll::aggregate::{aggregate, ShiftRecord},
    utils::{money, YearMonth},
};

const ABSENT_MARK: &str = "A";
const FOOTER_LABEL: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalRecord {
    pub id: i32,
    pub employee_id: i32,
    pub site_id: i32,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// What the sheet needs to know about an employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub name: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCell {
    Blank,
    Hours(i64),
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRow {
    /// `None` on the footer
    pub employee_id: Option<i32>,
    pub employee_name: String,
    pub days: Vec<DayCell>,
    pub total_hours: i64,
    pub gross_pay: Decimal,
    pub hourly_rate: Option<Decimal>,
    pub bonus_total: Decimal,
    pub to_card: Decimal,
    pub cash_withdrawal: Decimal,
    pub deductions: Decimal,
    pub in_hand: Decimal,
    pub net_payable: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTable {
    pub site_name: String,
    pub month: YearMonth,
    pub rows: Vec<PayrollRow>,
    pub footer: PayrollRow,
}

/// Spreadsheet cell, independent of any file format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Money(Decimal),
}

impl PayrollRow {
    fn for_employee(employee_id: i32, payee: &Payee, month: YearMonth, shifts: &[&ShiftRecord], withdrawals: Decimal) -> Self {
        let total = aggregate(shifts.iter().copied());

        let mut days = vec![DayCell::Blank; SHEET_DAYS];
        for shift in shifts {
            if !month.contains(shift.date) {
                continue;
            }

            let cell = &mut days[shift.date.day0() as usize];
            *cell = match (*cell, shift.is_absent) {
                (DayCell::Hours(hours), false) => DayCell::Hours(hours + i64::from(shift.hours)),
                (DayCell::Hours(hours), true) => DayCell::Hours(hours),
                (_, false) => DayCell::Hours(i64::from(shift.hours)),
                (_, true) => DayCell::Absent,
            };
        }

        // Rates are snapshotted per shift; the sheet shows the latest one
        let hourly_rate = shifts.iter()
            .max_by_key(|shift| (shift.date, shift.id))
            .map(|shift| money(shift.hourly_rate));

        let (to_card, in_hand) = match payee.payment_method {
            PaymentMethod::ToCard => (total.net_pay, money(Decimal::ZERO)),
            PaymentMethod::InHand => (money(Decimal::ZERO), total.net_pay),
        };

        Self {
            employee_id: Some(employee_id),
            employee_name: payee.name.clone(),
            days,
            total_hours: total.total_hours,
            gross_pay: total.gross_pay,
            hourly_rate,
            bonus_total: total.bonus_total,
            to_card,
            cash_withdrawal: money(withdrawals),
            deductions: total.deduction_total,
            in_hand,
            net_payable: total.net_pay,
        }
    }

    /// Column sums; the rate column has no meaningful sum and stays blank
    fn footer(rows: &[PayrollRow]) -> Self {
        let days = (0..SHEET_DAYS)
            .map(|day| {
                let mut hours = None;
                for row in rows {
                    if let DayCell::Hours(worked) = row.days[day] {
                        hours = Some(hours.unwrap_or(0) + worked);
                    }
                }
                hours.map_or(DayCell::Blank, DayCell::Hours)
            })
            .collect();

        let sum = |field: fn(&PayrollRow) -> Decimal| money(rows.iter().map(field).sum());

        Self {
            employee_id: None,
            employee_name: FOOTER_LABEL.to_owned(),
            days,
            total_hours: rows.iter().map(|row| row.total_hours).sum(),
            gross_pay: sum(|row| row.gross_pay),
            hourly_rate: None,
            bonus_total: sum(|row| row.bonus_total),
            to_card: sum(|row| row.to_card),
            cash_withdrawal: sum(|row| row.cash_withdrawal),
            deductions: sum(|row| row.deductions),
            in_hand: sum(|row| row.in_hand),
            net_payable: sum(|row| row.net_payable),
        }
    }

    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(1 + SHEET_DAYS + 9);
        cells.push(Cell::Text(self.employee_name.clone()));

        cells.extend(self.days.iter().map(|day| match day {
            DayCell::Blank => Cell::Empty,
            DayCell::Hours(hours) => Cell::Integer(*hours),
            DayCell::Absent => Cell::Text(ABSENT_MARK.to_owned()),
        }));

        cells.push(Cell::Integer(self.total_hours));
        cells.push(Cell::Money(self.gross_pay));
        cells.push(self.hourly_rate.map_or(Cell::Empty, Cell::Money));
        cells.push(Cell::Money(self.bonus_total));
        cells.push(Cell::Money(self.to_card));
        cells.push(Cell::Money(self.cash_withdrawal));
        cells.push(Cell::Money(self.deductions));
        cells.push(Cell::Money(self.in_hand));
        cells.push(Cell::Money(self.net_payable));

        cells
    }
}

impl PayrollTable {
    pub fn header() -> Vec<String> {
        let mut header = vec!["Employee".to_owned()];
        header.extend((1..=SHEET_DAYS).map(|day| day.to_string()));
        header.extend([
            "Hours",
            "Gross pay",
            "Hourly rate",
            "Bonus",
            "To card",
            "Cash withdrawal",
            "Deductions",
            "In hand",
            "Net payable",
        ].map(str::to_owned));

        header
    }

    /// Header, one line per employee, then the footer
    pub fn grid(&self) -> Vec<Vec<Cell>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 2);
        grid.push(Self::header().into_iter().map(Cell::Text).collect());
        grid.extend(self.rows.iter().map(PayrollRow::cells));
        grid.push(self.footer.cells());

        grid
    }
}

#[derive(Default)]
struct SiteEntry<'a> {
    shifts: Vec<&'a ShiftRecord>,
    withdrawals: Decimal,
}

/// One table per site for `month`
///
/// An employee gets a row on a site as soon as they have a shift or a cash
/// withdrawal there. Tables are ordered by site name, rows by employee name.
pub fn build_sheets(
    month: YearMonth,
    shifts: &[ShiftRecord],
    withdrawals: &[WithdrawalRecord],
    payees: &HashMap<i32, Payee>,
    sites: &HashMap<i32, String>,
) -> Vec<PayrollTable> {
    let site_name = |site_id: i32| sites.get(&site_id)
        .cloned()
        .unwrap_or_else(|| format!("#{site_id}"));

    let mut grouped = BTreeMap::<String, BTreeMap<i32, SiteEntry>>::new();

    for shift in shifts.iter().filter(|shift| month.contains(shift.date)) {
        grouped.entry(site_name(shift.site_id))
            .or_default()
            .entry(shift.employee_id)
            .or_default()
            .shifts
            .push(shift);
    }

    for withdrawal in withdrawals.iter().filter(|withdrawal| month.contains(withdrawal.date)) {
        grouped.entry(site_name(withdrawal.site_id))
            .or_default()
            .entry(withdrawal.employee_id)
            .or_default()
            .withdrawals += withdrawal.amount;
    }

    grouped.into_iter()
        .map(|(site_name, entries)| {
            let mut rows: Vec<_> = entries.into_iter()
                .map(|(employee_id, entry)| {
                    let payee = payees.get(&employee_id).cloned().unwrap_or_else(|| Payee {
                        name: format!("#{employee_id}"),
                        payment_method: PaymentMethod::InHand,
                    });

                    PayrollRow::for_employee(employee_id, &payee, month, &entry.shifts, entry.withdrawals)
                })
                .collect();

            rows.sort_by(|a, b| a.employee_name.cmp(&b.employee_name).then(a.employee_id.cmp(&b.employee_id)));
            let footer = PayrollRow::footer(&rows);

            PayrollTable { site_name, month, rows, footer }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    use crate::payroll::aggregate::{aggregate_across_sites, tests::record};

    fn july() -> YearMonth {
        YearMonth::new(2025, 7).unwrap()
    }

    fn payees(method: PaymentMethod) -> HashMap<i32, Payee> {
        HashMap::from([
            (1, Payee { name: "Ivanov".to_owned(), payment_method: method }),
            (2, Payee { name: "Abramov".to_owned(), payment_method: PaymentMethod::ToCard }),
        ])
    }

    fn sites() -> HashMap<i32, String> {
        HashMap::from([(10, "Warehouse".to_owned()), (20, "Bank".to_owned())])
    }

    #[test]
    fn test_one_table_per_site() {
        let shifts = vec![
            record(1, 10, 5, 12, dec!(200)),
            record(1, 20, 6, 24, dec!(150)),
        ];

        let tables = build_sheets(july(), &shifts, &[], &payees(PaymentMethod::ToCard), &sites());

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].site_name, "Bank");
        assert_eq!(tables[1].site_name, "Warehouse");

        let bank = &tables[0].rows;
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].employee_id, Some(1));
        assert_eq!(bank[0].days[5], DayCell::Hours(24));
        assert_eq!(bank[0].days.iter().filter(|day| **day != DayCell::Blank).count(), 1);
        assert_eq!(bank[0].gross_pay, dec!(3600));

        let warehouse = &tables[1].rows;
        assert_eq!(warehouse.len(), 1);
        assert_eq!(warehouse[0].days[4], DayCell::Hours(12));
        assert_eq!(warehouse[0].days.iter().filter(|day| **day != DayCell::Blank).count(), 1);
        assert_eq!(warehouse[0].hourly_rate, Some(dec!(200)));
    }

    #[test]
    fn test_payment_method_routing() {
        let shifts = vec![ShiftRecord { bonus: dec!(500), ..record(1, 10, 1, 12, dec!(200)) }];

        let in_hand = build_sheets(july(), &shifts, &[], &payees(PaymentMethod::InHand), &sites());
        let row = &in_hand[0].rows[0];
        assert_eq!(row.in_hand, dec!(2900));
        assert_eq!(row.to_card, dec!(0));
        assert_eq!(row.net_payable, dec!(2900));

        let to_card = build_sheets(july(), &shifts, &[], &payees(PaymentMethod::ToCard), &sites());
        let row = &to_card[0].rows[0];
        assert_eq!(row.to_card, dec!(2900));
        assert_eq!(row.in_hand, dec!(0));
    }

    #[test]
    fn test_withdrawals_stay_out_of_net() {
        let shifts = vec![record(1, 10, 1, 8, dec!(100))];
        let withdrawals = vec![
            WithdrawalRecord { id: 1, employee_id: 1, site_id: 10, date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(), amount: dec!(300) },
            // only a withdrawal on this site is enough for a row
            WithdrawalRecord { id: 2, employee_id: 2, site_id: 10, date: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(), amount: dec!(50.50) },
        ];

        let tables = build_sheets(july(), &shifts, &withdrawals, &payees(PaymentMethod::InHand), &sites());
        let rows = &tables[0].rows;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee_name, "Abramov");
        assert_eq!(rows[0].cash_withdrawal, dec!(50.50));
        assert_eq!(rows[0].net_payable, dec!(0));
        assert_eq!(rows[0].hourly_rate, None);

        assert_eq!(rows[1].cash_withdrawal, dec!(300));
        assert_eq!(rows[1].net_payable, dec!(800));
        assert_eq!(rows[1].in_hand, dec!(800));
    }

    #[test]
    fn test_absent_days_and_clamp() {
        let shifts = vec![
            ShiftRecord { is_absent: true, bonus: dec!(1000), deduction: dec!(300), ..record(1, 10, 7, 12, dec!(200)) },
        ];

        let tables = build_sheets(july(), &shifts, &[], &payees(PaymentMethod::InHand), &sites());
        let row = &tables[0].rows[0];

        assert_eq!(row.days[6], DayCell::Absent);
        assert_eq!(row.bonus_total, dec!(0));
        assert_eq!(row.deductions, dec!(300));
        assert_eq!(row.in_hand, dec!(0));
        assert_eq!(row.net_payable, dec!(0));
        assert_eq!(tables[0].footer.days[6], DayCell::Blank);
    }

    #[test]
    fn test_sheets_pay_what_statistics_show() {
        let shifts = vec![
            ShiftRecord { deduction: dec!(2000), ..record(1, 10, 1, 8, dec!(100)) },
            record(1, 20, 2, 10, dec!(100)),
        ];

        let tables = build_sheets(july(), &shifts, &[], &payees(PaymentMethod::ToCard), &sites());
        let paid: Decimal = tables.iter()
            .flat_map(|table| &table.rows)
            .map(|row| row.net_payable)
            .sum();

        assert_eq!(paid, dec!(1000));
        assert_eq!(aggregate_across_sites(&shifts).net_pay, paid);
    }

    #[test]
    fn test_footer_sums_columns() {
        let shifts = vec![
            record(1, 10, 1, 12, dec!(100)),
            record(2, 10, 1, 8, dec!(100)),
            ShiftRecord { bonus: dec!(10.25), ..record(2, 10, 2, 8, dec!(120)) },
        ];
        let withdrawals = vec![
            WithdrawalRecord { id: 1, employee_id: 1, site_id: 10, date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(), amount: dec!(100) },
        ];

        let tables = build_sheets(july(), &shifts, &withdrawals, &payees(PaymentMethod::InHand), &sites());
        let footer = &tables[0].footer;

        assert_eq!(footer.employee_id, None);
        assert_eq!(footer.days[0], DayCell::Hours(20));
        assert_eq!(footer.days[1], DayCell::Hours(8));
        assert_eq!(footer.days[2], DayCell::Blank);
        assert_eq!(footer.total_hours, 28);
        assert_eq!(footer.gross_pay, dec!(2960));
        assert_eq!(footer.bonus_total, dec!(10.25));
        assert_eq!(footer.to_card, dec!(1770.25));
        assert_eq!(footer.in_hand, dec!(1200));
        assert_eq!(footer.net_payable, dec!(2970.25));
        assert_eq!(footer.cash_withdrawal, dec!(100));
        assert_eq!(footer.hourly_rate, None);
    }

    #[test]
    fn test_short_month_days_stay_blank() {
        let june = YearMonth::new(2025, 6).unwrap();
        let shifts = vec![ShiftRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            ..record(1, 10, 1, 12, dec!(100))
        }];

        let tables = build_sheets(june, &shifts, &[], &payees(PaymentMethod::InHand), &sites());
        let grid = tables[0].grid();

        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].len(), PayrollTable::header().len());
        assert_eq!(grid[1].len(), grid[0].len());
        assert_eq!(grid[1][30], Cell::Integer(12));
        assert_eq!(grid[1][31], Cell::Empty);
        assert_eq!(grid[2][0], Cell::Text("Total".to_owned()));
    }
}
