//! Shift based payroll: monthly totals, calendar day counts and the
//! per-site sheets that get exported to spreadsheets.
//!
//! Nothing in here touches the database; callers fetch records through
//! [`crate::store`] and hand them over.

pub mod aggregate;
pub mod calendar;
pub mod sheet;
pub mod xlsx;

pub use aggregate::{aggregate, aggregate_across_sites, aggregate_by_employee, MonthlyAggregate, ShiftRecord};
pub use calendar::{DayCountCache, MonthGrid};
pub use sheet::{build_sheets, DayCell, Payee, PayrollTable, WithdrawalRecord};
pub use xlsx::{ExportError, SheetWriter};
