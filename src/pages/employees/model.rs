use rust_decimal::Decimal;

use crate::{entity::sea_orm_active_enums::{EmployeeKind, PaymentMethod}, utils::from_minor_units};

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct EmployeeView {
    pub(super) id: i32,
    pub(super) kind: EmployeeKind,
    pub(super) full_name: String,
    pub(super) birth_date: Option<NaiveDate>,
    pub(super) position: Option<String>,
    pub(super) salary: Decimal,
    pub(super) payment_method: PaymentMethod,
    pub(super) active: bool,
    pub(super) terminated_at: Option<NaiveDate>,
    pub(super) termination_reason: Option<String>,
}

impl From<employee::Model> for EmployeeView {
    fn from(employee: employee::Model) -> Self {
        Self {
            id: employee.id,
            active: employee.is_active(),
            kind: employee.kind,
            full_name: employee.full_name,
            birth_date: employee.birth_date,
            position: employee.position,
            salary: from_minor_units(employee.salary),
            payment_method: employee.payment_method,
            terminated_at: employee.terminated_at,
            termination_reason: employee.termination_reason,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Termination {
    pub(super) date: NaiveDate,
    pub(super) reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct EmployeeStatistics {
    pub(super) employee_id: i32,
    pub(super) month: YearMonth,
    pub(super) shifts: usize,
    pub(super) totals: MonthlyAggregate,
}
