use rust_decimal::Decimal;

use crate::utils::from_minor_units;

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct WithdrawalView {
    pub(super) id: i32,
    pub(super) employee_id: i32,
    pub(super) site_id: i32,
    pub(super) date: NaiveDate,
    pub(super) amount: Decimal,
    pub(super) comment: Option<String>,
}

impl From<cash_withdrawal::Model> for WithdrawalView {
    fn from(withdrawal: cash_withdrawal::Model) -> Self {
        Self {
            id: withdrawal.id,
            employee_id: withdrawal.employee_id,
            site_id: withdrawal.site_id,
            date: withdrawal.date,
            amount: from_minor_units(withdrawal.amount),
            comment: withdrawal.comment,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Day {
    pub(super) date: NaiveDate,
    pub(super) shifts: Vec<ShiftRecord>,
    pub(super) withdrawals: Vec<WithdrawalView>,
}
