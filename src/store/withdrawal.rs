use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, ColumnTrait as _, ConnectionTrait, EntityTrait as _, QueryFilter as _, QueryOrder as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    entity::{cash_withdrawal, prelude::*},
    payroll::WithdrawalRecord,
    store::{self, amount, optional_text, StoreError},
    utils::{from_minor_units, YearMonth},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewWithdrawal {
    pub employee_id: i32,
    pub site_id: i32,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub comment: Option<String>,
}

impl From<cash_withdrawal::Model> for WithdrawalRecord {
    fn from(withdrawal: cash_withdrawal::Model) -> Self {
        Self {
            id: withdrawal.id,
            employee_id: withdrawal.employee_id,
            site_id: withdrawal.site_id,
            date: withdrawal.date,
            amount: from_minor_units(withdrawal.amount),
        }
    }
}

pub async fn record<C: ConnectionTrait>(db: &C, new: NewWithdrawal) -> Result<cash_withdrawal::Model, StoreError> {
    let value = amount("amount", new.amount)?;
    if value == 0 {
        return Err(StoreError::invalid("`amount` must be positive"));
    }

    let employee = store::employee::get(db, new.employee_id).await?;
    let site = store::site::get(db, new.site_id).await?;

    let now = Local::now().fixed_offset();
    let model = cash_withdrawal::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        employee_id: Set(employee.id),
        site_id: Set(site.id),
        date: Set(new.date),
        amount: Set(value),
        comment: Set(optional_text(new.comment)),
        ..Default::default()
    };

    let withdrawal = CashWithdrawal::insert(model)
        .exec_with_returning(db).await?;

    info!(withdrawal_id = withdrawal.id, employee_id = employee.id, site_id = site.id, amount = %new.amount, "cash withdrawal recorded");
    Ok(withdrawal)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<cash_withdrawal::Model, StoreError> {
    CashWithdrawal::find_by_id(id).one(db).await?
        .ok_or(StoreError::NotFound { entity: "cash withdrawal", id })
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<cash_withdrawal::Model, StoreError> {
    let withdrawal = get(db, id).await?;
    CashWithdrawal::delete_by_id(id).exec(db).await?;

    info!(withdrawal_id = id, "cash withdrawal deleted");
    Ok(withdrawal)
}

pub async fn on_day<C: ConnectionTrait>(db: &C, date: NaiveDate) -> Result<Vec<cash_withdrawal::Model>, StoreError> {
    Ok(CashWithdrawal::find()
        .filter(cash_withdrawal::Column::Date.eq(date))
        .order_by_asc(cash_withdrawal::Column::Id)
        .all(db).await?)
}

pub async fn for_month<C: ConnectionTrait>(db: &C, month: YearMonth) -> Result<Vec<WithdrawalRecord>, StoreError> {
    let withdrawals = CashWithdrawal::find()
        .filter(cash_withdrawal::Column::Date.between(month.first_day(), month.last_day()))
        .order_by_asc(cash_withdrawal::Column::Date)
        .order_by_asc(cash_withdrawal::Column::Id)
        .all(db).await?;

    Ok(withdrawals.into_iter().map(WithdrawalRecord::from).collect())
}
