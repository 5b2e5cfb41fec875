use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait, DatabaseConnection, EntityTrait as _, QueryFilter as _, QueryOrder as _, QuerySelect as _, Select, TransactionTrait as _
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    consts::{MAX_SHIFT_HOURS, MIN_SHIFT_HOURS},
    entity::{employee, prelude::*, shift, site},
    payroll::ShiftRecord,
    store::{self, amount, optional_text, StoreError},
    utils::{from_minor_units, YearMonth},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewShift {
    pub employee_id: i32,
    pub site_id: i32,
    pub date: NaiveDate,
    pub hours: i32,
}

/// Same posting on several days, written all or nothing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewShifts {
    pub employee_id: i32,
    pub site_id: i32,
    pub dates: Vec<NaiveDate>,
    pub hours: i32,
}

/// After-the-fact changes; `None` keeps the stored value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShiftEdit {
    pub is_absent: Option<bool>,
    pub absent_comment: Option<String>,
    pub bonus: Option<Decimal>,
    pub bonus_comment: Option<String>,
    pub deduction: Option<Decimal>,
}

impl From<shift::Model> for ShiftRecord {
    fn from(shift: shift::Model) -> Self {
        Self {
            id: shift.id,
            employee_id: shift.employee_id,
            site_id: shift.site_id,
            date: shift.date,
            hours: shift.hours,
            hourly_rate: from_minor_units(shift.hourly_rate),
            is_absent: shift.is_absent,
            absent_comment: shift.absent_comment,
            bonus: from_minor_units(shift.bonus),
            bonus_comment: shift.bonus_comment,
            deduction: from_minor_units(shift.deduction),
        }
    }
}

fn validate_hours(hours: i32) -> Result<(), StoreError> {
    if !(MIN_SHIFT_HOURS..=MAX_SHIFT_HOURS).contains(&hours) {
        return Err(StoreError::invalid(format!("`hours` must be between {MIN_SHIFT_HOURS} and {MAX_SHIFT_HOURS}")));
    }

    Ok(())
}

/// Employee and site a new shift is posted to; terminated staff cannot be scheduled
async fn posting<C: ConnectionTrait>(db: &C, employee_id: i32, site_id: i32) -> Result<(employee::Model, site::Model), StoreError> {
    let employee = store::employee::get(db, employee_id).await?;
    if !employee.is_active() {
        return Err(StoreError::invalid(format!("employee {employee_id} is terminated")));
    }

    let site = store::site::get(db, site_id).await?;

    Ok((employee, site))
}

async fn insert<C: ConnectionTrait>(db: &C, employee: &employee::Model, site: &site::Model, date: NaiveDate, hours: i32) -> Result<shift::Model, StoreError> {
    let now = Local::now().fixed_offset();

    let model = shift::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        employee_id: Set(employee.id),
        site_id: Set(site.id),
        date: Set(date),
        hours: Set(hours),
        hourly_rate: Set(site.hourly_rate),
        is_absent: Set(false),
        absent_comment: Set(None),
        bonus: Set(0),
        bonus_comment: Set(None),
        deduction: Set(0),
        ..Default::default()
    };

    Ok(Shift::insert(model).exec_with_returning(db).await?)
}

/// Schedule one shift at the site's current rate
pub async fn schedule<C: ConnectionTrait>(db: &C, new: NewShift) -> Result<shift::Model, StoreError> {
    validate_hours(new.hours)?;
    let (employee, site) = posting(db, new.employee_id, new.site_id).await?;

    let shift = insert(db, &employee, &site, new.date, new.hours).await?;
    info!(shift_id = shift.id, employee_id = employee.id, site_id = site.id, date = %shift.date, "shift scheduled");

    Ok(shift)
}

pub async fn schedule_many(db: &DatabaseConnection, new: NewShifts) -> Result<Vec<shift::Model>, StoreError> {
    validate_hours(new.hours)?;
    let dates: BTreeSet<_> = new.dates.into_iter().collect();
    if dates.is_empty() {
        return Err(StoreError::invalid("`dates` must not be empty"));
    }

    let txn = db.begin().await?;
    let (employee, site) = posting(&txn, new.employee_id, new.site_id).await?;

    let mut shifts = Vec::with_capacity(dates.len());
    for date in dates {
        shifts.push(insert(&txn, &employee, &site, date, new.hours).await?);
    }
    txn.commit().await?;

    info!(employee_id = employee.id, site_id = site.id, count = shifts.len(), "shifts scheduled");
    Ok(shifts)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<shift::Model, StoreError> {
    Shift::find_by_id(id).one(db).await?
        .ok_or(StoreError::NotFound { entity: "shift", id })
}

/// Absence, bonus and deduction edits
///
/// Leaving the absent state drops the absence comment.
pub async fn edit<C: ConnectionTrait>(db: &C, id: i32, edit: ShiftEdit) -> Result<shift::Model, StoreError> {
    let shift = get(db, id).await?;
    let is_absent = edit.is_absent.unwrap_or(shift.is_absent);
    let absent_comment = match edit.absent_comment {
        Some(comment) => optional_text(Some(comment)),
        None => shift.absent_comment.clone(),
    };

    let mut model: shift::ActiveModel = shift.into();
    model.is_absent = Set(is_absent);
    model.absent_comment = Set(absent_comment.filter(|_| is_absent));

    if let Some(bonus) = edit.bonus {
        model.bonus = Set(amount("bonus", bonus)?);
    }
    if let Some(comment) = edit.bonus_comment {
        model.bonus_comment = Set(optional_text(Some(comment)));
    }
    if let Some(deduction) = edit.deduction {
        model.deduction = Set(amount("deduction", deduction)?);
    }
    model.updated_at = Set(Local::now().fixed_offset());

    let shift = model.update(db).await?;
    debug!(shift_id = id, is_absent, "shift edited");

    Ok(shift)
}

/// Removes the row for good and hands it back
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<shift::Model, StoreError> {
    let shift = get(db, id).await?;
    Shift::delete_by_id(id).exec(db).await?;

    info!(shift_id = id, date = %shift.date, "shift deleted");
    Ok(shift)
}

fn in_month(month: YearMonth) -> Select<Shift> {
    Shift::find()
        .filter(shift::Column::Date.between(month.first_day(), month.last_day()))
        .order_by_asc(shift::Column::Date)
        .order_by_asc(shift::Column::Id)
}

async fn records<C: ConnectionTrait>(db: &C, select: Select<Shift>) -> Result<Vec<ShiftRecord>, StoreError> {
    let shifts = select.all(db).await?;

    Ok(shifts.into_iter().map(ShiftRecord::from).collect())
}

pub async fn for_employee_month<C: ConnectionTrait>(db: &C, employee_id: i32, month: YearMonth) -> Result<Vec<ShiftRecord>, StoreError> {
    records(db, in_month(month).filter(shift::Column::EmployeeId.eq(employee_id))).await
}

pub async fn for_site_month<C: ConnectionTrait>(db: &C, site_id: i32, month: YearMonth) -> Result<Vec<ShiftRecord>, StoreError> {
    records(db, in_month(month).filter(shift::Column::SiteId.eq(site_id))).await
}

pub async fn for_month<C: ConnectionTrait>(db: &C, month: YearMonth) -> Result<Vec<ShiftRecord>, StoreError> {
    records(db, in_month(month)).await
}

pub async fn on_day<C: ConnectionTrait>(db: &C, date: NaiveDate) -> Result<Vec<shift::Model>, StoreError> {
    Ok(Shift::find()
        .filter(shift::Column::Date.eq(date))
        .order_by_asc(shift::Column::Id)
        .all(db).await?)
}

/// Number of shifts per day of `month`, days without shifts are left out
pub async fn count_by_day<C: ConnectionTrait>(db: &C, month: YearMonth) -> Result<Vec<(NaiveDate, u32)>, StoreError> {
    let rows: Vec<(NaiveDate, i64)> = Shift::find()
        .select_only()
        .column(shift::Column::Date)
        .column_as(Expr::col(shift::Column::Id).count(), "count")
        .filter(shift::Column::Date.between(month.first_day(), month.last_day()))
        .group_by(shift::Column::Date)
        .into_tuple()
        .all(db).await?;

    Ok(rows.into_iter()
        .map(|(date, count)| (date, u32::try_from(count).unwrap_or(u32::MAX)))
        .collect())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        payroll::{aggregate, DayCountCache},
        store::{employee::tests::guard, site::tests::site, tests::test_db},
    };

    fn july(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    async fn posted(db: &DatabaseConnection) -> (employee::Model, site::Model) {
        let employee = store::employee::create(db, guard("Kozlov")).await.unwrap();
        let site = store::site::create(db, site("Bank", dec!(200))).await.unwrap();

        (employee, site)
    }

    #[actix_web::test]
    async fn test_rate_is_snapshotted() {
        let db = test_db().await;
        let (employee, site) = posted(&db).await;

        let first = schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(1), hours: 12 }).await.unwrap();
        store::site::update(&db, site.id, store::site::SiteChanges { hourly_rate: Some(dec!(250)), ..Default::default() }).await.unwrap();
        let second = schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(2), hours: 12 }).await.unwrap();

        assert_eq!(get(&db, first.id).await.unwrap().hourly_rate, 20_000);
        assert_eq!(second.hourly_rate, 25_000);

        let month = YearMonth::new(2025, 7).unwrap();
        let total = aggregate(&for_employee_month(&db, employee.id, month).await.unwrap());
        assert_eq!(total.gross_pay, dec!(5400.00));
    }

    #[actix_web::test]
    async fn test_schedule_validation() {
        let db = test_db().await;
        let (employee, site) = posted(&db).await;

        let zero_hours = schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(1), hours: 0 }).await;
        assert!(matches!(zero_hours, Err(StoreError::Validation(_))));

        let no_site = schedule(&db, NewShift { employee_id: employee.id, site_id: 999, date: july(1), hours: 8 }).await;
        assert!(matches!(no_site, Err(StoreError::NotFound { entity: "site", .. })));

        store::employee::terminate(&db, employee.id, july(1), None).await.unwrap();
        let terminated = schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(2), hours: 8 }).await;
        assert!(matches!(terminated, Err(StoreError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_edit_absence_and_bonus() {
        let db = test_db().await;
        let (employee, site) = posted(&db).await;
        let shift = schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(3), hours: 12 }).await.unwrap();

        let shift = edit(&db, shift.id, ShiftEdit {
            is_absent: Some(true),
            absent_comment: Some("no show".to_owned()),
            bonus: Some(dec!(1000)),
            deduction: Some(dec!(300)),
            ..Default::default()
        }).await.unwrap();
        assert!(shift.is_absent);
        assert_eq!(shift.absent_comment.as_deref(), Some("no show"));
        assert_eq!(shift.bonus, 100_000);

        let month = YearMonth::new(2025, 7).unwrap();
        let total = aggregate(&for_employee_month(&db, employee.id, month).await.unwrap());
        assert_eq!(total.total_hours, 0);
        assert_eq!(total.bonus_total, dec!(0));
        assert_eq!(total.deduction_total, dec!(300));
        assert_eq!(total.net_pay, dec!(0));

        let shift = edit(&db, shift.id, ShiftEdit { is_absent: Some(false), ..Default::default() }).await.unwrap();
        assert_eq!(shift.absent_comment, None);

        let negative = edit(&db, shift.id, ShiftEdit { deduction: Some(dec!(-5)), ..Default::default() }).await;
        assert!(matches!(negative, Err(StoreError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_schedule_many_is_atomic() {
        let db = test_db().await;
        let (employee, site) = posted(&db).await;

        let shifts = schedule_many(&db, NewShifts {
            employee_id: employee.id,
            site_id: site.id,
            dates: vec![july(5), july(4), july(5)],
            hours: 24,
        }).await.unwrap();
        assert_eq!(shifts.iter().map(|shift| shift.date).collect::<Vec<_>>(), [july(4), july(5)]);

        let failed = schedule_many(&db, NewShifts { employee_id: employee.id, site_id: 999, dates: vec![july(6)], hours: 24 }).await;
        assert!(failed.is_err());

        let month = YearMonth::new(2025, 7).unwrap();
        assert_eq!(for_month(&db, month).await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_day_counts_match_rows() {
        let db = test_db().await;
        let (employee, site) = posted(&db).await;
        let other = store::employee::create(&db, guard("Lebedev")).await.unwrap();

        for _ in 0..3 {
            schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(10), hours: 8 }).await.unwrap();
        }
        schedule(&db, NewShift { employee_id: other.id, site_id: site.id, date: july(10), hours: 8 }).await.unwrap();
        let removed = schedule(&db, NewShift { employee_id: other.id, site_id: site.id, date: july(31), hours: 8 }).await.unwrap();
        schedule(&db, NewShift { employee_id: other.id, site_id: site.id, date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), hours: 8 }).await.unwrap();

        let month = YearMonth::new(2025, 7).unwrap();
        let mut cache = DayCountCache::new();
        cache.rebuild(month, count_by_day(&db, month).await.unwrap());

        assert_eq!(cache.count(july(10)), Some(4));
        assert_eq!(cache.count(july(31)), Some(1));
        assert_eq!(cache.count(july(11)), Some(0));

        delete(&db, removed.id).await.unwrap();
        cache.record_removed(removed.date);
        assert_eq!(cache.count(july(31)), Some(0));

        let mut rebuilt = DayCountCache::new();
        rebuilt.rebuild(month, count_by_day(&db, month).await.unwrap());
        assert_eq!(rebuilt.days(), cache.days());

        assert_eq!(on_day(&db, july(10)).await.unwrap().len(), 4);
        assert!(matches!(delete(&db, removed.id).await, Err(StoreError::NotFound { .. })));
    }
}
