use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait, EntityTrait as _, QueryFilter as _, QueryOrder as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    entity::{employee, prelude::*, sea_orm_active_enums::{EmployeeKind, PaymentMethod}},
    payroll::Payee,
    store::{amount, optional_text, required, Page, StoreError},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewEmployee {
    pub kind: EmployeeKind,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<String>,
    #[serde(default)]
    pub salary: Decimal,
    pub payment_method: PaymentMethod,
}

/// Fields left as `None` keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmployeeChanges {
    pub kind: Option<EmployeeKind>,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct EmployeeFilter {
    pub kind: Option<EmployeeKind>,
    pub active: Option<bool>,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewEmployee) -> Result<employee::Model, StoreError> {
    let full_name = required("full_name", &new.full_name)?;
    let salary = amount("salary", new.salary)?;
    let now = Local::now().fixed_offset();

    let model = employee::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        kind: Set(new.kind),
        full_name: Set(full_name),
        birth_date: Set(new.birth_date),
        position: Set(optional_text(new.position)),
        salary: Set(salary),
        payment_method: Set(new.payment_method),
        terminated_at: Set(None),
        termination_reason: Set(None),
        ..Default::default()
    };

    let employee = Employee::insert(model)
        .exec_with_returning(db).await?;

    info!(employee_id = employee.id, kind = ?employee.kind, "employee created");
    Ok(employee)
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<employee::Model>, StoreError> {
    Ok(Employee::find_by_id(id).one(db).await?)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<employee::Model, StoreError> {
    find(db, id).await?
        .ok_or(StoreError::NotFound { entity: "employee", id })
}

pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: EmployeeChanges) -> Result<employee::Model, StoreError> {
    let mut model: employee::ActiveModel = get(db, id).await?.into();

    if let Some(kind) = changes.kind {
        model.kind = Set(kind);
    }
    if let Some(full_name) = changes.full_name {
        model.full_name = Set(required("full_name", &full_name)?);
    }
    if let Some(birth_date) = changes.birth_date {
        model.birth_date = Set(Some(birth_date));
    }
    if let Some(position) = changes.position {
        model.position = Set(optional_text(Some(position)));
    }
    if let Some(salary) = changes.salary {
        model.salary = Set(amount("salary", salary)?);
    }
    if let Some(payment_method) = changes.payment_method {
        model.payment_method = Set(payment_method);
    }
    model.updated_at = Set(Local::now().fixed_offset());

    Ok(model.update(db).await?)
}

pub async fn list<C: ConnectionTrait>(db: &C, filter: EmployeeFilter, page: u64, per_page: u64) -> Result<Page<employee::Model>, StoreError> {
    let mut select = Employee::find()
        .order_by_asc(employee::Column::FullName)
        .order_by_asc(employee::Column::Id);

    if let Some(kind) = filter.kind {
        select = select.filter(employee::Column::Kind.eq(kind));
    }

    select = match filter.active {
        Some(true) => select.filter(employee::Column::TerminatedAt.is_null()),
        Some(false) => select.filter(employee::Column::TerminatedAt.is_not_null()),
        None => select,
    };

    Page::fetch(db, select, page, per_page).await
}

/// Active -> terminated, keeping only the latest termination
pub async fn terminate<C: ConnectionTrait>(db: &C, id: i32, date: NaiveDate, reason: Option<String>) -> Result<employee::Model, StoreError> {
    let employee = get(db, id).await?;
    if !employee.is_active() {
        return Err(StoreError::invalid(format!("employee {id} is already terminated")));
    }

    let mut model: employee::ActiveModel = employee.into();
    model.terminated_at = Set(Some(date));
    model.termination_reason = Set(optional_text(reason));
    model.updated_at = Set(Local::now().fixed_offset());

    let employee = model.update(db).await?;
    info!(employee_id = id, %date, "employee terminated");

    Ok(employee)
}

pub async fn restore<C: ConnectionTrait>(db: &C, id: i32) -> Result<employee::Model, StoreError> {
    let employee = get(db, id).await?;
    if employee.is_active() {
        return Err(StoreError::invalid(format!("employee {id} is not terminated")));
    }

    let mut model: employee::ActiveModel = employee.into();
    model.terminated_at = Set(None);
    model.termination_reason = Set(None);
    model.updated_at = Set(Local::now().fixed_offset());

    let employee = model.update(db).await?;
    info!(employee_id = id, "employee restored");

    Ok(employee)
}

/// Name and payment method of every employee, for payroll sheets
pub async fn payees<C: ConnectionTrait>(db: &C) -> Result<HashMap<i32, Payee>, StoreError> {
    let employees = Employee::find().all(db).await?;

    Ok(employees.into_iter()
        .map(|employee| (employee.id, Payee {
            name: employee.full_name,
            payment_method: employee.payment_method,
        }))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::store::tests::test_db;

    pub(crate) fn guard(name: &str) -> NewEmployee {
        NewEmployee {
            kind: EmployeeKind::Guard,
            full_name: name.to_owned(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2),
            position: Some("guard".to_owned()),
            salary: dec!(0),
            payment_method: PaymentMethod::ToCard,
        }
    }

    #[actix_web::test]
    async fn test_create_and_update() {
        let db = test_db().await;

        let employee = create(&db, guard(" Sidorov ")).await.unwrap();
        assert_eq!(employee.full_name, "Sidorov");
        assert!(employee.is_active());

        let employee = update(&db, employee.id, EmployeeChanges {
            kind: Some(EmployeeKind::Chief),
            payment_method: Some(PaymentMethod::InHand),
            salary: Some(dec!(1500.50)),
            ..Default::default()
        }).await.unwrap();

        assert_eq!(employee.kind, EmployeeKind::Chief);
        assert_eq!(employee.payment_method, PaymentMethod::InHand);
        assert_eq!(employee.salary, 150_050);
        assert_eq!(employee.full_name, "Sidorov");
    }

    #[actix_web::test]
    async fn test_rejects_blank_name() {
        let db = test_db().await;

        let result = create(&db, guard("  ")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let result = get(&db, 42).await;
        assert!(matches!(result, Err(StoreError::NotFound { entity: "employee", id: 42 })));
    }

    #[actix_web::test]
    async fn test_terminate_and_restore() {
        let db = test_db().await;
        let employee = create(&db, guard("Orlov")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();

        let terminated = terminate(&db, employee.id, date, Some(" own wish ".to_owned())).await.unwrap();
        assert_eq!(terminated.terminated_at, Some(date));
        assert_eq!(terminated.termination_reason.as_deref(), Some("own wish"));
        assert!(!terminated.is_active());

        let again = terminate(&db, employee.id, date, None).await;
        assert!(matches!(again, Err(StoreError::Validation(_))));

        let restored = restore(&db, employee.id).await.unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.termination_reason, None);

        let again = restore(&db, employee.id).await;
        assert!(matches!(again, Err(StoreError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let first = create(&db, guard("Belov")).await.unwrap();
        create(&db, guard("Antonov")).await.unwrap();
        create(&db, NewEmployee { kind: EmployeeKind::Office, ..guard("Vasina") }).await.unwrap();
        terminate(&db, first.id, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None).await.unwrap();

        let all = list(&db, EmployeeFilter::default(), 1, 10).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.data[0].full_name, "Antonov");

        let guards = list(&db, EmployeeFilter { kind: Some(EmployeeKind::Guard), active: Some(true) }, 1, 10).await.unwrap();
        assert_eq!(guards.total, 1);
        assert_eq!(guards.data[0].full_name, "Antonov");

        let terminated = list(&db, EmployeeFilter { kind: None, active: Some(false) }, 1, 10).await.unwrap();
        assert_eq!(terminated.data.len(), 1);
        assert_eq!(terminated.data[0].id, first.id);

        let second_page = list(&db, EmployeeFilter::default(), 2, 2).await.unwrap();
        assert_eq!(second_page.data.len(), 1);
        assert_eq!(second_page.page, 2);
    }
}
