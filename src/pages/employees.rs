use actix_web::{dev, get, post, put, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDate;
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{page, Admin, Granted},
    entity::employee,
    pages::{ListQuery, MonthPath, PageError},
    payroll::{aggregate_across_sites, MonthlyAggregate},
    store::{self, employee::{EmployeeChanges, EmployeeFilter, NewEmployee}},
    utils::YearMonth,
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(list_employees)
        .service(create_employee)
        .service(get_employee)
        .service(update_employee)
        .service(terminate_employee)
        .service(restore_employee)
        .service(get_statistics);
}

#[get("")]
async fn list_employees(db: web::Data<DatabaseConnection>, _user: Granted<page::Employees>, list: web::Query<ListQuery>, filter: web::Query<EmployeeFilter>) -> Result<impl Responder, PageError> {
    let employees = store::employee::list(db.get_ref(), filter.into_inner(), list.page(), list.per_page()).await?;

    Ok(web::Json(employees.map(EmployeeView::from)))
}

#[post("")]
async fn create_employee(db: web::Data<DatabaseConnection>, _user: Granted<page::Employees>, payload: web::Json<NewEmployee>) -> Result<impl Responder, PageError> {
    let employee = store::employee::create(db.get_ref(), payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(EmployeeView::from(employee)))
}

#[get("/{employee_id}")]
async fn get_employee(_user: Granted<page::Employees>, employee: employee::Model) -> impl Responder {
    web::Json(EmployeeView::from(employee))
}

#[put("/{employee_id}")]
async fn update_employee(db: web::Data<DatabaseConnection>, _user: Granted<page::Employees>, employee: employee::Model, payload: web::Json<EmployeeChanges>) -> Result<impl Responder, PageError> {
    let employee = store::employee::update(db.get_ref(), employee.id, payload.into_inner()).await?;

    Ok(web::Json(EmployeeView::from(employee)))
}

#[post("/{employee_id}/terminate")]
async fn terminate_employee(db: web::Data<DatabaseConnection>, _admin: Admin, employee: employee::Model, payload: web::Json<Termination>) -> Result<impl Responder, PageError> {
    let Termination { date, reason } = payload.into_inner();
    let employee = store::employee::terminate(db.get_ref(), employee.id, date, reason).await?;

    Ok(web::Json(EmployeeView::from(employee)))
}

#[post("/{employee_id}/restore")]
async fn restore_employee(db: web::Data<DatabaseConnection>, _admin: Admin, employee: employee::Model) -> Result<impl Responder, PageError> {
    let employee = store::employee::restore(db.get_ref(), employee.id).await?;

    Ok(web::Json(EmployeeView::from(employee)))
}

/// Monthly totals of one employee, summed over the sites they worked at
#[get("/{employee_id}/statistics/{year}/{month}")]
async fn get_statistics(db: web::Data<DatabaseConnection>, _user: Granted<page::Employees>, employee: employee::Model, path: web::Path<MonthPath>) -> Result<impl Responder, PageError> {
    let month = path.month()?;
    let shifts = store::shift::for_employee_month(db.get_ref(), employee.id, month).await?;

    Ok(web::Json(EmployeeStatistics {
        employee_id: employee.id,
        month,
        shifts: shifts.len(),
        totals: aggregate_across_sites(&shifts),
    }))
}
