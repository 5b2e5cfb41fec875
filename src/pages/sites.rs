use actix_web::{dev, get, post, put, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{page, Admin, Granted},
    entity::site,
    pages::{ListQuery, MonthPath, PageError},
    payroll::{aggregate_by_employee, MonthlyAggregate},
    store::{self, site::{NewSite, SiteChanges}},
    utils::YearMonth,
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(list_sites)
        .service(create_site)
        .service(get_site)
        .service(update_site)
        .service(get_statistics);
}

#[get("")]
async fn list_sites(db: web::Data<DatabaseConnection>, _user: Granted<page::Sites>, list: web::Query<ListQuery>) -> Result<impl Responder, PageError> {
    let sites = store::site::list(db.get_ref(), list.page(), list.per_page()).await?;

    Ok(web::Json(sites.map(SiteView::from)))
}

#[post("")]
async fn create_site(db: web::Data<DatabaseConnection>, _admin: Admin, payload: web::Json<NewSite>) -> Result<impl Responder, PageError> {
    let site = store::site::create(db.get_ref(), payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(SiteView::from(site)))
}

#[get("/{site_id}")]
async fn get_site(_user: Granted<page::Sites>, site: site::Model) -> impl Responder {
    web::Json(SiteView::from(site))
}

#[put("/{site_id}")]
async fn update_site(db: web::Data<DatabaseConnection>, _admin: Admin, site: site::Model, payload: web::Json<SiteChanges>) -> Result<impl Responder, PageError> {
    let site = store::site::update(db.get_ref(), site.id, payload.into_inner()).await?;

    Ok(web::Json(SiteView::from(site)))
}

/// Per-employee totals at one site, plus their sum
#[get("/{site_id}/statistics/{year}/{month}")]
async fn get_statistics(db: web::Data<DatabaseConnection>, _user: Granted<page::Sites>, site: site::Model, path: web::Path<MonthPath>) -> Result<impl Responder, PageError> {
    let month = path.month()?;
    let shifts = store::shift::for_site_month(db.get_ref(), site.id, month).await?;

    let employees: Vec<_> = aggregate_by_employee(&shifts)
        .into_iter()
        .map(|(employee_id, totals)| EmployeeTotals { employee_id, totals })
        .collect();
    let total = employees.iter().map(|employee| employee.totals.clone()).sum();

    Ok(web::Json(SiteStatistics { site_id: site.id, month, employees, total }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::{
        auth::{tests::bearer, Authority},
        entity::sea_orm_active_enums::RoleType,
        store::{employee::tests::guard, shift::{NewShift, ShiftEdit}, site::tests::site, tests::test_db},
    };

    use super::*;

    #[actix_web::test]
    async fn test_site_editing_is_admin_only() {
        let secret = b"secret";
        let db = test_db().await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db))
                .service(web::scope("/sites").configure(config))
        ).await;

        let req = test::TestRequest::post()
            .uri("/sites")
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .set_json(site("Harbour", dec!(120)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/sites")
            .insert_header(("Authorization", bearer(secret, RoleType::Admin)))
            .set_json(site("Harbour", dec!(120)))
            .to_request();
        let created: SiteView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.hourly_rate, dec!(120));

        let req = test::TestRequest::post()
            .uri("/sites")
            .insert_header(("Authorization", bearer(secret, RoleType::Admin)))
            .set_json(site("Harbour", dec!(130)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/sites/{}", created.id))
            .insert_header(("Authorization", bearer(secret, RoleType::Accountant)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_site_statistics_sum_clamped_totals() {
        let secret = b"secret";
        let db = test_db().await;

        let first = store::employee::create(&db, guard("Belov")).await.unwrap();
        let second = store::employee::create(&db, guard("Chernov")).await.unwrap();
        let site = store::site::create(&db, site("Mall", dec!(100))).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap();

        store::shift::schedule(&db, NewShift { employee_id: first.id, site_id: site.id, date, hours: 10 }).await.unwrap();
        let shift = store::shift::schedule(&db, NewShift { employee_id: second.id, site_id: site.id, date, hours: 5 }).await.unwrap();
        store::shift::edit(&db, shift.id, ShiftEdit { deduction: Some(dec!(900)), ..Default::default() }).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db))
                .service(web::scope("/sites").configure(config))
        ).await;

        let req = test::TestRequest::get()
            .uri(&format!("/sites/{}/statistics/2025/7", site.id))
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .to_request();
        let statistics: SiteStatistics = test::call_and_read_body_json(&app, req).await;

        assert_eq!(statistics.employees.len(), 2);
        assert_eq!(statistics.employees[1].totals.net_pay, dec!(0));
        assert_eq!(statistics.total.total_hours, 15);
        assert_eq!(statistics.total.net_pay, dec!(1000));
    }
}
