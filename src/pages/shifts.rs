use std::sync::Mutex;

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    auth::{page, Granted},
    entity::cash_withdrawal,
    pages::{lock_counts, PageError},
    payroll::{DayCountCache, ShiftRecord},
    store::{self, shift::{NewShift, NewShifts, ShiftEdit}, withdrawal::NewWithdrawal},
};

use model::*;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_day)
        .service(schedule_shift)
        .service(schedule_shifts)
        .service(record_withdrawal)
        .service(delete_withdrawal)
        .service(get_shift)
        .service(edit_shift)
        .service(delete_shift);
}

/// Everything booked on one date
#[get("/day/{date}")]
async fn get_day(db: web::Data<DatabaseConnection>, _user: Granted<page::Shifts>, date: web::Path<NaiveDate>) -> Result<impl Responder, PageError> {
    let date = date.into_inner();
    let shifts = store::shift::on_day(db.get_ref(), date).await?;
    let withdrawals = store::withdrawal::on_day(db.get_ref(), date).await?;

    Ok(web::Json(Day {
        date,
        shifts: shifts.into_iter().map(ShiftRecord::from).collect(),
        withdrawals: withdrawals.into_iter().map(WithdrawalView::from).collect(),
    }))
}

#[post("")]
async fn schedule_shift(db: web::Data<DatabaseConnection>, counts: web::Data<Mutex<DayCountCache>>, _user: Granted<page::Shifts>, payload: web::Json<NewShift>) -> Result<impl Responder, PageError> {
    let shift = store::shift::schedule(db.get_ref(), payload.into_inner()).await?;
    lock_counts(&counts).record_added(shift.date);

    Ok(HttpResponse::Created().json(ShiftRecord::from(shift)))
}

#[post("/bulk")]
async fn schedule_shifts(db: web::Data<DatabaseConnection>, counts: web::Data<Mutex<DayCountCache>>, _user: Granted<page::Shifts>, payload: web::Json<NewShifts>) -> Result<impl Responder, PageError> {
    let shifts = store::shift::schedule_many(db.get_ref(), payload.into_inner()).await?;
    lock_counts(&counts).invalidate();
    debug!(count = shifts.len(), "day counts invalidated after bulk scheduling");

    let shifts: Vec<_> = shifts.into_iter().map(ShiftRecord::from).collect();
    Ok(HttpResponse::Created().json(shifts))
}

#[get("/{shift_id:\\d+}")]
async fn get_shift(db: web::Data<DatabaseConnection>, _user: Granted<page::Shifts>, shift_id: web::Path<i32>) -> Result<impl Responder, PageError> {
    let shift = store::shift::get(db.get_ref(), shift_id.into_inner()).await?;

    Ok(web::Json(ShiftRecord::from(shift)))
}

#[put("/{shift_id:\\d+}")]
async fn edit_shift(db: web::Data<DatabaseConnection>, _user: Granted<page::Shifts>, shift_id: web::Path<i32>, payload: web::Json<ShiftEdit>) -> Result<impl Responder, PageError> {
    let shift = store::shift::edit(db.get_ref(), shift_id.into_inner(), payload.into_inner()).await?;

    Ok(web::Json(ShiftRecord::from(shift)))
}

#[delete("/{shift_id:\\d+}")]
async fn delete_shift(db: web::Data<DatabaseConnection>, counts: web::Data<Mutex<DayCountCache>>, _user: Granted<page::Shifts>, shift_id: web::Path<i32>) -> Result<impl Responder, PageError> {
    let shift = store::shift::delete(db.get_ref(), shift_id.into_inner()).await?;
    lock_counts(&counts).record_removed(shift.date);

    Ok(HttpResponse::NoContent().finish())
}

#[post("/withdrawals")]
async fn record_withdrawal(db: web::Data<DatabaseConnection>, _user: Granted<page::Shifts>, payload: web::Json<NewWithdrawal>) -> Result<impl Responder, PageError> {
    let withdrawal = store::withdrawal::record(db.get_ref(), payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(WithdrawalView::from(withdrawal)))
}

#[delete("/withdrawals/{withdrawal_id}")]
async fn delete_withdrawal(db: web::Data<DatabaseConnection>, _user: Granted<page::Shifts>, withdrawal_id: web::Path<i32>) -> Result<impl Responder, PageError> {
    store::withdrawal::delete(db.get_ref(), withdrawal_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use rust_decimal_macros::dec;

    use crate::{
        auth::{tests::bearer, Authority},
        entity::sea_orm_active_enums::RoleType,
        store::{employee::tests::guard, site::tests::site, tests::test_db},
        utils::YearMonth,
    };

    use super::*;

    fn july(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    #[actix_web::test]
    async fn test_shift_writes_keep_counts_in_step() {
        let secret = b"secret";
        let db = test_db().await;
        let employee = store::employee::create(&db, guard("Gusev")).await.unwrap();
        let site = store::site::create(&db, site("Plant", dec!(90))).await.unwrap();

        let month = YearMonth::new(2025, 7).unwrap();
        let mut cache = DayCountCache::new();
        cache.rebuild(month, std::iter::empty());
        let counts = web::Data::new(Mutex::new(cache));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db))
                .app_data(counts.clone())
                .service(web::scope("/shifts").configure(config))
        ).await;

        let req = test::TestRequest::post()
            .uri("/shifts")
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .set_json(NewShift { employee_id: employee.id, site_id: site.id, date: july(9), hours: 24 })
            .to_request();
        let shift: ShiftRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(shift.hourly_rate, dec!(90));
        assert_eq!(lock_counts(&counts).count(july(9)), Some(1));

        let req = test::TestRequest::put()
            .uri(&format!("/shifts/{}", shift.id))
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .set_json(ShiftEdit { bonus: Some(dec!(250)), ..Default::default() })
            .to_request();
        let edited: ShiftRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(edited.bonus, dec!(250));

        let req = test::TestRequest::delete()
            .uri(&format!("/shifts/{}", shift.id))
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(lock_counts(&counts).count(july(9)), Some(0));

        let req = test::TestRequest::delete()
            .uri(&format!("/shifts/{}", shift.id))
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/shifts/bulk")
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .set_json(NewShifts { employee_id: employee.id, site_id: site.id, dates: vec![july(1), july(2)], hours: 12 })
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(!lock_counts(&counts).is_loaded(month));
    }

    #[actix_web::test]
    async fn test_day_listing() {
        let secret = b"secret";
        let db = test_db().await;
        let employee = store::employee::create(&db, guard("Frolov")).await.unwrap();
        let site = store::site::create(&db, site("Bridge", dec!(100))).await.unwrap();

        store::shift::schedule(&db, NewShift { employee_id: employee.id, site_id: site.id, date: july(20), hours: 8 }).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(Mutex::new(DayCountCache::new())))
                .service(web::scope("/shifts").configure(config))
        ).await;

        let req = test::TestRequest::post()
            .uri("/shifts/withdrawals")
            .insert_header(("Authorization", bearer(secret, RoleType::Admin)))
            .set_json(NewWithdrawal { employee_id: employee.id, site_id: site.id, date: july(20), amount: dec!(300), comment: None })
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/shifts/day/2025-07-20")
            .insert_header(("Authorization", bearer(secret, RoleType::Operator)))
            .to_request();
        let day: Day = test::call_and_read_body_json(&app, req).await;
        assert_eq!(day.shifts.len(), 1);
        assert_eq!(day.withdrawals[0].amount, dec!(300));

        let req = test::TestRequest::get()
            .uri("/shifts/day/2025-07-20")
            .insert_header(("Authorization", bearer(secret, RoleType::Accountant)))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
