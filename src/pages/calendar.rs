use std::sync::Mutex;

use actix_web::{get, web, Responder};
use chrono::Datelike as _;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{page, Granted},
    pages::{lock_counts, MonthPath, PageError},
    payroll::{DayCountCache, MonthGrid},
    store,
    utils::YearMonth,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_month);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DayCount {
    day: u32,
    shifts: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CalendarMonth {
    month: YearMonth,
    weeks: Vec<[Option<DayCount>; 7]>,
}

/// Shift counts laid out as a Monday-first month grid
///
/// Switching to another month reloads the counts with one grouped query,
/// repeated if a shift was written while it ran.
#[get("/{year}/{month}")]
async fn get_month(db: web::Data<DatabaseConnection>, counts: web::Data<Mutex<DayCountCache>>, _user: Granted<page::Calendar>, path: web::Path<MonthPath>) -> Result<impl Responder, PageError> {
    let month = path.month()?;

    loop {
        let generation = {
            let cache = lock_counts(&counts);
            if cache.is_loaded(month) {
                break;
            }
            cache.generation()
        };

        // Shifts written while this query runs make the result stale
        let days = store::shift::count_by_day(db.get_ref(), month).await?;
        if lock_counts(&counts).try_rebuild(generation, month, days) {
            break;
        }
    }

    let grid = {
        let cache = lock_counts(&counts);
        MonthGrid::build(month, |date| DayCount {
            day: date.day(),
            shifts: cache.count(date).unwrap_or_default(),
        })
    };

    Ok(web::Json(CalendarMonth { month: grid.month, weeks: grid.weeks }))
}
