use actix_web::{get, post, web, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{page, Granted},
    pages::{MonthPath, PageError},
    payroll::{build_sheets, PayrollTable, SheetWriter},
    store,
    utils::YearMonth,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_tables)
        .service(export_tables);
}

#[derive(Debug, Serialize, Deserialize)]
struct Export {
    month: YearMonth,
    files: Vec<String>,
}

async fn tables(db: &DatabaseConnection, month: YearMonth) -> Result<Vec<PayrollTable>, PageError> {
    let shifts = store::shift::for_month(db, month).await?;
    let withdrawals = store::withdrawal::for_month(db, month).await?;
    let payees = store::employee::payees(db).await?;
    let sites = store::site::names(db).await?;

    Ok(build_sheets(month, &shifts, &withdrawals, &payees, &sites))
}

#[get("/{year}/{month}")]
async fn get_tables(db: web::Data<DatabaseConnection>, _user: Granted<page::Payroll>, path: web::Path<MonthPath>) -> Result<impl Responder, PageError> {
    let month = path.month()?;

    Ok(web::Json(tables(db.get_ref(), month).await?))
}

/// One workbook per site into the export directory
#[post("/{year}/{month}/export")]
async fn export_tables(db: web::Data<DatabaseConnection>, writer: web::Data<SheetWriter>, _user: Granted<page::Payroll>, path: web::Path<MonthPath>) -> Result<impl Responder, PageError> {
    let month = path.month()?;
    let tables = tables(db.get_ref(), month).await?;

    let writer = writer.into_inner();
    let paths = web::block(move || writer.write_all(&tables)).await??;

    Ok(web::Json(Export {
        month,
        files: paths.iter().map(|path| path.display().to_string()).collect(),
    }))
}
