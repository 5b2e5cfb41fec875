use std::sync::{Mutex, MutexGuard, PoisonError};

use actix_web::{body, http::{header::ContentType, StatusCode}, web, HttpResponse, ResponseError};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::{
    auth::AuthError,
    consts::{DEFAULT_PER_PAGE, MAX_PER_PAGE},
    payroll::{DayCountCache, ExportError},
    store::StoreError,
    utils::YearMonth,
};

mod auth;
mod calendar;
mod employees;
mod payroll;
mod shifts;
mod sites;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/employees")
            .configure(employees::config))
        .service(web::scope("/sites")
            .configure(sites::config))
        .service(web::scope("/shifts")
            .configure(shifts::config))
        .service(web::scope("/calendar")
            .configure(calendar::config))
        .service(web::scope("/payroll")
            .configure(payroll::config));
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Blocking(#[from] actix_web::error::BlockingError),
    #[error("invalid month {year}-{month}")]
    Month { year: i32, month: u32 },
}

impl From<sea_orm::DbErr> for PageError {
    fn from(err: sea_orm::DbErr) -> Self {
        PageError::Store(err.into())
    }
}

impl ResponseError for PageError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        let status = self.status_code();

        let body = if status.is_server_error() {
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status)
            .insert_header(ContentType::plaintext())
            .body(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PageError::Store(StoreError::Validation(_)) | PageError::Month { .. } => StatusCode::BAD_REQUEST,
            PageError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PageError::Store(StoreError::Database(_)) | PageError::Export(_) | PageError::Auth(_) | PageError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `?page=&per_page=` of every listing
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct ListQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

impl ListQuery {
    pub(crate) fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub(crate) fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

/// `/{year}/{month}` path segments
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct MonthPath {
    year: i32,
    month: u32,
}

impl MonthPath {
    pub(crate) fn month(&self) -> Result<YearMonth, PageError> {
        YearMonth::new(self.year, self.month)
            .ok_or(PageError::Month { year: self.year, month: self.month })
    }
}

/// Lock the shared day counts, ignoring poisoning
pub(crate) fn lock_counts(cache: &Mutex<DayCountCache>) -> MutexGuard<'_, DayCountCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}
