//! Database access for the directory, shifts and cash withdrawals.
//!
//! Every function takes a connection so single statements and
//! transactions go through the same code.

use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::to_minor_units;

pub mod employee;
pub mod shift;
pub mod site;
pub mod withdrawal;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
}

impl StoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// One page of a listing, `page` counts from 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<M> Page<M> {
    pub async fn fetch<'db, C, E>(db: &'db C, select: Select<E>, page: u64, per_page: u64) -> Result<Self, StoreError>
    where
        C: ConnectionTrait,
        E: EntityTrait<Model = M>,
        M: FromQueryResult + Sized + Send + Sync + 'db,
    {
        let page = page.max(1);
        let paginator = select.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page - 1).await?;

        Ok(Self { data, page, per_page, total })
    }

    pub fn map<T>(self, f: impl FnMut(M) -> T) -> Page<T> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Non-negative amount with at most two decimals, in minor units
pub(crate) fn amount(field: &str, value: Decimal) -> Result<i64, StoreError> {
    if value < Decimal::ZERO {
        return Err(StoreError::invalid(format!("`{field}` cannot be negative")));
    }

    to_minor_units(value)
        .ok_or_else(|| StoreError::invalid(format!("`{field}` must have at most two decimal places")))
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::invalid(format!("`{field}` is required")));
    }

    Ok(value.to_owned())
}

/// Blank text is stored as NULL
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
