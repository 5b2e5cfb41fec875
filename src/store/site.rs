use std::collections::HashMap;

use chrono::Local;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait, EntityTrait as _, QueryFilter as _, QueryOrder as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    entity::{prelude::*, site},
    store::{amount, required, Page, StoreError},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewSite {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub hourly_rate: Decimal,
}

/// A new rate only applies to shifts scheduled afterwards
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

async fn ensure_name_free<C: ConnectionTrait>(db: &C, name: &str, except: Option<i32>) -> Result<(), StoreError> {
    let taken = Site::find()
        .filter(site::Column::Name.eq(name))
        .one(db).await?;

    match taken {
        Some(site) if Some(site.id) != except => Err(StoreError::invalid(format!("site `{name}` already exists"))),
        _ => Ok(()),
    }
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewSite) -> Result<site::Model, StoreError> {
    let name = required("name", &new.name)?;
    let hourly_rate = amount("hourly_rate", new.hourly_rate)?;
    ensure_name_free(db, &name, None).await?;

    let now = Local::now().fixed_offset();
    let model = site::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        name: Set(name),
        address: Set(new.address.trim().to_owned()),
        hourly_rate: Set(hourly_rate),
        ..Default::default()
    };

    let site = Site::insert(model)
        .exec_with_returning(db).await?;

    info!(site_id = site.id, name = %site.name, "site created");
    Ok(site)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<site::Model, StoreError> {
    Site::find_by_id(id).one(db).await?
        .ok_or(StoreError::NotFound { entity: "site", id })
}

pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: SiteChanges) -> Result<site::Model, StoreError> {
    let mut model: site::ActiveModel = get(db, id).await?.into();

    if let Some(name) = changes.name {
        let name = required("name", &name)?;
        ensure_name_free(db, &name, Some(id)).await?;
        model.name = Set(name);
    }
    if let Some(address) = changes.address {
        model.address = Set(address.trim().to_owned());
    }
    if let Some(hourly_rate) = changes.hourly_rate {
        model.hourly_rate = Set(amount("hourly_rate", hourly_rate)?);
    }
    model.updated_at = Set(Local::now().fixed_offset());

    Ok(model.update(db).await?)
}

pub async fn list<C: ConnectionTrait>(db: &C, page: u64, per_page: u64) -> Result<Page<site::Model>, StoreError> {
    let select = Site::find()
        .order_by_asc(site::Column::Name);

    Page::fetch(db, select, page, per_page).await
}

/// Site names by id, for grouping payroll sheets
pub async fn names<C: ConnectionTrait>(db: &C) -> Result<HashMap<i32, String>, StoreError> {
    let sites = Site::find().all(db).await?;

    Ok(sites.into_iter()
        .map(|site| (site.id, site.name))
        .collect())
}
