use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{auth::{Authority, Page}, entity::{prelude::*, user}, pages::PageError};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(login)
        .service(whoami);
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    username: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WhoAmI {
    user: user::Model,
    pages: Vec<Page>,
}

#[post("/login")]
async fn login(db: web::Data<DatabaseConnection>, authority: web::Data<Authority>, credentials: web::Json<Login>) -> actix_web::Result<String> {
    let hashed_password = &Sha256::digest(format!("{}:{}", credentials.password, credentials.username))[..];

    let Some(user) = User::find()
        .filter(user::Column::Username.eq(&credentials.username))
        .filter(user::Column::Password.eq(hashed_password))
        .one(db.get_ref()).await.map_err(PageError::from)?
    else {
        info!(username = %credentials.username, "login rejected");
        return Err(actix_web::error::ErrorForbidden("invalid credentials"));
    };

    info!(user_id = user.id, role = ?user.role, "logged in");
    Ok(authority.issue_for(&user).map_err(PageError::from)?)
}

/// The signed-in user and the pages their role may open
#[get("")]
async fn whoami(user: user::Model) -> impl Responder {
    let pages = user.role.allowed_pages().to_vec();

    web::Json(WhoAmI { user, pages })
}
