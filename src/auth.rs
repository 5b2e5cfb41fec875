use std::{marker::PhantomData, ops::Deref};

use actix_web::{body, dev, http::{self, header::ContentType, StatusCode}, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Local};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{consts::TOKEN_LIFETIME_WEEKS, entity::{sea_orm_active_enums::RoleType, user}};

/// Signs and checks the bearer tokens handed out on login
pub struct Authority {
    jwt_key: (EncodingKey, DecodingKey),
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: (EncodingKey::from_secret(jwt_key), DecodingKey::from_secret(jwt_key))
        }
    }

    /// Issue a token for specified user with 1 week of expiration time
    pub fn issue_for(&self, user: &user::Model) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (Local::now() + Duration::weeks(TOKEN_LIFETIME_WEEKS)).timestamp(),
            data: user
        };

        Ok(encode(&Header::default(), &claims, &self.jwt_key.0)?)
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<user::Model, AuthError> {
        let payload = decode::<Claims<user::Model>>(token.as_ref(), &self.jwt_key.1, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authority error")]
    AuthorityError(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::error::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AuthError::AuthorityError(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Screens of the local front end, each gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Employees,
    Sites,
    Shifts,
    Calendar,
    Payroll,
}

impl RoleType {
    pub fn allowed_pages(&self) -> &'static [Page] {
        match self {
            RoleType::Admin => &[Page::Employees, Page::Sites, Page::Shifts, Page::Calendar, Page::Payroll],
            RoleType::Operator => &[Page::Employees, Page::Sites, Page::Shifts, Page::Calendar],
            RoleType::Accountant => &[Page::Employees, Page::Calendar, Page::Payroll],
        }
    }

    pub fn can_open(&self, page: Page) -> bool {
        self.allowed_pages().contains(&page)
    }
}

/// Type-level handle on a [`Page`], used by [`Granted`]
pub trait PageMarker: 'static {
    const PAGE: Page;
}

pub mod page {
    use super::{Page, PageMarker};

    pub struct Employees;
    pub struct Sites;
    pub struct Shifts;
    pub struct Calendar;
    pub struct Payroll;

    impl PageMarker for Employees { const PAGE: Page = Page::Employees; }
    impl PageMarker for Sites { const PAGE: Page = Page::Sites; }
    impl PageMarker for Shifts { const PAGE: Page = Page::Shifts; }
    impl PageMarker for Calendar { const PAGE: Page = Page::Calendar; }
    impl PageMarker for Payroll { const PAGE: Page = Page::Payroll; }
}

impl FromRequest for user::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Basically grabs the value after space ( ) from `Authorization` header
            // Example: JWT sometoken
            //              ^ grabs this value
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(" "))
                )
            else {
                return Err(actix_web::error::ErrorUnauthorized("unauthorized"))
            };

            let Some(authority) = req.app_data::<web::Data<Authority>>() else {
                return Err(actix_web::error::ErrorInternalServerError("authority is not attached"))
            };
            let user = authority.authorize(token)?;

            Ok(user)
        })
    }
}

pub struct Admin(pub user::Model);

impl Deref for Admin {
    type Target = user::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Admin {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let user = user::Model::from_request(&req, &mut dev::Payload::None).await?;

            if user.role != RoleType::Admin {
                return Err(actix_web::error::ErrorForbidden("forbidden"))
            }

            Ok(Self(user))
        })
    }
}

/// A user whose role may open page `P`
pub struct Granted<P: PageMarker>(pub user::Model, PhantomData<P>);

impl<P: PageMarker> Deref for Granted<P> {
    type Target = user::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: PageMarker> FromRequest for Granted<P> {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let user = user::Model::from_request(&req, &mut dev::Payload::None).await?;

            let page = P::PAGE;
            if !user.role.can_open(page) {
                debug!(user_id = user.id, ?page, "page denied");
                return Err(actix_web::error::ErrorForbidden("forbidden"))
            }

            Ok(Self(user, PhantomData))
        })
    }
}
