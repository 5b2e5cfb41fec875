use super::*;

impl FromRequest for site::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(Ok(site_id)) = req.match_info().get("site_id").map(str::parse::<i32>) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `site_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not attached"))
            };

            Ok(store::site::get(db.get_ref(), site_id).await.map_err(PageError::from)?)
        })
    }
}
