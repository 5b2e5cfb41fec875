use super::*;

impl FromRequest for employee::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(employee_id) = req.match_info().get("employee_id") else {
                return Err(actix_web::error::ErrorInternalServerError("route has no `employee_id`"))
            };
            let Ok(employee_id) = employee_id.parse::<i32>() else {
                return Err(actix_web::error::ErrorBadRequest("invalid `employee_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not attached"))
            };

            let employee = store::employee::get(db.get_ref(), employee_id).await
                .map_err(PageError::from)?;

            Ok(employee)
        })
    }
}
