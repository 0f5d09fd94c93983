use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::requests::CategoriesResponse;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match list_categories(&req, &state).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("list categories"),
    }
}

async fn list_categories(req: &HttpRequest, state: &AppState) -> Result<CategoriesResponse, AppError> {
    let session = Session::resolve(req, state).await?;
    let categories = session.store.list_categories().await?;
    Ok(CategoriesResponse { categories })
}
