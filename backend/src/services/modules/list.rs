use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::model::module::Module;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match list_modules(&req, &state).await {
        Ok(modules) => HttpResponse::Ok().json(modules),
        Err(e) => e.respond("list modules"),
    }
}

async fn list_modules(req: &HttpRequest, state: &AppState) -> Result<Vec<Module>, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.list_modules(&session.actor).await
}
