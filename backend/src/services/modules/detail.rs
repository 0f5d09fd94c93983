use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::requests::ModuleDetail;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, module_id: web::Path<Uuid>) -> impl Responder {
    match module_detail(&req, &state, module_id.into_inner()).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(e) => e.respond("module detail"),
    }
}

async fn module_detail(req: &HttpRequest, state: &AppState, module_id: Uuid) -> Result<ModuleDetail, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.module_detail(&session.actor, module_id).await
}
