use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::model::permission::Permission;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<Permission>) -> impl Responder {
    match upsert_permission(&req, &state, payload.into_inner()).await {
        Ok(permission) => HttpResponse::Ok().json(permission),
        Err(e) => e.respond("upsert permission"),
    }
}

async fn upsert_permission(req: &HttpRequest, state: &AppState, permission: Permission) -> Result<Permission, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManagePermissions, None).await?;
    session.store.get_module(permission.module_id).await?;
    session.store.upsert_permission(&session.actor, permission).await
}
