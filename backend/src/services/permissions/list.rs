use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::requests::PermissionsResponse;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, module_id: web::Path<Uuid>) -> impl Responder {
    match list_permissions(&req, &state, module_id.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("list permissions"),
    }
}

async fn list_permissions(req: &HttpRequest, state: &AppState, module_id: Uuid) -> Result<PermissionsResponse, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManagePermissions, None).await?;
    let permissions = session.store.list_permissions(module_id).await?;
    Ok(PermissionsResponse { permissions })
}
