use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, module_id: web::Path<Uuid>) -> impl Responder {
    match disable_module(&req, &state, module_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.respond("disable module"),
    }
}

async fn disable_module(req: &HttpRequest, state: &AppState, module_id: Uuid) -> Result<(), AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.disable_module(&session.actor, module_id).await
}
