use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, field_id: web::Path<Uuid>) -> impl Responder {
    match delete_field(&req, &state, field_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.respond("delete field"),
    }
}

/// Stored content keeps the removed field's values; they are simply no
/// longer shown.
async fn delete_field(req: &HttpRequest, state: &AppState, field_id: Uuid) -> Result<(), AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.delete_field(&session.actor, field_id).await?;
    Ok(())
}
