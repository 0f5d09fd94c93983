use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, category_id: web::Path<Uuid>) -> impl Responder {
    match delete_category(&req, &state, category_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.respond("delete category"),
    }
}

async fn delete_category(req: &HttpRequest, state: &AppState, category_id: Uuid) -> Result<(), AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.delete_category(&session.actor, category_id).await
}
