use actix_web::{web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, master_id: web::Path<Uuid>) -> impl Responder {
    match delete_record(&req, &state, master_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.respond("delete record"),
    }
}

async fn delete_record(req: &HttpRequest, state: &AppState, master_id: Uuid) -> Result<(), AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.delete_master(&session.actor, master_id).await
}
