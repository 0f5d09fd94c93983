use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::approval::group_pending;
use common::authz::Action;
use common::requests::PendingResponse;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match pending(&req, &state).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("pending approvals"),
    }
}

async fn pending(req: &HttpRequest, state: &AppState) -> Result<PendingResponse, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::Approve, None).await?;
    let records = session.store.list_pending(&session.actor).await?;
    Ok(PendingResponse {
        items: group_pending(records),
    })
}
