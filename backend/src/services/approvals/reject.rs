use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::approval::{BulkOutcome, ReviewDecision};
use common::requests::RejectRequest;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;
use crate::workflow::approval::review;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<RejectRequest>) -> impl Responder {
    match reject(&req, &state, payload.into_inner()).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => e.respond("reject"),
    }
}

async fn reject(req: &HttpRequest, state: &AppState, request: RejectRequest) -> Result<BulkOutcome, AppError> {
    let session = Session::resolve(req, state).await?;
    let decision = ReviewDecision::Reject {
        reason: request.reason,
    };
    review(
        &session.store,
        &session.actor,
        request.version_ids,
        decision,
        state.config.approval_chunk_size,
    )
    .await
}
