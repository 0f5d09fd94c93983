use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::approval::{BulkOutcome, ReviewDecision};
use common::requests::ApproveRequest;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;
use crate::workflow::approval::review;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<ApproveRequest>) -> impl Responder {
    match approve(&req, &state, payload.into_inner()).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => e.respond("approve"),
    }
}

async fn approve(req: &HttpRequest, state: &AppState, request: ApproveRequest) -> Result<BulkOutcome, AppError> {
    let session = Session::resolve(req, state).await?;
    review(
        &session.store,
        &session.actor,
        request.version_ids,
        ReviewDecision::Approve,
        state.config.approval_chunk_size,
    )
    .await
}
