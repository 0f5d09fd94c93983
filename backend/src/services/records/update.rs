use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::model::record::CurrentRecord;
use common::requests::SaveRecordRequest;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    version_id: web::Path<Uuid>,
    payload: web::Json<SaveRecordRequest>,
) -> impl Responder {
    match update_record(&req, &state, version_id.into_inner(), payload.into_inner()).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => e.respond("update record"),
    }
}

async fn update_record(req: &HttpRequest, state: &AppState, version_id: Uuid, request: SaveRecordRequest) -> Result<CurrentRecord, AppError> {
    let session = Session::resolve(req, state).await?;
    session
        .store
        .update_record(&session.actor, version_id, request.content)
        .await
}
