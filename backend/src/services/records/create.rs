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
    module_id: web::Path<Uuid>,
    payload: web::Json<SaveRecordRequest>,
) -> impl Responder {
    match create_record(&req, &state, module_id.into_inner(), payload.into_inner()).await {
        Ok(record) => HttpResponse::Created().json(record),
        Err(e) => e.respond("create record"),
    }
}

async fn create_record(req: &HttpRequest, state: &AppState, module_id: Uuid, request: SaveRecordRequest) -> Result<CurrentRecord, AppError> {
    let session = Session::resolve(req, state).await?;
    session
        .store
        .create_record(&session.actor, module_id, request.content)
        .await
}
