use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::model::field::FieldDefinition;
use common::requests::UpdateFieldRequest;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    field_id: web::Path<Uuid>,
    payload: web::Json<UpdateFieldRequest>,
) -> impl Responder {
    match update_field(&req, &state, field_id.into_inner(), payload.into_inner()).await {
        Ok(field) => HttpResponse::Ok().json(field),
        Err(e) => e.respond("update field"),
    }
}

async fn update_field(req: &HttpRequest, state: &AppState, field_id: Uuid, request: UpdateFieldRequest) -> Result<FieldDefinition, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.update_field(&session.actor, field_id, request).await
}
