use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::model::audit::AuditAction;
use common::model::field::{FieldDefinition, FieldDraft};
use common::model::tables;
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    module_id: web::Path<Uuid>,
    payload: web::Json<Vec<FieldDraft>>,
) -> impl Responder {
    match add_fields(&req, &state, module_id.into_inner(), payload.into_inner()).await {
        Ok(fields) => HttpResponse::Created().json(fields),
        Err(e) => e.respond("add fields"),
    }
}

async fn add_fields(req: &HttpRequest, state: &AppState, module_id: Uuid, drafts: Vec<FieldDraft>) -> Result<Vec<FieldDefinition>, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.get_module(module_id).await?;
    let fields = session.store.add_fields(module_id, drafts).await?;
    session
        .store
        .audit(
            session
                .actor
                .audit(AuditAction::Edit, tables::FIELDS)
                .target(module_id)
                .after(json!(&fields)),
        )
        .await;
    Ok(fields)
}
