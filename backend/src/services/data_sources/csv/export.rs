use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::model::audit::AuditAction;
use common::model::tables;
use common::reconcile::export::to_csv;
use common::requests::ExportRequest;
use common::schema::slugify;
use log::info;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

struct CsvFile {
    name: String,
    body: String,
}

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<ExportRequest>) -> impl Responder {
    match export(&req, &state, payload.into_inner()).await {
        Ok(file) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(file.name)],
            })
            .body(file.body),
        Err(e) => e.respond("csv export"),
    }
}

async fn export(req: &HttpRequest, state: &AppState, request: ExportRequest) -> Result<CsvFile, AppError> {
    let session = Session::resolve(req, state).await?;
    let store = &session.store;
    store
        .authorize(&session.actor, Action::Export, Some(request.module_id))
        .await?;

    let module = store.get_module(request.module_id).await?;
    let mut fields = store.resolved_fields(module.id).await?;
    if !request.fields.is_empty() {
        fields.retain(|f| request.fields.iter().any(|name| name == f.name()));
    }
    let records = store.all_records(module.id).await?;
    let body = to_csv(&records, &fields);

    info!("exported {} records of module {}", records.len(), module.id);
    store
        .audit(
            session
                .actor
                .audit(AuditAction::Export, tables::MODULES)
                .target(module.id)
                .after(json!({ "registros": records.len(), "campos": request.fields })),
        )
        .await;
    Ok(CsvFile {
        name: format!("{}.csv", slugify(&module.name)),
        body,
    })
}
