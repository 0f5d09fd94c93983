use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::error::ValidationError;
use common::reconcile::infer::infer_columns;
use common::reconcile::mapping::suggest;
use common::reconcile::parse::parse;
use common::requests::CsvPreview;
use futures_util::StreamExt;
use log::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    match preview(&req, &state, payload).await {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => e.respond("csv preview"),
    }
}

fn upload_error(message: impl Into<String>) -> AppError {
    ValidationError::Csv(message.into()).into()
}

struct Upload {
    module_id: Uuid,
    file_name: String,
    bytes: Vec<u8>,
}

/// Reads the `module_id` text part and the `file` part.
async fn read_upload(mut payload: Multipart) -> Result<Upload, AppError> {
    let mut module_id = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| upload_error(format!("envio inválido: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !file_name.to_lowercase().ends_with(".csv") {
                    return Err(upload_error("o arquivo deve ter extensão .csv"));
                }
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| upload_error(format!("envio interrompido: {}", e)))?;
                    if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                        return Err(upload_error("o arquivo excede 20 MB"));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((file_name, bytes));
            }
            Some("module_id") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(|e| upload_error(e.to_string()))?);
                }
                let text = String::from_utf8_lossy(&bytes);
                module_id = Some(Uuid::parse_str(text.trim()).map_err(|_| upload_error("módulo inválido"))?);
            }
            _ => {}
        }
    }

    let module_id = module_id.ok_or_else(|| upload_error("informe o módulo de destino"))?;
    let (file_name, bytes) = file.ok_or_else(|| upload_error("nenhum arquivo enviado"))?;
    Ok(Upload {
        module_id,
        file_name,
        bytes,
    })
}

async fn preview(req: &HttpRequest, state: &AppState, payload: Multipart) -> Result<CsvPreview, AppError> {
    let session = Session::resolve(req, state).await?;
    let upload = read_upload(payload).await?;
    session
        .store
        .authorize(&session.actor, Action::Import, Some(upload.module_id))
        .await?;

    let csv = parse(&upload.bytes)?;
    let columns = infer_columns(&csv);
    let existing = session.store.module_fields(upload.module_id).await?;
    let mappings = suggest(&columns, &existing);
    info!(
        "previewed {} ({} columns, {} rows) for module {}",
        upload.file_name,
        csv.headers.len(),
        csv.rows.len(),
        upload.module_id
    );
    Ok(CsvPreview {
        file_name: upload.file_name,
        csv,
        columns,
        mappings,
    })
}
