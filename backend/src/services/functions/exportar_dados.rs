//! `GET /functions/v1/exportar-dados?token=&id=&pagina=`
//!
//! Read-only JSON feed of a module's current records for BI and spreadsheet
//! tools. Every row is flattened: record metadata plus one member per field
//! technical name. Pages are 1-based and hold `EXPORT_PAGE_SIZE` rows.
//!
//! Callers authenticate with the shared `EXPORT_TOKEN`, which grants access
//! to every module. The endpoint answers 401 when no token is configured.

use actix_web::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use actix_web::{web, HttpResponse, Responder};
use common::error::ValidationError;
use common::model::audit::{AuditAction, AuditLogEntry};
use common::model::module::Module;
use common::model::record::CurrentRecord;
use common::model::tables;
use log::info;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::store::RecordStore;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    token: Option<String>,
    id: Option<Uuid>,
    pagina: Option<usize>,
}

fn with_cors(mut response: HttpResponse) -> HttpResponse {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    response
}

pub async fn preflight() -> impl Responder {
    with_cors(HttpResponse::Ok().body("ok"))
}

pub async fn process(state: web::Data<AppState>, query: web::Query<ExportQuery>) -> impl Responder {
    let response = match export_page(&state, query.into_inner()).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => e.respond("exportar-dados"),
    };
    with_cors(response)
}

fn token_matches(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

async fn export_page(state: &AppState, query: ExportQuery) -> Result<Vec<Value>, AppError> {
    let expected = state
        .config
        .export_token
        .as_deref()
        .ok_or(AppError::Unauthenticated("Exportação desabilitada"))?;
    let given = query.token.as_deref().unwrap_or_default();
    if !token_matches(expected, given) {
        return Err(AppError::Unauthenticated("Token de exportação inválido"));
    }
    let module_id = query
        .id
        .ok_or_else(|| ValidationError::Other("Informe o parâmetro id".into()))?;
    let page = query.pagina.unwrap_or(1).max(1);

    let store = RecordStore::new(state.service_platform.clone());
    let module = store.get_module(module_id).await?;
    let page_size = state.config.export_page_size;
    let records = store.list_records(module_id, page - 1, page_size).await?;

    info!("exportar-dados: module {} page {} ({} rows)", module_id, page, records.len());
    store
        .audit(
            AuditLogEntry::new(None, AuditAction::Export, tables::MODULES)
                .target(module_id)
                .after(json!({ "pagina": page, "registros": records.len() })),
        )
        .await;
    Ok(records.iter().map(|r| flatten(&module, r)).collect())
}

/// Metadata first, then the stored content. Bookkeeping keys are dropped.
fn flatten(module: &Module, record: &CurrentRecord) -> Value {
    let mut row = Map::new();
    row.insert("id".into(), json!(record.master.id));
    row.insert("versao_id".into(), json!(record.version.id));
    row.insert("modulo".into(), json!(module.name));
    row.insert("status".into(), json!(record.version.status));
    row.insert("versao".into(), json!(record.version.version));
    row.insert("created_at".into(), json!(record.version.created_at));
    for (key, value) in record.version.content.iter().filter(|(k, _)| !k.starts_with('_')) {
        row.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platform::sqlite::SqlitePlatform;
    use crate::platform::DataPlatform;
    use crate::services;
    use crate::store::testing::{actor, module};
    use actix_web::http::{Method, StatusCode};
    use actix_web::{test as actix_test, App};
    use common::model::profile::Role;
    use std::sync::Arc;

    async fn app_state(token: Option<&str>) -> (AppState, Uuid) {
        let platform: Arc<dyn DataPlatform> = Arc::new(SqlitePlatform::open_in_memory().unwrap());
        let store = RecordStore::new(platform.clone());
        let module = module(&store).await;
        let admin = actor(Role::Admin);
        for name in ["Ana", "Bia", "Caio"] {
            let mut content = Map::new();
            content.insert("nome".into(), json!(name));
            store.create_record(&admin, module.id, content).await.unwrap();
        }
        let token = token.map(str::to_string);
        let config = Config::from_lookup(|key| match key {
            "EXPORT_TOKEN" => token.clone(),
            "EXPORT_PAGE_SIZE" => Some("2".into()),
            _ => None,
        })
        .unwrap();
        let state = AppState {
            platform: platform.clone(),
            service_platform: platform,
            config: Arc::new(config),
        };
        (state, module.id)
    }

    #[actix_web::test]
    async fn pages_through_current_records() {
        let (state, module_id) = app_state(Some("segredo")).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri(&format!("/functions/v1/exportar-dados?token=segredo&id={}", module_id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        let rows: Vec<Value> = actix_test::read_body_json(resp).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["modulo"], json!("Servidores"));
        assert_eq!(rows[0]["status"], json!("OFICIAL"));
        assert!(rows[0]["nome"].is_string());

        let req = actix_test::TestRequest::get()
            .uri(&format!("/functions/v1/exportar-dados?token=segredo&id={}&pagina=2", module_id))
            .to_request();
        let rows: Vec<Value> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows.len(), 1);
    }

    #[actix_web::test]
    async fn rejects_wrong_or_unconfigured_token() {
        let (state, module_id) = app_state(Some("segredo")).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(&format!("/functions/v1/exportar-dados?token=outro&id={}", module_id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

        let (state, module_id) = app_state(None).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(&format!("/functions/v1/exportar-dados?token=&id={}", module_id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn answers_preflight() {
        let (state, _) = app_state(Some("segredo")).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;
        let req = actix_test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/functions/v1/exportar-dados")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[actix_web::test]
    async fn out_of_range_page_is_a_bad_request() {
        let (state, module_id) = app_state(Some("segredo")).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(&format!(
                "/functions/v1/exportar-dados?token=segredo&id={}&pagina={}",
                module_id,
                usize::MAX
            ))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn token_comparison() {
        assert!(token_matches("abc", "abc"));
        assert!(!token_matches("abc", "abd"));
        assert!(!token_matches("abc", "ab"));
    }
}
