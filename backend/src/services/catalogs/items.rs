use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::requests::CatalogItemsResponse;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, catalog_id: web::Path<Uuid>) -> impl Responder {
    match catalog_items(&req, &state, catalog_id.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("catalog items"),
    }
}

async fn catalog_items(req: &HttpRequest, state: &AppState, catalog_id: Uuid) -> Result<CatalogItemsResponse, AppError> {
    let session = Session::resolve(req, state).await?;
    let items = session.store.catalog_items(catalog_id).await?;
    Ok(CatalogItemsResponse { items })
}
