use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::requests::RecordPage;
use serde::Deserialize;
use uuid::Uuid;

use super::PAGE_SIZE;
use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    page: u32,
}

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    module_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    match list_records(&req, &state, module_id.into_inner(), query.page).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => e.respond("list records"),
    }
}

async fn list_records(req: &HttpRequest, state: &AppState, module_id: Uuid, page: u32) -> Result<RecordPage, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::View, Some(module_id)).await?;
    let records = session
        .store
        .list_records(module_id, page as usize, PAGE_SIZE as usize)
        .await?;
    Ok(RecordPage {
        records,
        page,
        page_size: PAGE_SIZE,
    })
}
