use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::model::category::Category;
use common::requests::CreateCategoryRequest;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<CreateCategoryRequest>) -> impl Responder {
    match create_category(&req, &state, payload.into_inner()).await {
        Ok(category) => HttpResponse::Created().json(category),
        Err(e) => e.respond("create category"),
    }
}

async fn create_category(req: &HttpRequest, state: &AppState, request: CreateCategoryRequest) -> Result<Category, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    session.store.create_category(&session.actor, request).await
}
