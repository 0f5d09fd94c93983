use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::authz::Action;
use common::requests::{CreateModuleRequest, ModuleDetail};

use crate::app_state::AppState;
use crate::error::AppError;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<CreateModuleRequest>) -> impl Responder {
    match create_module(&req, &state, payload.into_inner()).await {
        Ok(detail) => HttpResponse::Created().json(detail),
        Err(e) => e.respond("create module"),
    }
}

async fn create_module(req: &HttpRequest, state: &AppState, request: CreateModuleRequest) -> Result<ModuleDetail, AppError> {
    let session = Session::resolve(req, state).await?;
    session.store.authorize(&session.actor, Action::ManageModules, None).await?;
    let (module, _) = session.store.create_module(&session.actor, request).await?;
    session.store.module_detail(&session.actor, module.id).await
}
