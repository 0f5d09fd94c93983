use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::model::audit::{AuditAction, AuditLogEntry};
use common::model::tables;
use common::requests::{LoginRequest, LoginResponse};
use log::info;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::store::RecordStore;

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: web::Json<LoginRequest>) -> impl Responder {
    match login(&req, &state, payload.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("login"),
    }
}

async fn login(req: &HttpRequest, state: &AppState, request: LoginRequest) -> Result<LoginResponse, AppError> {
    let session = state.platform.sign_in(request.email.trim(), &request.password).await?;
    info!("user {} signed in", session.user_id);

    let ip = req.connection_info().realip_remote_addr().map(str::to_string);
    RecordStore::new(state.platform.scoped(&session.access_token))
        .audit(AuditLogEntry::new(Some(session.user_id), AuditAction::Login, tables::PROFILES).ip(ip))
        .await;
    Ok(LoginResponse {
        access_token: session.access_token,
        user_id: session.user_id,
    })
}
