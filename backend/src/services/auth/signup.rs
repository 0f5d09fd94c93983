use actix_web::{web, HttpResponse, Responder};
use common::error::ValidationError;
use common::requests::{LoginResponse, SignUpRequest};
use log::info;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::platform::PlatformError;

pub async fn process(state: web::Data<AppState>, payload: web::Json<SignUpRequest>) -> impl Responder {
    match sign_up(&state, payload.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.respond("signup"),
    }
}

async fn sign_up(state: &AppState, request: SignUpRequest) -> Result<LoginResponse, AppError> {
    if request.name.trim().is_empty() {
        return Err(ValidationError::Other("Informe o nome".into()).into());
    }
    let session = state
        .platform
        .sign_up(request.email.trim(), &request.password, request.name.trim())
        .await
        .map_err(|e| match e {
            // Sign-up refusals from the platform are meant for the user.
            PlatformError::Storage(message) => AppError::from(ValidationError::Other(message)),
            other => AppError::from(other),
        })?;
    info!("user {} signed up", session.user_id);
    Ok(LoginResponse {
        access_token: session.access_token,
        user_id: session.user_id,
    })
}
