use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::app_state::AppState;
use crate::session::Session;

pub async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match Session::resolve(&req, &state).await {
        Ok(session) => HttpResponse::Ok().json(session.info),
        Err(e) => e.respond("session"),
    }
}
