//! Public functions under `/functions/v1`, called by third-party tools
//! rather than by the application's own client.

use actix_web::web::{get, method, scope};
use actix_web::http::Method;
use actix_web::Scope;

mod exportar_dados;

const API_PATH: &str = "/functions/v1";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/exportar-dados", get().to(exportar_dados::process))
        .route("/exportar-dados", method(Method::OPTIONS).to(exportar_dados::preflight))
}
