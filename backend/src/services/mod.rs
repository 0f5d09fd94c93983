//! HTTP routes. Every route group lives in its own module exposing
//! `configure_routes()`; each endpoint is one file with a `process` handler.

pub mod approvals;
pub mod auth;
pub mod catalogs;
pub mod categories;
pub mod data_sources;
pub mod functions;
pub mod modules;
pub mod permissions;
pub mod records;

use actix_web::web::ServiceConfig;

/// Registers every API scope.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(auth::configure_routes())
        .service(auth::session_route())
        .service(modules::configure_routes())
        .service(categories::configure_routes())
        .service(catalogs::configure_routes())
        .service(records::configure_routes())
        .service(approvals::configure_routes())
        .service(data_sources::csv::configure_routes())
        .service(permissions::configure_routes())
        .service(functions::configure_routes());
}
