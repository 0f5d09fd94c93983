//! Permission management, administrators only.
//!
//! - `GET /api/permissions/{module_id}`: every permission row of a module.
//! - `PUT /api/permissions`: replaces the row of one `(user, module)` pair.

use actix_web::web::{get, put, scope};
use actix_web::Scope;

mod list;
mod upsert;

const API_PATH: &str = "/api/permissions";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", put().to(upsert::process))
        .route("/{module_id}", get().to(list::process))
}
