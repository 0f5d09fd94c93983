//! Record routes under `/api/records`.
//!
//! Records are addressed by module for listing and creation, by version id
//! for edits and by master id for deletion.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

mod create;
mod delete;
mod list;
mod update;

const API_PATH: &str = "/api/records";

/// Records per page of the records table.
pub const PAGE_SIZE: u32 = 50;

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/version/{version_id}", put().to(update::process))
        .route("/master/{master_id}", delete().to(delete::process))
        .route("/{module_id}", get().to(list::process))
        .route("/{module_id}", post().to(create::process))
}
