//! Module builder routes under `/api/modules`.
//!
//! Listing and detail are open to every signed-in user (filtered by their
//! permissions); everything that changes a module's shape is reserved to
//! administrators.

use actix_web::web::{delete, get, patch, post, scope};
use actix_web::Scope;

mod add_fields;
mod create;
mod delete_field;
mod detail;
mod disable;
mod list;
mod update_field;

const API_PATH: &str = "/api/modules";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/fields/{field_id}", patch().to(update_field::process))
        .route("/fields/{field_id}", delete().to(delete_field::process))
        .route("/{module_id}", get().to(detail::process))
        .route("/{module_id}/disable", post().to(disable::process))
        .route("/{module_id}/fields", post().to(add_fields::process))
}
