//! Category routes under `/api/categories`. Deleting a category removes its
//! modules and all of their records.

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

mod create;
mod delete;
mod list;

const API_PATH: &str = "/api/categories";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/{category_id}", delete().to(delete::process))
}
