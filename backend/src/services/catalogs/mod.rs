//! `GET /api/catalogs/{catalog_id}/items`: every item of a catalog, inactive
//! ones included, in display order.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod items;

const API_PATH: &str = "/api/catalogs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{catalog_id}/items", get().to(items::process))
}
