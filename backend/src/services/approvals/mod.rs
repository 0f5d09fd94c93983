//! Approval queue under `/api/approvals`.
//!
//! - `GET /pending`: pending versions grouped into import batches and single
//!   cards.
//! - `POST /approve` and `POST /reject`: bulk review, sent to the platform in
//!   chunks. A failure part way answers 502 with the number of versions
//!   reviewed before it.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod approve;
mod pending;
mod reject;

const API_PATH: &str = "/api/approvals";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/pending", get().to(pending::process))
        .route("/approve", post().to(approve::process))
        .route("/reject", post().to(reject::process))
}
