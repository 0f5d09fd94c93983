//! CSV import and export under `/api/data_sources/csv`.
//!
//! Importing is a two-step exchange. The client uploads the file to
//! `/preview` and gets back the parsed rows, the inferred type of every
//! column and a suggested mapping onto the module's fields. After the
//! operator adjusts the mapping, the client posts it with the rows to
//! `/import`, which converts everything up front (answering 400 with the
//! first bad cell) and then writes the records in a background job. The
//! job is polled through `/status/{job_id}`.
//!
//! `/export` answers a UTF-8 CSV with a byte-order mark, ready for
//! spreadsheet tools.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod export;
mod get_status;
mod import;
mod preview;

const API_PATH: &str = "/api/data_sources/csv";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/preview", post().to(preview::process))
        .route("/import", post().to(import::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/export", post().to(export::process))
}
