//! Sign-in, sign-up and session lookup.
//!
//! - `POST /api/auth/login`: email and password, answered with an access
//!   token to send as `Authorization: Bearer <token>`.
//! - `POST /api/auth/signup`: creates the account and signs it in.
//! - `GET /api/session`: the caller's resolved session (`ready` or
//!   `degraded`), or 401.

use actix_web::web::{get, post, resource, scope};
use actix_web::{Resource, Scope};

mod login;
mod session;
mod signup;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/signup", post().to(signup::process))
}

/// Kept out of the `/api/auth` scope; an `/api` scope would shadow every
/// other `/api/...` group.
pub fn session_route() -> Resource {
    resource("/api/session").route(get().to(session::process))
}
