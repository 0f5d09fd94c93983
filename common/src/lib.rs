//! Shared model and pure logic for the municipal records application.
//!
//! Everything in this crate compiles for both the actix backend and the yew
//! frontend, so nothing here performs I/O. The backend layers the remote data
//! platform on top; the frontend renders forms and approval queues from the
//! same types.

pub mod approval;
pub mod authz;
pub mod coercion;
pub mod error;
pub mod form;
pub mod jobs;
pub mod model;
pub mod reconcile;
pub mod requests;
pub mod schema;
