//! Multi-step operations built on the record store: bulk review and CSV
//! import. Both run their network calls one chunk at a time and stop at the
//! first failure, reporting how far they got.

pub mod approval;
pub mod import;
