//! CSV import and export.
//!
//! - [`parse`]: reads an uploaded file into headers and rows.
//! - [`infer`]: guesses a field type per column.
//! - [`mapping`]: applies the operator's header-to-field mapping and turns
//!   rows into typed content.
//! - [`export`]: formats records back into CSV text for spreadsheets.

pub mod export;
pub mod infer;
pub mod mapping;
pub mod parse;
