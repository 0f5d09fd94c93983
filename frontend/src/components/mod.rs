pub mod approvals;
pub mod data_sources;
pub mod form;
pub mod login;
pub mod modules;
pub mod records;
