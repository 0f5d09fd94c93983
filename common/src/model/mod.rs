//! Entities persisted by the remote data platform.
//!
//! Field names on the wire follow the platform's Portuguese column names; the
//! Rust side uses English identifiers and `serde(rename)` bridges the two.

pub mod audit;
pub mod catalog;
pub mod category;
pub mod field;
pub mod import_batch;
pub mod module;
pub mod permission;
pub mod profile;
pub mod record;
pub mod value;

/// Table names on the data platform.
pub mod tables {
    pub const CATEGORIES: &str = "categorias";
    pub const MODULES: &str = "modulos";
    pub const FIELDS: &str = "campos";
    pub const CATALOGS: &str = "catalogos";
    pub const CATALOG_ITEMS: &str = "itens_catalogo";
    pub const MASTER_RECORDS: &str = "registros_mestre";
    pub const RECORD_VERSIONS: &str = "versoes_registro";
    pub const PERMISSIONS: &str = "permissoes";
    pub const AUDIT_LOG: &str = "logs_auditoria";
    pub const IMPORT_BATCHES: &str = "lotes_importacao";
    pub const PROFILES: &str = "perfis";
}
