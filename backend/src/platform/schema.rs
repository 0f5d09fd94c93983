//! Table layout of the local SQLite platform.
//!
//! Mirrors the hosted platform's tables closely enough that the same JSON
//! rows round-trip through either adapter. Each column carries a
//! [`ColumnKind`] so JSON values can be bound to SQL parameters and read
//! back with their original JSON type.

use common::model::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    /// Stored as 0/1.
    Bool,
    /// Stored as serialized JSON text.
    Json,
}

#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
}

impl TableSpec {
    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
    }

    pub fn has_id(&self) -> bool {
        self.kind("id").is_some()
    }
}

pub const USERS: &str = "usuarios";
pub const SESSIONS: &str = "sessoes";

use ColumnKind::{Bool, Integer, Json, Text};

static TABLES: &[TableSpec] = &[
    TableSpec {
        name: tables::CATEGORIES,
        columns: &[("id", Text), ("nome", Text), ("descricao", Text), ("created_at", Text)],
    },
    TableSpec {
        name: tables::MODULES,
        columns: &[
            ("id", Text),
            ("nome", Text),
            ("descricao", Text),
            ("ativo", Bool),
            ("criado_por", Text),
            ("created_at", Text),
            ("categoria_id", Text),
        ],
    },
    TableSpec {
        name: tables::FIELDS,
        columns: &[
            ("id", Text),
            ("modulo_id", Text),
            ("nome_tecnico", Text),
            ("rotulo", Text),
            ("tipo", Text),
            ("obrigatorio", Bool),
            ("ordem", Integer),
            ("opcoes", Json),
            ("mascara", Text),
            ("catalogo_id", Text),
            ("modulo_referencia_id", Text),
        ],
    },
    TableSpec {
        name: tables::CATALOGS,
        columns: &[("id", Text), ("nome", Text)],
    },
    TableSpec {
        name: tables::CATALOG_ITEMS,
        columns: &[
            ("id", Text),
            ("catalogo_id", Text),
            ("valor", Text),
            ("rotulo", Text),
            ("ativo", Bool),
            ("ordem", Integer),
        ],
    },
    TableSpec {
        name: tables::MASTER_RECORDS,
        columns: &[("id", Text), ("modulo_id", Text), ("uuid_externo", Text), ("created_at", Text)],
    },
    TableSpec {
        name: tables::RECORD_VERSIONS,
        columns: &[
            ("id", Text),
            ("registro_mestre_id", Text),
            ("versao", Integer),
            ("conteudo", Json),
            ("status", Text),
            ("is_atual", Bool),
            ("criado_por", Text),
            ("revisado_por", Text),
            ("revisado_em", Text),
            ("motivo_rejeicao", Text),
            ("lote_importacao_id", Text),
            ("created_at", Text),
        ],
    },
    TableSpec {
        name: tables::PERMISSIONS,
        columns: &[
            ("usuario_id", Text),
            ("modulo_id", Text),
            ("pode_ver", Bool),
            ("pode_inserir", Bool),
            ("pode_editar", Bool),
            ("pode_aprovar", Bool),
            ("pode_exportar", Bool),
        ],
    },
    TableSpec {
        name: tables::AUDIT_LOG,
        columns: &[
            ("id", Text),
            ("usuario_id", Text),
            ("acao", Text),
            ("tabela", Text),
            ("registro_id", Text),
            ("dados_antes", Json),
            ("dados_depois", Json),
            ("created_at", Text),
            ("ip", Text),
        ],
    },
    TableSpec {
        name: tables::IMPORT_BATCHES,
        columns: &[
            ("id", Text),
            ("nome_arquivo", Text),
            ("modulo_id", Text),
            ("status", Text),
            ("iniciado_em", Text),
            ("finalizado_em", Text),
            ("log_erros", Text),
        ],
    },
    TableSpec {
        name: tables::PROFILES,
        columns: &[("id", Text), ("nome", Text), ("email", Text), ("role", Text), ("ativo", Bool)],
    },
];

pub fn table(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}

const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

/// Creates every table. Safe to run on an existing database.
pub fn migration() -> String {
    format!(
        r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS usuarios (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    senha_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT {now}
);

CREATE TABLE IF NOT EXISTS sessoes (
    token TEXT PRIMARY KEY,
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT {now}
);

CREATE TABLE IF NOT EXISTS perfis (
    id TEXT PRIMARY KEY REFERENCES usuarios(id) ON DELETE CASCADE,
    nome TEXT,
    email TEXT,
    role TEXT NOT NULL DEFAULT 'funcionario',
    ativo INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS categorias (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL,
    descricao TEXT,
    created_at TEXT NOT NULL DEFAULT {now}
);

CREATE TABLE IF NOT EXISTS modulos (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL,
    descricao TEXT,
    ativo INTEGER NOT NULL DEFAULT 1,
    criado_por TEXT,
    created_at TEXT NOT NULL DEFAULT {now},
    categoria_id TEXT REFERENCES categorias(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS catalogos (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS itens_catalogo (
    id TEXT PRIMARY KEY,
    catalogo_id TEXT NOT NULL REFERENCES catalogos(id) ON DELETE CASCADE,
    valor TEXT NOT NULL,
    rotulo TEXT NOT NULL,
    ativo INTEGER NOT NULL DEFAULT 1,
    ordem INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS campos (
    id TEXT PRIMARY KEY,
    modulo_id TEXT NOT NULL REFERENCES modulos(id) ON DELETE CASCADE,
    nome_tecnico TEXT NOT NULL,
    rotulo TEXT NOT NULL,
    tipo TEXT NOT NULL,
    obrigatorio INTEGER NOT NULL DEFAULT 0,
    ordem INTEGER NOT NULL DEFAULT 0,
    opcoes TEXT,
    mascara TEXT,
    catalogo_id TEXT REFERENCES catalogos(id) ON DELETE SET NULL,
    modulo_referencia_id TEXT REFERENCES modulos(id) ON DELETE SET NULL,
    UNIQUE (modulo_id, nome_tecnico)
);

CREATE TABLE IF NOT EXISTS registros_mestre (
    id TEXT PRIMARY KEY,
    modulo_id TEXT NOT NULL REFERENCES modulos(id) ON DELETE CASCADE,
    uuid_externo TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT {now}
);

CREATE TABLE IF NOT EXISTS lotes_importacao (
    id TEXT PRIMARY KEY,
    nome_arquivo TEXT NOT NULL,
    modulo_id TEXT NOT NULL REFERENCES modulos(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'processando',
    iniciado_em TEXT NOT NULL DEFAULT {now},
    finalizado_em TEXT,
    log_erros TEXT
);

CREATE TABLE IF NOT EXISTS versoes_registro (
    id TEXT PRIMARY KEY,
    registro_mestre_id TEXT NOT NULL REFERENCES registros_mestre(id) ON DELETE CASCADE,
    versao INTEGER NOT NULL DEFAULT 1,
    conteudo TEXT NOT NULL DEFAULT '{{}}',
    status TEXT NOT NULL,
    is_atual INTEGER NOT NULL DEFAULT 1,
    criado_por TEXT,
    revisado_por TEXT,
    revisado_em TEXT,
    motivo_rejeicao TEXT,
    lote_importacao_id TEXT REFERENCES lotes_importacao(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT {now}
);

CREATE UNIQUE INDEX IF NOT EXISTS versoes_registro_atual
    ON versoes_registro (registro_mestre_id) WHERE is_atual = 1;

CREATE TABLE IF NOT EXISTS permissoes (
    usuario_id TEXT NOT NULL,
    modulo_id TEXT NOT NULL REFERENCES modulos(id) ON DELETE CASCADE,
    pode_ver INTEGER NOT NULL DEFAULT 0,
    pode_inserir INTEGER NOT NULL DEFAULT 0,
    pode_editar INTEGER NOT NULL DEFAULT 0,
    pode_aprovar INTEGER NOT NULL DEFAULT 0,
    pode_exportar INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (usuario_id, modulo_id)
);

CREATE TABLE IF NOT EXISTS logs_auditoria (
    id TEXT PRIMARY KEY,
    usuario_id TEXT,
    acao TEXT NOT NULL,
    tabela TEXT NOT NULL,
    registro_id TEXT,
    dados_antes TEXT,
    dados_depois TEXT,
    created_at TEXT NOT NULL DEFAULT {now},
    ip TEXT
);
"#,
        now = NOW
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shared_table_has_a_spec() {
        for name in [
            tables::CATEGORIES,
            tables::MODULES,
            tables::FIELDS,
            tables::CATALOGS,
            tables::CATALOG_ITEMS,
            tables::MASTER_RECORDS,
            tables::RECORD_VERSIONS,
            tables::PERMISSIONS,
            tables::AUDIT_LOG,
            tables::IMPORT_BATCHES,
            tables::PROFILES,
        ] {
            let spec = table(name).unwrap_or_else(|| panic!("missing spec for {}", name));
            assert!(migration().contains(&format!("CREATE TABLE IF NOT EXISTS {} (", name)));
            assert!(!spec.columns.is_empty());
        }
        assert!(!table(tables::PERMISSIONS).unwrap().has_id());
        assert_eq!(table(tables::FIELDS).unwrap().kind("opcoes"), Some(ColumnKind::Json));
    }
}
