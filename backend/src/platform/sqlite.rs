use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use common::model::profile::Role;
use common::model::tables;
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::schema::{self, ColumnKind, TableSpec};
use super::{AuthSession, DataPlatform, Direction, Filter, PlatformError, Query};

/// The data platform backed by a local SQLite database.
///
/// There is no row-level security: [`DataPlatform::scoped`] hands back the
/// same connection. Role checks in the services are the only gate.
#[derive(Clone)]
pub struct SqlitePlatform {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlatform {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PlatformError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PlatformError> {
        conn.execute_batch(&schema::migration())?;
        Ok(SqlitePlatform {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PlatformError> {
        self.conn
            .lock()
            .map_err(|_| PlatformError::Storage("sqlite connection poisoned".into()))
    }

    /// Sets a user's role directly. Local platforms have no admin console.
    pub fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), PlatformError> {
        self.lock()?.execute(
            "UPDATE perfis SET role = ?1 WHERE id = ?2",
            params![role.as_str(), user_id.to_string()],
        )?;
        Ok(())
    }
}

fn spec(table: &str) -> Result<&'static TableSpec, PlatformError> {
    schema::table(table).ok_or_else(|| PlatformError::Storage(format!("unknown table {}", table)))
}

fn quoted(column: &str) -> String {
    format!("\"{}\"", column.replace('"', ""))
}

fn to_sql(value: &Value, kind: ColumnKind) -> SqlValue {
    match (value, kind) {
        (Value::Null, _) => SqlValue::Null,
        (value, ColumnKind::Json) => SqlValue::Text(value.to_string()),
        (Value::Bool(b), _) => SqlValue::Integer(i64::from(*b)),
        (Value::Number(n), ColumnKind::Integer | ColumnKind::Bool) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        (Value::String(s), _) => SqlValue::Text(s.clone()),
        (other, _) => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(row: &Row<'_>, index: usize, kind: ColumnKind) -> rusqlite::Result<Value> {
    let raw: SqlValue = row.get(index)?;
    Ok(match (raw, kind) {
        (SqlValue::Null, _) => Value::Null,
        (SqlValue::Integer(i), ColumnKind::Bool) => Value::Bool(i != 0),
        (SqlValue::Integer(i), _) => Value::Number(i.into()),
        (SqlValue::Real(f), _) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        (SqlValue::Text(s), ColumnKind::Json) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        (SqlValue::Text(s), _) => Value::String(s),
        (SqlValue::Blob(_), _) => Value::Null,
    })
}

/// Resolves a filter column to `(qualified sql column, kind)`.
fn resolve_column(
    column: &str,
    base: &TableSpec,
    base_alias: Option<&str>,
    join: Option<&TableSpec>,
) -> Result<(String, ColumnKind), PlatformError> {
    let unknown = || PlatformError::Storage(format!("unknown column {}", column));
    match column.split_once('.') {
        Some((table, col)) => {
            let join = join.filter(|j| j.name == table).ok_or_else(unknown)?;
            let kind = join.kind(col).ok_or_else(unknown)?;
            Ok((format!("j.{}", quoted(col)), kind))
        }
        None => {
            let kind = base.kind(column).ok_or_else(unknown)?;
            let name = match base_alias {
                Some(alias) => format!("{}.{}", alias, quoted(column)),
                None => quoted(column),
            };
            Ok((name, kind))
        }
    }
}

fn where_clause(
    filters: &[Filter],
    base: &TableSpec,
    base_alias: Option<&str>,
    join: Option<&TableSpec>,
    params: &mut Vec<SqlValue>,
) -> Result<String, PlatformError> {
    let mut parts = Vec::with_capacity(filters.len());
    for filter in filters {
        let (column, kind) = resolve_column(filter.column(), base, base_alias, join)?;
        match filter {
            Filter::Eq(_, value) => {
                params.push(to_sql(value, kind));
                parts.push(format!("{} = ?", column));
            }
            Filter::In(_, values) if values.is_empty() => parts.push("0".to_string()),
            Filter::In(_, values) => {
                params.extend(values.iter().map(|v| to_sql(v, kind)));
                let marks = vec!["?"; values.len()].join(", ");
                parts.push(format!("{} IN ({})", column, marks));
            }
            Filter::IsNull(_) => parts.push(format!("{} IS NULL", column)),
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

fn select_rows(conn: &Connection, query: &Query) -> Result<Vec<Value>, PlatformError> {
    let base = spec(query.table)?;
    let join = query.join.as_ref().map(|j| spec(j.table)).transpose()?;

    let mut columns: Vec<String> = base
        .columns
        .iter()
        .map(|(c, _)| format!("t.{}", quoted(c)))
        .collect();
    if let Some(join) = join {
        columns.extend(join.columns.iter().map(|(c, _)| format!("j.{}", quoted(c))));
    }

    let mut sql = format!("SELECT {} FROM {} t", columns.join(", "), query.table);
    if let (Some(join), Some(spec)) = (&query.join, join) {
        spec.kind("id")
            .ok_or_else(|| PlatformError::Storage(format!("cannot join {} without id", spec.name)))?;
        sql.push_str(&format!(
            " JOIN {} j ON j.\"id\" = t.{}",
            join.table,
            quoted(join.foreign_key)
        ));
    }
    let mut params = Vec::new();
    sql.push_str(&where_clause(&query.filters, base, Some("t"), join, &mut params)?);
    if let Some((column, direction)) = &query.order {
        let (column, _) = resolve_column(column, base, Some("t"), join)?;
        let direction = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {} {}", column, direction));
    }
    if let Some((offset, limit)) = query.range {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
    }
    debug!("sqlite select: {}", sql);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut object = Map::new();
        for (index, (name, kind)) in base.columns.iter().enumerate() {
            object.insert(name.to_string(), from_sql(row, index, *kind)?);
        }
        if let Some(join) = join {
            let offset = base.columns.len();
            let mut embedded = Map::new();
            for (index, (name, kind)) in join.columns.iter().enumerate() {
                embedded.insert(name.to_string(), from_sql(row, offset + index, *kind)?);
            }
            object.insert(join.name.to_string(), Value::Object(embedded));
        }
        Ok(Value::Object(object))
    })?;
    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn insert_row(conn: &Connection, spec: &TableSpec, row: Value) -> Result<Value, PlatformError> {
    let Value::Object(mut object) = row else {
        return Err(PlatformError::Storage(format!("row for {} is not an object", spec.name)));
    };
    if spec.has_id() && !object.contains_key("id") {
        object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (name, kind) in spec.columns {
        if let Some(value) = object.get(*name) {
            columns.push(quoted(name));
            values.push(to_sql(value, *kind));
        }
    }
    let marks = vec!["?"; columns.len()].join(", ");
    let sql = format!("INSERT INTO {} ({}) VALUES ({})", spec.name, columns.join(", "), marks);
    conn.execute(&sql, params_from_iter(values.iter()))?;

    match object.get("id").cloned() {
        Some(id) if spec.has_id() => {
            let query = Query::table(spec.name).filter(Filter::Eq("id".into(), id));
            select_rows(conn, &query)?
                .into_iter()
                .next()
                .ok_or_else(|| PlatformError::Storage(format!("inserted row vanished from {}", spec.name)))
        }
        _ => Ok(Value::Object(object)),
    }
}

fn require_filters(filters: &[Filter], op: &str, table: &str) -> Result<(), PlatformError> {
    if filters.is_empty() {
        return Err(PlatformError::Storage(format!("refusing unfiltered {} on {}", op, table)));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, PlatformError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PlatformError::Storage(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

fn new_session(conn: &Connection, user_id: &str) -> Result<AuthSession, PlatformError> {
    let token = Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO sessoes (token, usuario_id) VALUES (?1, ?2)",
        params![token, user_id],
    )?;
    let user_id = Uuid::parse_str(user_id).map_err(|e| PlatformError::Storage(e.to_string()))?;
    Ok(AuthSession {
        access_token: token,
        user_id,
    })
}

#[async_trait]
impl DataPlatform for SqlitePlatform {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PlatformError> {
        let conn = self.lock()?;
        select_rows(&conn, query)
    }

    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> Result<Vec<Value>, PlatformError> {
        let spec = spec(table)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let stored = rows
            .into_iter()
            .map(|row| insert_row(&tx, spec, row))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(stored)
    }

    async fn update(&self, table: &'static str, patch: Value, filters: &[Filter]) -> Result<(), PlatformError> {
        require_filters(filters, "update", table)?;
        let spec = spec(table)?;
        let Value::Object(patch) = patch else {
            return Err(PlatformError::Storage("update patch is not an object".into()));
        };

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (name, value) in &patch {
            let kind = spec
                .kind(name)
                .ok_or_else(|| PlatformError::Storage(format!("unknown column {}", name)))?;
            assignments.push(format!("{} = ?", quoted(name)));
            params.push(to_sql(value, kind));
        }
        if assignments.is_empty() {
            return Ok(());
        }
        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        sql.push_str(&where_clause(filters, spec, None, None, &mut params)?);
        debug!("sqlite update: {}", sql);

        self.lock()?.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    async fn delete(&self, table: &'static str, filters: &[Filter]) -> Result<(), PlatformError> {
        require_filters(filters, "delete", table)?;
        let spec = spec(table)?;
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            table,
            where_clause(filters, spec, None, None, &mut params)?
        );
        debug!("sqlite delete: {}", sql);
        self.lock()?.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError> {
        let conn = self.lock()?;
        let user: Option<(String, String)> = conn
            .query_row(
                "SELECT id, senha_hash FROM usuarios WHERE email = ?1",
                params![email.trim().to_lowercase()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match user {
            Some((id, hash)) if verify_password(password, &hash) => new_session(&conn, &id),
            _ => Err(PlatformError::InvalidCredentials),
        }
    }

    /// Registers a user with the `funcionario` role. The very first user of
    /// an empty database becomes administrator.
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession, PlatformError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.len() < 6 {
            return Err(PlatformError::Storage(
                "e-mail obrigatório e senha com pelo menos 6 caracteres".into(),
            ));
        }
        let hash = hash_password(password)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row("SELECT 1 FROM usuarios WHERE email = ?1", params![email], |_| Ok(()))
            .optional()?
            .is_some();
        if exists {
            return Err(PlatformError::Storage("e-mail já cadastrado".into()));
        }
        let first: bool = tx.query_row("SELECT COUNT(*) = 0 FROM perfis", [], |row| row.get(0))?;
        let role = if first { Role::Admin } else { Role::Employee };

        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO usuarios (id, email, senha_hash) VALUES (?1, ?2, ?3)",
            params![id, email, hash],
        )?;
        tx.execute(
            &format!("INSERT INTO {} (id, nome, email, role) VALUES (?1, ?2, ?3, ?4)", tables::PROFILES),
            params![id, name.trim(), email, role.as_str()],
        )?;
        let session = new_session(&tx, &id)?;
        tx.commit()?;
        Ok(session)
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<Uuid>, PlatformError> {
        let conn = self.lock()?;
        let user: Option<String> = conn
            .query_row(
                "SELECT usuario_id FROM sessoes WHERE token = ?1",
                params![access_token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user.and_then(|id| Uuid::parse_str(&id).ok()))
    }

    fn scoped(&self, _access_token: &str) -> Arc<dyn DataPlatform> {
        Arc::new(self.clone())
    }
}
