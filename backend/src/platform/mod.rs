//! Access to the remote data platform.
//!
//! The application never talks to storage or auth directly. Everything goes
//! through [`DataPlatform`], a table-oriented RPC interface shaped after
//! PostgREST: `select` with filters, one embedded join, order and range;
//! `insert` returning the stored rows; filtered `update` and `delete`; plus
//! password sign-in and token lookup.
//!
//! Two adapters implement it:
//! - [`rest::RestPlatform`] speaks HTTP to a hosted PostgREST/GoTrue
//!   platform, which enforces row-level security for the caller's token.
//! - [`sqlite::SqlitePlatform`] keeps everything in a local SQLite file and is
//!   what the tests run against.

pub mod rest;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not decode row: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Storage(String),
}

/// A single filter. Columns of the joined table are written
/// `"<join table>.<column>"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn is_in<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(column.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::In(c, _) | Filter::IsNull(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Inner join of the base table's `foreign_key` onto `table.id`. Joined
/// columns come back embedded under the key `table`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: &'static str,
    pub foreign_key: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: &'static str,
    pub filters: Vec<Filter>,
    pub join: Option<Join>,
    pub order: Option<(String, Direction)>,
    /// `(offset, limit)`.
    pub range: Option<(usize, usize)>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Query {
            table,
            filters: Vec::new(),
            join: None,
            order: None,
            range: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn join(mut self, table: &'static str, foreign_key: &'static str) -> Self {
        self.join = Some(Join { table, foreign_key });
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some((column.to_string(), direction));
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.range = Some((offset, limit));
        self
    }
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait DataPlatform: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PlatformError>;

    /// Inserts `rows` and returns them as stored.
    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> Result<Vec<Value>, PlatformError>;

    /// Applies `patch` to every row matching all `filters`.
    async fn update(&self, table: &'static str, patch: Value, filters: &[Filter]) -> Result<(), PlatformError>;

    async fn delete(&self, table: &'static str, filters: &[Filter]) -> Result<(), PlatformError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError>;

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession, PlatformError>;

    /// User owning `access_token`, or `None` for an unknown or expired token.
    async fn user_for_token(&self, access_token: &str) -> Result<Option<Uuid>, PlatformError>;

    /// The same platform acting on behalf of the owner of `access_token`.
    fn scoped(&self, access_token: &str) -> Arc<dyn DataPlatform>;
}

/// Deserializes platform rows into `T`.
pub fn decode<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, PlatformError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(PlatformError::from))
        .collect()
}
