//! Record Store Adapter: every read and write of modules, fields, records,
//! permissions, catalogs, import batches and the audit log.
//!
//! The store owns the query shapes (joins, filters, ordering, pagination)
//! and nothing else; authorization decisions live in `common::authz`.
//! Record writes and module detail check them here through
//! [`RecordStore::authorize`]; administrative operations are checked by the
//! handlers that call them.

mod audit;
mod batches;
mod catalogs;
mod categories;
mod modules;
mod permissions;
mod records;

use common::authz::{self, Action, Decision};
use common::model::audit::{AuditAction, AuditLogEntry};
use common::model::profile::{Profile, Role};
use common::model::tables;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::platform::{decode, DataPlatform, Filter, Query};

/// Who is acting, as far as the store needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub ip: Option<String>,
}

impl Actor {
    /// Audit entry attributed to this actor.
    pub fn audit(&self, action: AuditAction, table: &str) -> AuditLogEntry {
        AuditLogEntry::new(Some(self.user_id), action, table).ip(self.ip.clone())
    }
}

#[derive(Clone)]
pub struct RecordStore {
    platform: Arc<dyn DataPlatform>,
}

impl RecordStore {
    pub fn new(platform: Arc<dyn DataPlatform>) -> Self {
        RecordStore { platform }
    }

    pub fn platform(&self) -> &Arc<dyn DataPlatform> {
        &self.platform
    }

    async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, AppError> {
        let rows = self.platform.select(query).await?;
        Ok(decode(rows)?)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, query: Query, what: &'static str) -> Result<T, AppError> {
        self.fetch(&query.range(0, 1))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound(what))
    }

    async fn insert_one<T: DeserializeOwned>(&self, table: &'static str, row: Value) -> Result<T, AppError> {
        let rows = self.platform.insert(table, vec![row]).await?;
        decode(rows)?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound("Registro inserido"))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let query = Query::table(tables::PROFILES).filter(Filter::eq("id", user_id.to_string()));
        Ok(self.fetch(&query).await?.into_iter().next())
    }

    /// Checks `action` for `actor`, loading the actor's permission row for
    /// `module_id` when the decision depends on it.
    pub async fn authorize(&self, actor: &Actor, action: Action, module_id: Option<Uuid>) -> Result<(), AppError> {
        let permission = match (actor.role, module_id) {
            (Role::Admin, _) | (_, None) => None,
            (_, Some(module_id)) => self.permission_for(actor.user_id, module_id).await?,
        };
        match authz::authorize(actor.role, action, permission.as_ref()) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }

    /// Same decision as [`RecordStore::authorize`], as a flag.
    pub async fn allows(&self, actor: &Actor, action: Action, module_id: Uuid) -> Result<bool, AppError> {
        match self.authorize(actor, action, Some(module_id)).await {
            Ok(()) => Ok(true),
            Err(AppError::Forbidden(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
