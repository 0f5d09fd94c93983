use chrono::Utc;
use common::approval::ReviewDecision;
use common::authz::{self, Action};
use common::error::ValidationError;
use common::model::audit::AuditAction;
use common::model::field::FieldDefinition;
use common::model::record::{CurrentRecord, MasterRecord, PendingRecord, RecordStatus, RecordVersion};
use common::model::tables;
use common::model::value::{content_to_json, validate_content};
use log::{info, warn};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{Direction, Filter, Query};

/// Rows per page when a caller needs every current record of a module.
const SCAN_PAGE_SIZE: usize = 1000;

fn current_of(module_id: Uuid) -> Query {
    Query::table(tables::RECORD_VERSIONS)
        .join(tables::MASTER_RECORDS, "registro_mestre_id")
        .filter(Filter::eq("registros_mestre.modulo_id", module_id.to_string()))
        .filter(Filter::eq("is_atual", true))
        .order_by("created_at", Direction::Desc)
}

/// Coerces `raw` against `fields` into storage form. Bookkeeping keys are
/// never taken from the client.
fn storage_content(fields: &[FieldDefinition], raw: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
    let content = validate_content(fields, raw)?;
    Ok(content_to_json(&content))
}

impl RecordStore {
    /// One page of the module's current records, newest first. A page whose
    /// offset does not fit the storage's signed 64-bit range is refused.
    pub async fn list_records(&self, module_id: Uuid, page: usize, page_size: usize) -> Result<Vec<CurrentRecord>, AppError> {
        let offset = page
            .checked_mul(page_size)
            .filter(|&offset| i64::try_from(offset).is_ok())
            .ok_or_else(|| ValidationError::Other("Página fora do intervalo".into()))?;
        self.fetch(&current_of(module_id).range(offset, page_size)).await
    }

    /// Every current record of the module, newest first.
    pub async fn all_records(&self, module_id: Uuid) -> Result<Vec<CurrentRecord>, AppError> {
        let mut records = Vec::new();
        for page in 0.. {
            let batch = self.list_records(module_id, page, SCAN_PAGE_SIZE).await?;
            let done = batch.len() < SCAN_PAGE_SIZE;
            records.extend(batch);
            if done {
                break;
            }
        }
        Ok(records)
    }

    pub async fn get_version(&self, version_id: Uuid) -> Result<RecordVersion, AppError> {
        let query = Query::table(tables::RECORD_VERSIONS).filter(Filter::eq("id", version_id.to_string()));
        self.fetch_one(query, "Registro").await
    }

    pub async fn get_current(&self, version_id: Uuid) -> Result<CurrentRecord, AppError> {
        let query = Query::table(tables::RECORD_VERSIONS)
            .join(tables::MASTER_RECORDS, "registro_mestre_id")
            .filter(Filter::eq("id", version_id.to_string()));
        self.fetch_one(query, "Registro").await
    }

    pub async fn get_master(&self, master_id: Uuid) -> Result<MasterRecord, AppError> {
        let query = Query::table(tables::MASTER_RECORDS).filter(Filter::eq("id", master_id.to_string()));
        self.fetch_one(query, "Registro").await
    }

    /// Inserts the master record, then its first version.
    ///
    /// The two inserts are not atomic: when the version insert fails the
    /// master record stays behind without versions. It is logged and left to
    /// the platform.
    pub async fn create_record(&self, actor: &Actor, module_id: Uuid, raw: Map<String, Value>) -> Result<CurrentRecord, AppError> {
        self.authorize(actor, Action::Insert, Some(module_id)).await?;
        let fields = self.module_fields(module_id).await?;
        let content = storage_content(&fields, &raw)?;
        let status = authz::initial_status(actor.role);

        let master: MasterRecord = self
            .insert_one(
                tables::MASTER_RECORDS,
                json!({
                    "id": Uuid::new_v4(),
                    "modulo_id": module_id,
                    "uuid_externo": Uuid::new_v4(),
                }),
            )
            .await?;
        let row = json!({
            "id": Uuid::new_v4(),
            "registro_mestre_id": master.id,
            "versao": 1,
            "conteudo": content,
            "status": status,
            "is_atual": true,
            "criado_por": actor.user_id,
        });
        let version: RecordVersion = match self.insert_one(tables::RECORD_VERSIONS, row).await {
            Ok(version) => version,
            Err(e) => {
                warn!("master record {} left without a version: {}", master.id, e);
                return Err(e);
            }
        };

        info!("record {} created in module {} as {}", master.id, module_id, status);
        self.audit(
            actor
                .audit(AuditAction::Create, tables::RECORD_VERSIONS)
                .target(version.id)
                .after(json!(&version.content)),
        )
        .await;
        Ok(CurrentRecord { version, master })
    }

    /// Edits the current version in place. The status goes back to the
    /// actor's initial status and previous review data is cleared, so an
    /// edit by an employee sends the record back to the approval queue.
    ///
    /// This is the one path where a version's status moves backwards: an
    /// `OFICIAL` or `REJEITADO` version edited by an employee becomes
    /// `PENDENTE` again on the same row. Review transitions themselves stay
    /// forward-only (`common::approval::transition`), and no `OBSOLETO`
    /// version is written.
    pub async fn update_record(&self, actor: &Actor, version_id: Uuid, raw: Map<String, Value>) -> Result<CurrentRecord, AppError> {
        let before = self.get_current(version_id).await?;
        if !before.version.is_atual {
            return Err(ValidationError::Other("Apenas a versão atual pode ser editada".into()).into());
        }
        let module_id = before.master.module_id;
        self.authorize(actor, Action::Edit, Some(module_id)).await?;

        let fields = self.module_fields(module_id).await?;
        let mut content = storage_content(&fields, &raw)?;
        for (key, value) in before.version.content.iter().filter(|(k, _)| k.starts_with('_')) {
            content.insert(key.clone(), value.clone());
        }
        let status = authz::initial_status(actor.role);
        let patch = json!({
            "conteudo": content,
            "status": status,
            "revisado_por": null,
            "revisado_em": null,
            "motivo_rejeicao": null,
        });
        self.platform
            .update(tables::RECORD_VERSIONS, patch, &[Filter::eq("id", version_id.to_string())])
            .await?;

        let after = self.get_current(version_id).await?;
        self.audit(
            actor
                .audit(AuditAction::Edit, tables::RECORD_VERSIONS)
                .target(version_id)
                .before(json!(&before.version.content))
                .after(json!(&after.version.content)),
        )
        .await;
        Ok(after)
    }

    /// Deletes a master record. Its versions go with it through the
    /// platform's cascade.
    pub async fn delete_master(&self, actor: &Actor, master_id: Uuid) -> Result<(), AppError> {
        let master = self.get_master(master_id).await?;
        self.authorize(actor, Action::Delete, Some(master.module_id)).await?;
        self.platform
            .delete(tables::MASTER_RECORDS, &[Filter::eq("id", master_id.to_string())])
            .await?;
        info!("record {} deleted from module {}", master_id, master.module_id);
        self.audit(
            actor
                .audit(AuditAction::Delete, tables::MASTER_RECORDS)
                .target(master_id)
                .before(json!(&master)),
        )
        .await;
        Ok(())
    }

    /// Current pending versions across the modules the actor can see,
    /// oldest first.
    pub async fn list_pending(&self, actor: &Actor) -> Result<Vec<PendingRecord>, AppError> {
        let modules: HashMap<Uuid, _> = self
            .list_modules(actor)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        if modules.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::table(tables::RECORD_VERSIONS)
            .join(tables::MASTER_RECORDS, "registro_mestre_id")
            .filter(Filter::eq("status", RecordStatus::Pending.as_str()))
            .filter(Filter::eq("is_atual", true))
            .filter(Filter::is_in(
                "registros_mestre.modulo_id",
                modules.keys().map(|id| id.to_string()),
            ))
            .order_by("created_at", Direction::Asc);
        let records: Vec<CurrentRecord> = self.fetch(&query).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                let module = modules.get(&record.master.module_id)?.clone();
                Some(PendingRecord {
                    version: record.version,
                    module,
                })
            })
            .collect())
    }

    /// Applies `decision` to every id of one chunk that is still pending.
    /// Versions that were already reviewed are left untouched.
    pub async fn review_chunk(&self, actor: &Actor, version_ids: &[Uuid], decision: &ReviewDecision) -> Result<(), AppError> {
        let status = decision.target_status();
        let reason = match decision {
            ReviewDecision::Reject { reason } => Some(reason.trim().to_string()),
            ReviewDecision::Approve => None,
        };
        let patch = json!({
            "status": status,
            "revisado_por": actor.user_id,
            "revisado_em": Utc::now(),
            "motivo_rejeicao": reason,
        });
        let filters = [
            Filter::is_in("id", version_ids.iter().map(|id| id.to_string())),
            Filter::eq("status", RecordStatus::Pending.as_str()),
        ];
        self.platform.update(tables::RECORD_VERSIONS, patch, &filters).await?;

        let action = match decision {
            ReviewDecision::Approve => AuditAction::Approve,
            ReviewDecision::Reject { .. } => AuditAction::Reject,
        };
        self.audit(
            actor
                .audit(action, tables::RECORD_VERSIONS)
                .after(json!({ "ids": version_ids, "status": status, "motivo": reason })),
        )
        .await;
        Ok(())
    }
}
