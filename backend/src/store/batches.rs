use chrono::Utc;
use common::authz;
use common::model::import_batch::{ImportBatch, ImportStatus};
use common::model::record::MasterRecord;
use common::model::tables;
use log::{debug, warn};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{decode, Filter, Query};

impl RecordStore {
    /// Registers a batch as `processando`.
    pub async fn create_batch(&self, batch_id: Uuid, module_id: Uuid, file_name: &str) -> Result<ImportBatch, AppError> {
        let row = json!({
            "id": batch_id,
            "nome_arquivo": file_name,
            "modulo_id": module_id,
            "status": ImportStatus::Processing,
            "iniciado_em": Utc::now(),
        });
        self.insert_one(tables::IMPORT_BATCHES, row).await
    }

    pub async fn finish_batch(&self, batch_id: Uuid, status: ImportStatus, error_log: Option<String>) -> Result<(), AppError> {
        let patch = json!({
            "status": status,
            "finalizado_em": Utc::now(),
            "log_erros": error_log,
        });
        self.platform
            .update(tables::IMPORT_BATCHES, patch, &[Filter::eq("id", batch_id.to_string())])
            .await?;
        Ok(())
    }

    pub async fn get_batch(&self, batch_id: Uuid) -> Result<ImportBatch, AppError> {
        let query = Query::table(tables::IMPORT_BATCHES).filter(Filter::eq("id", batch_id.to_string()));
        self.fetch_one(query, "Lote de importação").await
    }

    /// Inserts one chunk of already converted rows of `batch_id`: all the
    /// master records first, then one version per master. Returns the number
    /// of versions stored.
    pub async fn insert_batch_rows(
        &self,
        actor: &Actor,
        module_id: Uuid,
        batch_id: Uuid,
        rows: Vec<Map<String, Value>>,
    ) -> Result<usize, AppError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let masters = rows
            .iter()
            .map(|_| {
                json!({
                    "id": Uuid::new_v4(),
                    "modulo_id": module_id,
                    "uuid_externo": Uuid::new_v4(),
                })
            })
            .collect();
        let masters: Vec<MasterRecord> = decode(self.platform.insert(tables::MASTER_RECORDS, masters).await?)?;

        let status = authz::initial_status(actor.role);
        let versions = masters
            .iter()
            .zip(rows)
            .map(|(master, content)| {
                json!({
                    "id": Uuid::new_v4(),
                    "registro_mestre_id": master.id,
                    "versao": 1,
                    "conteudo": content,
                    "status": status,
                    "is_atual": true,
                    "criado_por": actor.user_id,
                    "lote_importacao_id": batch_id,
                })
            })
            .collect();
        match self.platform.insert(tables::RECORD_VERSIONS, versions).await {
            Ok(stored) => {
                debug!("batch {}: stored {} versions", batch_id, stored.len());
                Ok(stored.len())
            }
            Err(e) => {
                warn!("batch {}: {} master records left without a version", batch_id, masters.len());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{actor, module, sqlite};
    use super::*;
    use common::model::profile::Role;
    use common::model::record::RecordStatus;
    use std::sync::Arc;

    #[tokio::test]
    async fn batch_rows_point_at_their_batch() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let batch = store
            .create_batch(Uuid::new_v4(), module.id, "servidores.csv")
            .await
            .unwrap();
        assert_eq!(batch.status, ImportStatus::Processing);

        let rows: Vec<Map<String, Value>> = ["Ana", "Bia", "Caio"]
            .iter()
            .map(|name| {
                let mut row = Map::new();
                row.insert("nome".into(), json!(name));
                row
            })
            .collect();
        let stored = store
            .insert_batch_rows(&actor(Role::Employee), module.id, batch.id, rows)
            .await
            .unwrap();
        assert_eq!(stored, 3);

        let records = store.list_records(module.id, 0, 10).await.unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.version.import_batch_id, Some(batch.id));
            assert_eq!(record.version.status, RecordStatus::Pending);
        }

        store
            .finish_batch(batch.id, ImportStatus::Finished, None)
            .await
            .unwrap();
        let finished = store.get_batch(batch.id).await.unwrap();
        assert_eq!(finished.status, ImportStatus::Finished);
        assert!(finished.finished_at.is_some());
    }
}
