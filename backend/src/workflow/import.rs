//! CSV import job.
//!
//! The request handler calls [`prepare`] synchronously, so a bad mapping or
//! an invalid cell is answered with a 400 before anything is written. The
//! prepared import then runs in the background through [`run_job`], which
//! reports progress to the job registry.

use common::authz::Action;
use common::error::ValidationError;
use common::jobs::JobStatus;
use common::model::audit::AuditAction;
use common::model::field::FieldDefinition;
use common::model::import_batch::ImportStatus;
use common::model::tables;
use common::reconcile::mapping::ImportPlan;
use common::requests::ImportRequest;
use log::{error, info};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::job_controller::state::JobReporter;
use crate::store::{Actor, RecordStore};

/// An import whose rows have all been converted.
#[derive(Debug)]
pub struct PreparedImport {
    pub module_id: Uuid,
    pub file_name: String,
    pub batch_id: Uuid,
    pub new_fields: Vec<FieldDefinition>,
    pub rows: Vec<Map<String, Value>>,
}

/// Checks permissions and the mapping, then converts every row. Fails on
/// the first cell that does not fit its field.
pub async fn prepare(store: &RecordStore, actor: &Actor, request: ImportRequest) -> Result<PreparedImport, AppError> {
    store.authorize(actor, Action::Import, Some(request.module_id)).await?;
    if request.csv.rows.is_empty() {
        return Err(ValidationError::Csv("o arquivo não tem linhas de dados".into()).into());
    }
    store.get_module(request.module_id).await?;

    let existing = store.module_fields(request.module_id).await?;
    let plan = ImportPlan::build(request.module_id, &request.csv.headers, &request.mappings, &existing)?;
    if !plan.new_fields.is_empty() {
        store.authorize(actor, Action::ManageModules, None).await?;
    }
    let batch_id = Uuid::new_v4();
    let rows = plan.convert(&request.csv, batch_id)?;

    Ok(PreparedImport {
        module_id: request.module_id,
        file_name: request.file_name,
        batch_id,
        new_fields: plan.new_fields,
        rows,
    })
}

/// Writes a prepared import: the batch row, the new fields, then the records
/// `chunk_size` at a time. The batch ends as `concluido` or `erro`.
pub async fn run(
    store: &RecordStore,
    actor: &Actor,
    import: PreparedImport,
    chunk_size: usize,
    reporter: &JobReporter,
) -> Result<usize, AppError> {
    store
        .create_batch(import.batch_id, import.module_id, &import.file_name)
        .await?;
    let outcome = write_rows(store, actor, &import, chunk_size.max(1), reporter).await;

    let (status, error_log) = match &outcome {
        Ok(_) => (ImportStatus::Finished, None),
        Err(e) => (ImportStatus::Failed, Some(e.to_string())),
    };
    if let Err(e) = store.finish_batch(import.batch_id, status, error_log).await {
        error!("could not close import batch {}: {}", import.batch_id, e);
    }

    let imported = match &outcome {
        Ok(n) => *n,
        Err(AppError::PartialBatchFailure { succeeded, .. }) => *succeeded,
        Err(_) => 0,
    };
    store
        .audit(
            actor
                .audit(AuditAction::Import, tables::IMPORT_BATCHES)
                .target(import.batch_id)
                .after(json!({
                    "arquivo": import.file_name,
                    "modulo_id": import.module_id,
                    "registros": imported,
                    "total": import.rows.len(),
                    "status": status,
                })),
        )
        .await;
    outcome
}

async fn write_rows(
    store: &RecordStore,
    actor: &Actor,
    import: &PreparedImport,
    chunk_size: usize,
    reporter: &JobReporter,
) -> Result<usize, AppError> {
    store.insert_fields(&import.new_fields).await?;

    let total = import.rows.len();
    let mut imported = 0;
    for chunk in import.rows.chunks(chunk_size) {
        match store
            .insert_batch_rows(actor, import.module_id, import.batch_id, chunk.to_vec())
            .await
        {
            Ok(stored) => {
                imported += stored;
                reporter.report(JobStatus::InProgress(imported as u32)).await;
            }
            Err(cause) => {
                return Err(AppError::PartialBatchFailure {
                    succeeded: imported,
                    total,
                    cause: Box::new(cause),
                })
            }
        }
    }
    Ok(imported)
}

/// Body of the background job started by the import endpoint.
pub async fn run_job(store: RecordStore, actor: Actor, import: PreparedImport, chunk_size: usize, reporter: JobReporter) {
    let batch_id = import.batch_id;
    match run(&store, &actor, import, chunk_size, &reporter).await {
        Ok(imported) => {
            info!("import batch {} finished with {} records", batch_id, imported);
            reporter
                .report(JobStatus::Completed(format!("{} registros importados", imported)))
                .await;
        }
        Err(e) => {
            error!("import batch {} failed: {:?}", batch_id, e);
            reporter.report(JobStatus::Failed(e.to_string())).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_controller::state::JobsState;
    use crate::platform::testing::FlakyPlatform;
    use crate::platform::DataPlatform;
    use crate::store::testing::{actor, module, sqlite};
    use common::model::field::FieldType;
    use common::model::profile::Role;
    use common::model::record::{RecordStatus, BATCH_MARKER};
    use common::reconcile::infer::infer_columns;
    use common::reconcile::mapping::suggest;
    use common::reconcile::parse::parse;
    use std::sync::Arc;

    async fn request(store: &RecordStore, module_id: Uuid, data: &str) -> ImportRequest {
        let csv = parse(data.as_bytes()).unwrap();
        let existing = store.module_fields(module_id).await.unwrap();
        let mappings = suggest(&infer_columns(&csv), &existing);
        ImportRequest {
            module_id,
            file_name: "servidores.csv".into(),
            csv,
            mappings,
        }
    }

    #[tokio::test]
    async fn imports_rows_into_one_batch() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let admin = actor(Role::Admin);
        let (jobs, _rx) = JobsState::new();

        let mut data = String::from("Nome;valor_mensal\n");
        for i in 0..10 {
            data.push_str(&format!("Pessoa {};1500\n", i));
        }
        let prepared = prepare(&store, &admin, request(&store, module.id, &data).await)
            .await
            .unwrap();
        assert_eq!(prepared.new_fields.len(), 1);
        assert_eq!(prepared.new_fields[0].field_type, FieldType::Currency);
        let batch_id = prepared.batch_id;

        let imported = run(&store, &admin, prepared, 4, &jobs.reporter("job")).await.unwrap();
        assert_eq!(imported, 10);

        let records = store.list_records(module.id, 0, 50).await.unwrap();
        assert_eq!(records.len(), 10);
        for record in &records {
            assert_eq!(record.version.import_batch_id, Some(batch_id));
            assert_eq!(record.version.content[BATCH_MARKER], json!(batch_id.to_string()));
            assert_eq!(record.version.content["valor_mensal"], json!(150000));
            assert_eq!(record.version.status, RecordStatus::Official);
        }
        let fields = store.module_fields(module.id).await.unwrap();
        assert!(fields.iter().any(|f| f.technical_name == "valor_mensal"));
        assert_eq!(
            store.get_batch(batch_id).await.unwrap().status,
            ImportStatus::Finished
        );
    }

    #[tokio::test]
    async fn bad_cell_is_reported_before_writing() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let data = "Nome,Salário\nAna,100\nBia,abc\n";
        let err = prepare(&store, &actor(Role::Admin), request(&store, module.id, data).await)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Linha 3, coluna 'Salário': valor inválido");
        assert!(store.list_records(module.id, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_columns_need_an_administrator() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let supervisor = actor(Role::Supervisor);
        let mut permission = common::model::permission::Permission::none(supervisor.user_id, module.id);
        permission.can_view = true;
        permission.can_insert = true;
        store.upsert_permission(&actor(Role::Admin), permission).await.unwrap();

        let known = prepare(&store, &supervisor, request(&store, module.id, "Nome\nAna\n").await).await;
        assert!(known.is_ok());
        let unknown = prepare(&store, &supervisor, request(&store, module.id, "Nome,Cargo\nAna,Médica\n").await)
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn failed_chunk_stops_the_import() {
        let base: Arc<dyn DataPlatform> = Arc::new(sqlite());
        let setup = RecordStore::new(base.clone());
        let module = module(&setup).await;
        let admin = actor(Role::Admin);

        // insert calls: batch, masters #1, versions #1, masters #2 (fails)
        let store = RecordStore::new(Arc::new(FlakyPlatform::failing_insert(base, 4)));
        let data = "Nome\nAna\nBia\nCaio\nDani\nEli\n";
        let prepared = prepare(&store, &admin, request(&store, module.id, data).await)
            .await
            .unwrap();
        let batch_id = prepared.batch_id;
        let (jobs, _rx) = JobsState::new();

        let err = run(&store, &admin, prepared, 2, &jobs.reporter("job")).await.unwrap_err();
        match &err {
            AppError::PartialBatchFailure { succeeded, total, .. } => {
                assert_eq!(*succeeded, 2);
                assert_eq!(*total, 5);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("2 de 5"));
        assert_eq!(setup.list_records(module.id, 0, 10).await.unwrap().len(), 2);
        let batch = setup.get_batch(batch_id).await.unwrap();
        assert_eq!(batch.status, ImportStatus::Failed);
        assert!(batch.error_log.is_some());
    }
}
