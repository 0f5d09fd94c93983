use common::error::ValidationError;
use common::model::audit::AuditAction;
use common::model::category::Category;
use common::model::tables;
use common::requests::CreateCategoryRequest;
use log::info;
use serde_json::json;
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{Direction, Filter, Query};

impl RecordStore {
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.fetch(&Query::table(tables::CATEGORIES).order_by("nome", Direction::Asc))
            .await
    }

    pub async fn create_category(&self, actor: &Actor, request: CreateCategoryRequest) -> Result<Category, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Other("Informe o nome da categoria".into()).into());
        }
        let row = json!({
            "id": Uuid::new_v4(),
            "nome": name,
            "descricao": request.description,
        });
        let category: Category = self.insert_one(tables::CATEGORIES, row).await?;
        self.audit(
            actor
                .audit(AuditAction::Create, tables::CATEGORIES)
                .target(category.id)
                .after(json!(&category)),
        )
        .await;
        Ok(category)
    }

    /// Hard-deletes a category and every module in it. Fields, master
    /// records and versions of those modules go with them through the
    /// platform's cascade constraints.
    pub async fn delete_category(&self, actor: &Actor, category_id: Uuid) -> Result<(), AppError> {
        let category: Category = self
            .fetch_one(
                Query::table(tables::CATEGORIES).filter(Filter::eq("id", category_id.to_string())),
                "Categoria",
            )
            .await?;
        self.platform
            .delete(tables::MODULES, &[Filter::eq("categoria_id", category_id.to_string())])
            .await?;
        self.platform
            .delete(tables::CATEGORIES, &[Filter::eq("id", category_id.to_string())])
            .await?;
        info!("category {} deleted with its modules", category_id);
        self.audit(
            actor
                .audit(AuditAction::Delete, tables::CATEGORIES)
                .target(category_id)
                .before(json!(&category)),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{actor, sqlite};
    use super::*;
    use common::model::field::{FieldDraft, FieldType};
    use common::model::profile::Role;
    use common::requests::CreateModuleRequest;
    use serde_json::Map;
    use std::sync::Arc;

    #[tokio::test]
    async fn deleting_category_removes_its_modules_and_records() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let admin = actor(Role::Admin);
        let category = store
            .create_category(
                &admin,
                CreateCategoryRequest {
                    name: "Saúde".into(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let (module, _) = store
            .create_module(
                &admin,
                CreateModuleRequest {
                    name: "Vacinas".into(),
                    description: None,
                    category_id: Some(category.id),
                    fields: vec![FieldDraft::new("Lote", FieldType::ShortText)],
                },
            )
            .await
            .unwrap();
        let mut content = Map::new();
        content.insert("lote".into(), json!("A1"));
        store.create_record(&admin, module.id, content).await.unwrap();

        store.delete_category(&admin, category.id).await.unwrap();

        assert!(store.list_categories().await.unwrap().is_empty());
        assert!(matches!(store.get_module(module.id).await, Err(AppError::NotFound(_))));
        let versions = store
            .platform()
            .select(&Query::table(tables::RECORD_VERSIONS))
            .await
            .unwrap();
        assert!(versions.is_empty());
    }
}
