use common::error::ValidationError;
use common::model::audit::AuditAction;
use common::model::field::{FieldDefinition, FieldDraft};
use common::model::module::Module;
use common::model::profile::Role;
use common::model::tables;
use common::requests::{CreateModuleRequest, UpdateFieldRequest};
use common::schema::{ordered, unique_technical_name};
use log::info;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{Direction, Filter, Query};

impl RecordStore {
    /// Modules the actor may open. Administrators see every active module;
    /// everyone else sees the active modules their permission rows allow.
    pub async fn list_modules(&self, actor: &Actor) -> Result<Vec<Module>, AppError> {
        if actor.role == Role::Admin {
            let query = Query::table(tables::MODULES)
                .filter(Filter::eq("ativo", true))
                .order_by("nome", Direction::Asc);
            return self.fetch(&query).await;
        }

        let query = Query::table(tables::PERMISSIONS)
            .join(tables::MODULES, "modulo_id")
            .filter(Filter::eq("usuario_id", actor.user_id.to_string()))
            .filter(Filter::eq("pode_ver", true))
            .filter(Filter::eq("modulos.ativo", true));
        let rows = self.platform.select(&query).await?;
        let mut modules = rows
            .into_iter()
            .filter_map(|mut row| row.get_mut(tables::MODULES).map(Value::take))
            .map(serde_json::from_value::<Module>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::platform::PlatformError::from)?;
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(modules)
    }

    pub async fn get_module(&self, module_id: Uuid) -> Result<Module, AppError> {
        let query = Query::table(tables::MODULES).filter(Filter::eq("id", module_id.to_string()));
        self.fetch_one(query, "Módulo").await
    }

    /// Field definitions of a module in display order.
    pub async fn module_fields(&self, module_id: Uuid) -> Result<Vec<FieldDefinition>, AppError> {
        let query = Query::table(tables::FIELDS)
            .filter(Filter::eq("modulo_id", module_id.to_string()))
            .order_by("ordem", Direction::Asc);
        let fields: Vec<FieldDefinition> = self.fetch(&query).await?;
        Ok(ordered(&fields))
    }

    pub async fn get_field(&self, field_id: Uuid) -> Result<FieldDefinition, AppError> {
        let query = Query::table(tables::FIELDS).filter(Filter::eq("id", field_id.to_string()));
        self.fetch_one(query, "Campo").await
    }

    /// Creates a module together with its initial fields.
    pub async fn create_module(
        &self,
        actor: &Actor,
        request: CreateModuleRequest,
    ) -> Result<(Module, Vec<FieldDefinition>), AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Other("Informe o nome do módulo".into()).into());
        }
        let row = json!({
            "id": Uuid::new_v4(),
            "nome": name,
            "descricao": request.description,
            "ativo": true,
            "criado_por": actor.user_id,
            "categoria_id": request.category_id,
        });
        let module: Module = self.insert_one(tables::MODULES, row).await?;
        let fields = self.add_fields(module.id, request.fields).await?;

        info!("module {} created with {} fields", module.id, fields.len());
        self.audit(
            actor
                .audit(AuditAction::Create, tables::MODULES)
                .target(module.id)
                .after(json!({ "modulo": &module, "campos": &fields })),
        )
        .await;
        Ok((module, fields))
    }

    /// Appends fields after the module's current ones. Technical names are
    /// derived from the labels and made unique within the module.
    pub async fn add_fields(&self, module_id: Uuid, drafts: Vec<FieldDraft>) -> Result<Vec<FieldDefinition>, AppError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let existing = self.module_fields(module_id).await?;
        let mut taken: Vec<String> = existing.iter().map(|f| f.technical_name.clone()).collect();
        let mut order = existing.iter().map(|f| f.order).max().map_or(0, |o| o + 1);

        let mut fields = Vec::with_capacity(drafts.len());
        for draft in drafts {
            if draft.label.trim().is_empty() {
                return Err(ValidationError::Other("Todo campo precisa de um rótulo".into()).into());
            }
            let technical_name = unique_technical_name(&draft.label, &taken);
            taken.push(technical_name.clone());
            fields.push(draft.into_definition(module_id, technical_name, order));
            order += 1;
        }
        self.insert_fields(&fields).await?;
        Ok(fields)
    }

    pub async fn insert_fields(&self, fields: &[FieldDefinition]) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }
        let rows = fields
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::platform::PlatformError::from)?;
        self.platform.insert(tables::FIELDS, rows).await?;
        Ok(())
    }

    /// Relabels, reorders or otherwise edits one field. The technical name
    /// and type never change, so stored content stays readable.
    pub async fn update_field(
        &self,
        actor: &Actor,
        field_id: Uuid,
        request: UpdateFieldRequest,
    ) -> Result<FieldDefinition, AppError> {
        let before = self.get_field(field_id).await?;

        let mut patch = Map::new();
        if let Some(label) = request.label {
            let label = label.trim().to_string();
            if label.is_empty() {
                return Err(ValidationError::Other("Todo campo precisa de um rótulo".into()).into());
            }
            patch.insert("rotulo".into(), Value::String(label));
        }
        if let Some(required) = request.required {
            patch.insert("obrigatorio".into(), Value::Bool(required));
        }
        if let Some(order) = request.order {
            patch.insert("ordem".into(), json!(order));
        }
        if let Some(options) = request.options {
            patch.insert("opcoes".into(), json!(options));
        }
        if let Some(mask) = request.mask {
            patch.insert("mascara".into(), json!(mask));
        }
        if patch.is_empty() {
            return Ok(before);
        }

        self.platform
            .update(tables::FIELDS, Value::Object(patch), &[Filter::eq("id", field_id.to_string())])
            .await?;
        let after = self.get_field(field_id).await?;
        self.audit(
            actor
                .audit(AuditAction::Edit, tables::FIELDS)
                .target(field_id)
                .before(json!(&before))
                .after(json!(&after)),
        )
        .await;
        Ok(after)
    }

    /// Removes a field definition. Values already stored under its name stay
    /// in the record content but are no longer shown.
    pub async fn delete_field(&self, actor: &Actor, field_id: Uuid) -> Result<FieldDefinition, AppError> {
        let field = self.get_field(field_id).await?;
        self.platform
            .delete(tables::FIELDS, &[Filter::eq("id", field_id.to_string())])
            .await?;
        self.audit(
            actor
                .audit(AuditAction::Delete, tables::FIELDS)
                .target(field_id)
                .before(json!(&field)),
        )
        .await;
        Ok(field)
    }

    /// Soft-disables a module. Its records are kept.
    pub async fn disable_module(&self, actor: &Actor, module_id: Uuid) -> Result<(), AppError> {
        let module = self.get_module(module_id).await?;
        self.platform
            .update(
                tables::MODULES,
                json!({ "ativo": false }),
                &[Filter::eq("id", module_id.to_string())],
            )
            .await?;
        info!("module {} disabled", module_id);
        self.audit(
            actor
                .audit(AuditAction::Disable, tables::MODULES)
                .target(module_id)
                .before(json!(&module)),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{actor, module, sqlite};
    use super::*;
    use common::model::field::FieldType;
    use common::model::permission::Permission;
    use std::sync::Arc;

    #[tokio::test]
    async fn creates_module_with_unique_ordered_fields() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let fields = store.module_fields(module.id).await.unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.technical_name.as_str()).collect();
        assert_eq!(names, ["nome", "salario"]);

        let added = store
            .add_fields(
                module.id,
                vec![
                    FieldDraft::new("Nome", FieldType::ShortText),
                    FieldDraft::new("2º telefone", FieldType::Phone),
                ],
            )
            .await
            .unwrap();
        assert_eq!(added[0].technical_name, "nome_2");
        assert_eq!(added[0].order, 2);
        assert_eq!(added[1].technical_name, "c_2_telefone");
    }

    #[tokio::test]
    async fn rejects_blank_module_name() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let err = store
            .create_module(
                &actor(Role::Admin),
                CreateModuleRequest {
                    name: "  ".into(),
                    description: None,
                    category_id: None,
                    fields: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn non_admins_see_only_permitted_active_modules() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let admin = actor(Role::Admin);
        let visible = module(&store).await;
        let hidden = module(&store).await;
        let employee = actor(Role::Employee);

        let mut permission = Permission::none(employee.user_id, visible.id);
        permission.can_view = true;
        store.upsert_permission(&admin, permission).await.unwrap();
        store
            .upsert_permission(&admin, Permission::none(employee.user_id, hidden.id))
            .await
            .unwrap();

        let modules = store.list_modules(&employee).await.unwrap();
        assert_eq!(modules.iter().map(|m| m.id).collect::<Vec<_>>(), [visible.id]);
        assert_eq!(store.list_modules(&admin).await.unwrap().len(), 2);

        store.disable_module(&admin, visible.id).await.unwrap();
        assert!(store.list_modules(&employee).await.unwrap().is_empty());
        assert_eq!(store.list_modules(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updates_field_label_and_order() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let admin = actor(Role::Admin);
        let module = module(&store).await;
        let salary = store.module_fields(module.id).await.unwrap().remove(1);

        let updated = store
            .update_field(
                &admin,
                salary.id,
                UpdateFieldRequest {
                    label: Some("Salário bruto".into()),
                    order: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.label, "Salário bruto");
        assert_eq!(updated.technical_name, "salario");

        let fields = store.module_fields(module.id).await.unwrap();
        assert_eq!(fields[0].id, salary.id);

        store.delete_field(&admin, salary.id).await.unwrap();
        assert_eq!(store.module_fields(module.id).await.unwrap().len(), 1);
    }
}
