use common::authz::Action;
use common::model::catalog::CatalogItem;
use common::model::field::{FieldDefinition, FieldOption, FieldType};
use common::model::tables;
use common::requests::ModuleDetail;
use common::schema::{resolve_options, widget_for, OptionSources, ResolvedField};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{Direction, Filter, Query};

/// Upper bound on records offered by a module reference field.
const REFERENCE_OPTION_LIMIT: usize = 500;

impl RecordStore {
    pub async fn catalog_items(&self, catalog_id: Uuid) -> Result<Vec<CatalogItem>, AppError> {
        let query = Query::table(tables::CATALOG_ITEMS)
            .filter(Filter::eq("catalogo_id", catalog_id.to_string()))
            .order_by("ordem", Direction::Asc);
        self.fetch(&query).await
    }

    /// Current records of `module_id` as select options: the master record id
    /// labelled with the module's first field.
    pub async fn reference_options(&self, module_id: Uuid) -> Result<Vec<FieldOption>, AppError> {
        let fields = self.module_fields(module_id).await?;
        let records = self.list_records(module_id, 0, REFERENCE_OPTION_LIMIT).await?;
        let label_field = fields.first();
        Ok(records
            .into_iter()
            .map(|record| {
                let id = record.master.id.to_string();
                let label = label_field
                    .and_then(|f| {
                        record
                            .version
                            .content
                            .get(&f.technical_name)
                            .map(|v| common::coercion::display_json(v, f.field_type))
                    })
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| id.clone());
                FieldOption { value: id, label }
            })
            .collect())
    }

    /// Everything a client needs to render the forms and table of a module.
    pub async fn module_detail(&self, actor: &Actor, module_id: Uuid) -> Result<ModuleDetail, AppError> {
        self.authorize(actor, Action::View, Some(module_id)).await?;
        let module = self.get_module(module_id).await?;
        let fields = self.module_fields(module_id).await?;
        let options = self.option_map(&fields).await?;

        Ok(ModuleDetail {
            module,
            fields,
            options,
            can_insert: self.allows(actor, Action::Insert, module_id).await?,
            can_edit: self.allows(actor, Action::Edit, module_id).await?,
            can_delete: self.allows(actor, Action::Delete, module_id).await?,
            can_export: self.allows(actor, Action::Export, module_id).await?,
        })
    }

    /// Fields of the module in display order, each with its widget and
    /// resolved options.
    pub async fn resolved_fields(&self, module_id: Uuid) -> Result<Vec<ResolvedField>, AppError> {
        let fields = self.module_fields(module_id).await?;
        let mut options = self.option_map(&fields).await?;
        Ok(fields
            .into_iter()
            .map(|definition| {
                let widget = widget_for(&definition, options.remove(&definition.technical_name));
                ResolvedField { definition, widget }
            })
            .collect())
    }

    /// Resolved options per field technical name. Fields left out fall back
    /// to free text.
    async fn option_map(&self, fields: &[FieldDefinition]) -> Result<HashMap<String, Vec<FieldOption>>, AppError> {
        let mut catalogs: HashMap<Uuid, Vec<CatalogItem>> = HashMap::new();
        let mut modules: HashMap<Uuid, Vec<FieldOption>> = HashMap::new();
        for field in fields {
            if let Some(catalog_id) = field.catalog_id {
                if !catalogs.contains_key(&catalog_id) {
                    catalogs.insert(catalog_id, self.catalog_items(catalog_id).await?);
                }
            }
            if let (FieldType::ModuleReference, Some(reference)) = (field.field_type, field.reference_module_id) {
                if !modules.contains_key(&reference) {
                    modules.insert(reference, self.reference_options(reference).await?);
                }
            }
        }

        let sources = OptionSources {
            catalogs: catalogs.iter().map(|(id, items)| (*id, items.as_slice())).collect(),
            modules,
        };
        Ok(fields
            .iter()
            .filter_map(|f| resolve_options(f, &sources).map(|options| (f.technical_name.clone(), options)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{actor, module, sqlite};
    use super::*;
    use common::model::field::FieldDraft;
    use common::model::profile::Role;
    use serde_json::{json, Map};
    use std::sync::Arc;

    #[tokio::test]
    async fn catalog_fields_offer_active_items_or_fall_back() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let admin = actor(Role::Admin);
        let module = module(&store).await;

        let catalog = Uuid::new_v4();
        let empty_catalog = Uuid::new_v4();
        store
            .platform()
            .insert(
                tables::CATALOGS,
                vec![
                    json!({ "id": catalog, "nome": "Secretarias" }),
                    json!({ "id": empty_catalog, "nome": "Vazio" }),
                ],
            )
            .await
            .unwrap();
        store
            .platform()
            .insert(
                tables::CATALOG_ITEMS,
                vec![
                    json!({ "catalogo_id": catalog, "valor": "SAU", "rotulo": "Saúde", "ativo": true, "ordem": 2 }),
                    json!({ "catalogo_id": catalog, "valor": "EDU", "rotulo": "Educação", "ativo": true, "ordem": 1 }),
                    json!({ "catalogo_id": catalog, "valor": "OLD", "rotulo": "Extinta", "ativo": false, "ordem": 0 }),
                ],
            )
            .await
            .unwrap();

        let mut secretaria = FieldDraft::new("Secretaria", FieldType::CatalogReference);
        secretaria.catalog_id = Some(catalog);
        let mut setor = FieldDraft::new("Setor", FieldType::Select);
        setor.catalog_id = Some(empty_catalog);
        store.add_fields(module.id, vec![secretaria, setor]).await.unwrap();

        let detail = store.module_detail(&admin, module.id).await.unwrap();
        let values: Vec<&str> = detail.options["secretaria"].iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["EDU", "SAU"]);
        assert!(!detail.options.contains_key("setor"));
        assert!(detail.can_insert && detail.can_delete);

        let resolved = store.resolved_fields(module.id).await.unwrap();
        let secretaria = resolved.iter().find(|f| f.name() == "secretaria").unwrap();
        assert_eq!(secretaria.display(&json!("SAU")), "Saúde");
        let setor = resolved.iter().find(|f| f.name() == "setor").unwrap();
        assert_eq!(setor.widget, common::schema::Widget::Text);
    }

    #[tokio::test]
    async fn module_reference_lists_current_records() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let admin = actor(Role::Admin);
        let people = module(&store).await;
        let mut content = Map::new();
        content.insert("nome".into(), json!("Ana"));
        let ana = store.create_record(&admin, people.id, content).await.unwrap();

        let options = store.reference_options(people.id).await.unwrap();
        assert_eq!(
            options,
            vec![FieldOption {
                value: ana.master.id.to_string(),
                label: "Ana".into()
            }]
        );
    }

    #[tokio::test]
    async fn detail_requires_view_permission() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let err = store
            .module_detail(&actor(Role::Employee), module.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
