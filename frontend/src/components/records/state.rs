//! State of the records screen.

use common::model::record::CurrentRecord;
use common::requests::ModuleDetail;
use common::schema::{self, ResolvedField};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::components::form::SaveTarget;
use crate::helpers::Liveness;

/// The form dialog, while open.
pub struct Editor {
    pub target: SaveTarget,
    pub initial: Map<String, Value>,
}

pub struct RecordsComponent {
    /// Module schema and the caller's rights on it; `None` until loaded.
    pub detail: Option<ModuleDetail>,
    /// Fields in display order with their widgets.
    pub fields: Vec<ResolvedField>,
    pub records: Vec<CurrentRecord>,
    /// Zero-based.
    pub page: u32,
    pub page_size: u32,
    pub loading: bool,
    pub editor: Option<Editor>,
    pub exporting: bool,
    pub deleting: Option<Uuid>,
    pub alive: Liveness,
}

impl RecordsComponent {
    pub fn new() -> Self {
        Self {
            detail: None,
            fields: Vec::new(),
            records: Vec::new(),
            page: 0,
            page_size: 0,
            loading: true,
            editor: None,
            exporting: false,
            deleting: None,
            alive: Liveness::new(),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.page_size > 0 && self.records.len() as u32 >= self.page_size
    }
}

/// Pairs each field of `detail` with its widget. Fields without resolved
/// options fall back to their free-text widget.
pub fn resolved_fields(detail: &ModuleDetail) -> Vec<ResolvedField> {
    schema::ordered(&detail.fields)
        .into_iter()
        .map(|definition| {
            let options = detail.options.get(&definition.technical_name).cloned();
            let widget = schema::widget_for(&definition, options);
            ResolvedField { definition, widget }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::field::FieldOption;
    use common::schema::Widget;
    use serde_json::json;

    fn detail() -> ModuleDetail {
        let module_id = Uuid::new_v4();
        let field = |name: &str, field_type: &str, order: i32| {
            json!({
                "id": Uuid::new_v4(),
                "modulo_id": module_id,
                "nome_tecnico": name,
                "rotulo": name,
                "tipo": field_type,
                "obrigatorio": false,
                "ordem": order
            })
        };
        serde_json::from_value(json!({
            "module": {
                "id": module_id,
                "nome": "Servidores",
                "ativo": true,
                "created_at": "2025-03-01T12:00:00Z"
            },
            "fields": [
                field("setor", "selecao", 2),
                field("nome", "texto", 1),
                field("lotacao", "referencia_catalogo", 3)
            ],
            "options": { "setor": [{ "valor": "SAU", "rotulo": "Saúde" }] },
            "can_insert": true,
            "can_edit": true,
            "can_delete": false,
            "can_export": true
        }))
        .unwrap()
    }

    #[test]
    fn fields_follow_order_and_fall_back_to_text() {
        let fields = resolved_fields(&detail());
        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["nome", "setor", "lotacao"]);
        assert_eq!(
            fields[1].widget,
            Widget::Select(vec![FieldOption {
                value: "SAU".into(),
                label: "Saúde".into()
            }])
        );
        assert_eq!(fields[2].widget, Widget::Text);
    }
}
