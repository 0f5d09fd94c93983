//! Module schema: display order, option resolution and widget choice.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::coercion;
use crate::model::catalog::CatalogItem;
use crate::model::field::{FieldDefinition, FieldOption, FieldType};

/// Input widget used for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum Widget {
    Text,
    TextArea,
    Number,
    Email,
    Date,
    Time,
    Checkbox,
    /// Re-formatted on every keystroke (currency, CPF/CNPJ, phone, custom
    /// `#` patterns).
    Masked,
    Select(Vec<FieldOption>),
}

/// A field definition paired with the widget the form should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub definition: FieldDefinition,
    pub widget: Widget,
}

impl ResolvedField {
    pub fn name(&self) -> &str {
        &self.definition.technical_name
    }

    /// Options offered by the widget, empty for free-text widgets.
    pub fn options(&self) -> &[FieldOption] {
        match &self.widget {
            Widget::Select(options) => options,
            _ => &[],
        }
    }

    /// Display text for a stored value, preferring the option label.
    pub fn display(&self, value: &Value) -> String {
        let text = coercion::display_json(value, self.definition.field_type);
        self.options()
            .iter()
            .find(|o| o.value == text)
            .map(|o| o.label.clone())
            .unwrap_or(text)
    }
}

/// Sorts by `order`. Equal orders keep their incoming relative order.
pub fn ordered(fields: &[FieldDefinition]) -> Vec<FieldDefinition> {
    let mut sorted = fields.to_vec();
    sorted.sort_by_key(|f| f.order);
    sorted
}

/// Where a field's options come from.
#[derive(Debug, Default)]
pub struct OptionSources<'a> {
    /// Items of every catalog referenced by the module, keyed by catalog id.
    pub catalogs: HashMap<Uuid, &'a [CatalogItem]>,
    /// Selectable records of every referenced module, keyed by module id.
    pub modules: HashMap<Uuid, Vec<FieldOption>>,
}

/// Options a field offers, or `None` when the field must fall back to free
/// text. A select never ends up with zero options.
pub fn resolve_options(field: &FieldDefinition, sources: &OptionSources<'_>) -> Option<Vec<FieldOption>> {
    let options: Vec<FieldOption> = match field.field_type {
        FieldType::Select | FieldType::CatalogReference => match field.catalog_id {
            Some(catalog_id) => active_items(sources.catalogs.get(&catalog_id).copied().unwrap_or(&[])),
            None => field.options.clone().unwrap_or_default(),
        },
        FieldType::ModuleReference => field
            .reference_module_id
            .and_then(|id| sources.modules.get(&id).cloned())
            .unwrap_or_default(),
        _ => return None,
    };
    (!options.is_empty()).then_some(options)
}

fn active_items(items: &[CatalogItem]) -> Vec<FieldOption> {
    let mut active: Vec<&CatalogItem> = items.iter().filter(|i| i.active).collect();
    active.sort_by_key(|i| i.order);
    active.into_iter().map(FieldOption::from).collect()
}

pub fn widget_for(field: &FieldDefinition, options: Option<Vec<FieldOption>>) -> Widget {
    if let Some(options) = options {
        return Widget::Select(options);
    }
    match field.field_type {
        FieldType::LongText => Widget::TextArea,
        FieldType::Integer | FieldType::Decimal => Widget::Number,
        FieldType::Email => Widget::Email,
        FieldType::Date => Widget::Date,
        FieldType::Time => Widget::Time,
        FieldType::Boolean => Widget::Checkbox,
        t if t.is_masked() => Widget::Masked,
        _ if field.mask.as_deref().is_some_and(|m| m.contains('#')) => Widget::Masked,
        _ => Widget::Text,
    }
}

/// Orders `fields` and pairs each with its widget.
pub fn resolve(fields: &[FieldDefinition], sources: &OptionSources<'_>) -> Vec<ResolvedField> {
    ordered(fields)
        .into_iter()
        .map(|definition| {
            let options = resolve_options(&definition, sources);
            let widget = widget_for(&definition, options);
            ResolvedField { definition, widget }
        })
        .collect()
}

/// Machine-safe identifier derived from a label: lowercase ASCII, accents
/// folded, runs of anything else collapsed into `_`.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    match slug.chars().next() {
        None => "campo".to_string(),
        Some(c) if c.is_ascii_digit() => format!("c_{}", slug),
        Some(_) => slug,
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Slug of `label` made unique against `taken` by suffixing `_2`, `_3`, ...
pub fn unique_technical_name<S: AsRef<str>>(label: &str, taken: &[S]) -> String {
    let base = slugify(label);
    let is_taken = |name: &str| taken.iter().any(|t| t.as_ref() == name);
    if !is_taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: FieldType, order: i32) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            module_id: Uuid::nil(),
            technical_name: name.to_string(),
            label: name.to_string(),
            field_type,
            required: false,
            order,
            options: None,
            mask: None,
            catalog_id: None,
            reference_module_id: None,
        }
    }

    fn item(catalog_id: Uuid, value: &str, active: bool, order: i32) -> CatalogItem {
        CatalogItem {
            id: Uuid::new_v4(),
            catalog_id,
            value: value.to_string(),
            label: value.to_uppercase(),
            active,
            order,
        }
    }

    #[test]
    fn ordering_is_stable() {
        let fields = vec![
            field("c", FieldType::ShortText, 2),
            field("a", FieldType::ShortText, 1),
            field("b1", FieldType::ShortText, 1),
            field("b2", FieldType::ShortText, 1),
            field("z", FieldType::ShortText, 0),
        ];
        let names: Vec<_> = ordered(&fields)
            .into_iter()
            .map(|f| f.technical_name)
            .collect();
        assert_eq!(names, ["z", "a", "b1", "b2", "c"]);
    }

    #[test]
    fn catalog_select_uses_active_items_in_order() {
        let catalog_id = Uuid::new_v4();
        let items = vec![
            item(catalog_id, "norte", true, 2),
            item(catalog_id, "sul", false, 0),
            item(catalog_id, "centro", true, 1),
        ];
        let mut bairro = field("bairro", FieldType::Select, 0);
        bairro.catalog_id = Some(catalog_id);

        let mut sources = OptionSources::default();
        sources.catalogs.insert(catalog_id, &items);

        let resolved = resolve(&[bairro], &sources);
        let values: Vec<_> = resolved[0].options().iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["centro", "norte"]);
    }

    #[test]
    fn select_without_options_falls_back_to_text() {
        let catalog_id = Uuid::new_v4();
        let items = vec![item(catalog_id, "inativo", false, 0)];
        let mut linked = field("tipo", FieldType::Select, 0);
        linked.catalog_id = Some(catalog_id);
        let unlinked = field("outro", FieldType::Select, 1);
        let reference = field("ref", FieldType::ModuleReference, 2);

        let mut sources = OptionSources::default();
        sources.catalogs.insert(catalog_id, &items);

        let resolved = resolve(&[linked, unlinked, reference], &sources);
        assert!(resolved.iter().all(|f| f.widget == Widget::Text));
    }

    #[test]
    fn widgets_follow_type() {
        let sources = OptionSources::default();
        let widgets: Vec<_> = resolve(
            &[
                field("a", FieldType::Currency, 0),
                field("b", FieldType::LongText, 1),
                field("c", FieldType::Boolean, 2),
                field("d", FieldType::Date, 3),
            ],
            &sources,
        )
        .into_iter()
        .map(|f| f.widget)
        .collect();
        assert_eq!(
            widgets,
            [Widget::Masked, Widget::TextArea, Widget::Checkbox, Widget::Date]
        );
    }

    #[test]
    fn option_label_is_displayed() {
        let mut situacao = field("situacao", FieldType::Select, 0);
        situacao.options = Some(vec![FieldOption {
            value: "A".into(),
            label: "Ativo".into(),
        }]);
        let resolved = resolve(&[situacao], &OptionSources::default());
        assert_eq!(resolved[0].display(&serde_json::json!("A")), "Ativo");
        assert_eq!(resolved[0].display(&serde_json::json!("B")), "B");
    }

    #[test]
    fn technical_names() {
        assert_eq!(slugify("Data de Nascimento"), "data_de_nascimento");
        assert_eq!(slugify("  Preço (R$) "), "preco_r");
        assert_eq!(slugify("2º turno"), "c_2_turno");
        assert_eq!(slugify("!!!"), "campo");
        assert_eq!(
            unique_technical_name("Nome", &["nome", "nome_2"]),
            "nome_3"
        );
        assert_eq!(unique_technical_name("Nome", &Vec::<String>::new()), "nome");
    }
}
