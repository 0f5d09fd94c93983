//! Encoding of mapping choices in the column `<select>`s.

use common::model::field::{FieldDefinition, FieldDraft, FieldType};
use common::reconcile::infer::ColumnCheck;
use common::reconcile::mapping::MappingTarget;

const IGNORE: &str = "ignore";
const NEW: &str = "new";
const EXISTING_PREFIX: &str = "field:";

pub fn choice_of(target: &MappingTarget) -> String {
    match target {
        MappingTarget::Ignore => IGNORE.to_string(),
        MappingTarget::New { .. } => NEW.to_string(),
        MappingTarget::Existing { technical_name } => format!("{}{}", EXISTING_PREFIX, technical_name),
    }
}

/// Target selected by `choice` for `check`'s column. Unknown choices and
/// fields that no longer exist fall back to a new field of the inferred type.
pub fn target_for(choice: &str, check: &ColumnCheck, existing: &[FieldDefinition]) -> MappingTarget {
    if choice == IGNORE {
        return MappingTarget::Ignore;
    }
    if let Some(name) = choice.strip_prefix(EXISTING_PREFIX) {
        if existing.iter().any(|f| f.technical_name == name) {
            return MappingTarget::Existing {
                technical_name: name.to_string(),
            };
        }
    }
    let mut draft = FieldDraft::new(check.title.clone(), check.field_type);
    draft.options = check.options.clone();
    MappingTarget::New { draft }
}

/// Changes the type of a new field; other targets are left alone.
pub fn retype(target: &mut MappingTarget, field_type: FieldType) {
    if let MappingTarget::New { draft } = target {
        draft.field_type = field_type;
        if field_type != FieldType::Select {
            draft.options = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::field::FieldOption;
    use uuid::Uuid;

    fn check() -> ColumnCheck {
        ColumnCheck {
            title: "Situação".into(),
            field_type: FieldType::Select,
            options: Some(vec![FieldOption::same("Ativo"), FieldOption::same("Inativo")]),
            first_row: Some("Ativo".into()),
        }
    }

    fn existing() -> Vec<FieldDefinition> {
        let mut draft = FieldDraft::new("Nome", FieldType::ShortText);
        draft.required = true;
        vec![draft.into_definition(Uuid::new_v4(), "nome".into(), 0)]
    }

    #[test]
    fn choices_map_back_to_targets() {
        let fields = existing();
        let target = target_for("field:nome", &check(), &fields);
        assert_eq!(choice_of(&target), "field:nome");
        assert_eq!(target_for("ignore", &check(), &fields), MappingTarget::Ignore);
    }

    #[test]
    fn removed_field_becomes_new_field_with_inferred_options() {
        match target_for("field:matricula", &check(), &existing()) {
            MappingTarget::New { draft } => {
                assert_eq!(draft.label, "Situação");
                assert_eq!(draft.field_type, FieldType::Select);
                assert_eq!(draft.options.map(|o| o.len()), Some(2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn retyping_drops_options_unless_select() {
        let mut target = target_for("new", &check(), &existing());
        retype(&mut target, FieldType::ShortText);
        match target {
            MappingTarget::New { draft } => {
                assert_eq!(draft.field_type, FieldType::ShortText);
                assert!(draft.options.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
