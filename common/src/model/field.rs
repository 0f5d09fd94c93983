use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical type of a module column. Drives coercion, display and the widget
/// chosen by the form renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "texto")]
    ShortText,
    #[serde(rename = "texto_longo")]
    LongText,
    #[serde(rename = "inteiro")]
    Integer,
    #[serde(rename = "decimal")]
    Decimal,
    /// Stored as integer cents.
    #[serde(rename = "moeda")]
    Currency,
    #[serde(rename = "data")]
    Date,
    #[serde(rename = "hora")]
    Time,
    #[serde(rename = "booleano")]
    Boolean,
    /// CPF, the 11-digit individual taxpayer id.
    #[serde(rename = "cpf")]
    NationalId,
    /// CNPJ, the 14-digit business registry id.
    #[serde(rename = "cnpj")]
    BusinessId,
    #[serde(rename = "telefone")]
    Phone,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "selecao")]
    Select,
    #[serde(rename = "referencia_modulo")]
    ModuleReference,
    #[serde(rename = "referencia_catalogo")]
    CatalogReference,
}

impl FieldType {
    pub const ALL: [FieldType; 15] = [
        FieldType::ShortText,
        FieldType::LongText,
        FieldType::Integer,
        FieldType::Decimal,
        FieldType::Currency,
        FieldType::Date,
        FieldType::Time,
        FieldType::Boolean,
        FieldType::NationalId,
        FieldType::BusinessId,
        FieldType::Phone,
        FieldType::Email,
        FieldType::Select,
        FieldType::ModuleReference,
        FieldType::CatalogReference,
    ];

    /// Human label shown in the module builder.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::ShortText => "Texto curto",
            FieldType::LongText => "Texto longo",
            FieldType::Integer => "Número inteiro",
            FieldType::Decimal => "Número decimal",
            FieldType::Currency => "Moeda (R$)",
            FieldType::Date => "Data",
            FieldType::Time => "Hora",
            FieldType::Boolean => "Sim/Não",
            FieldType::NationalId => "CPF",
            FieldType::BusinessId => "CNPJ",
            FieldType::Phone => "Telefone",
            FieldType::Email => "E-mail",
            FieldType::Select => "Seleção",
            FieldType::ModuleReference => "Referência a módulo",
            FieldType::CatalogReference => "Referência a catálogo",
        }
    }

    /// Types whose edit buffer is re-formatted on every keystroke.
    pub fn is_masked(&self) -> bool {
        matches!(
            self,
            FieldType::Currency | FieldType::NationalId | FieldType::BusinessId | FieldType::Phone
        )
    }
}

/// One value/label pair of an enumerated option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "rotulo")]
    pub label: String,
}

impl FieldOption {
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// One column of a module.
///
/// `technical_name` is unique within its module and is the key used in record
/// content. `order` defines display and form order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Uuid,
    #[serde(rename = "modulo_id")]
    pub module_id: Uuid,
    #[serde(rename = "nome_tecnico")]
    pub technical_name: String,
    #[serde(rename = "rotulo")]
    pub label: String,
    #[serde(rename = "tipo")]
    pub field_type: FieldType,
    #[serde(rename = "obrigatorio", default)]
    pub required: bool,
    #[serde(rename = "ordem", default)]
    pub order: i32,
    #[serde(rename = "opcoes", default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(rename = "mascara", default)]
    pub mask: Option<String>,
    #[serde(rename = "catalogo_id", default)]
    pub catalog_id: Option<Uuid>,
    #[serde(rename = "modulo_referencia_id", default)]
    pub reference_module_id: Option<Uuid>,
}

/// A field as submitted by the module builder, before it has an id or a
/// technical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub catalog_id: Option<Uuid>,
    #[serde(default)]
    pub reference_module_id: Option<Uuid>,
}

impl FieldDraft {
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
            required: false,
            options: None,
            mask: None,
            catalog_id: None,
            reference_module_id: None,
        }
    }

    /// Materialises the draft into a definition of `module_id`.
    pub fn into_definition(
        self,
        module_id: Uuid,
        technical_name: String,
        order: i32,
    ) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            module_id,
            technical_name,
            label: self.label,
            field_type: self.field_type,
            required: self.required,
            order,
            options: self.options,
            mask: self.mask,
            catalog_id: self.catalog_id,
            reference_module_id: self.reference_module_id,
        }
    }
}
