//! Field definition entity - The administrator-authored schema of custom land attributes.
//!
//! Each row describes one dynamic attribute: the `key` it is stored under in a land's
//! `additional_data`, its display label, its input type, the choices for option-based
//! types, display/validation flags and a sort position.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Input type of a custom field. Decides the validation rule, the stored value shape
/// and the form widget.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text
    #[sea_orm(string_value = "text")]
    Text,
    /// Multi-line text
    #[sea_orm(string_value = "textarea")]
    Textarea,
    /// Single choice from a dropdown
    #[sea_orm(string_value = "select")]
    Select,
    /// Single choice from a radio group
    #[sea_orm(string_value = "radio")]
    Radio,
    /// Any subset of the options
    #[sea_orm(string_value = "checkbox")]
    Checkbox,
    /// Numeric value
    #[sea_orm(string_value = "number")]
    Number,
    /// Calendar date
    #[sea_orm(string_value = "date")]
    Date,
}

impl FieldType {
    /// Whether definitions of this type must carry a non-empty option list.
    #[must_use]
    pub const fn requires_options(self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::Checkbox)
    }

    /// The lowercase name used in storage and forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

/// Field definition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_field_definitions")]
pub struct Model {
    /// Unique identifier for the definition
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Attribute-bag key, `^[a-z_]+$`, unique across active and inactive definitions
    #[sea_orm(unique)]
    pub key: String,
    /// Display label
    pub label: String,
    /// Input type
    pub field_type: FieldType,
    /// JSON array of option strings for select/radio/checkbox, `None` otherwise
    pub options: Option<Json>,
    /// Shown as a column in the land table
    pub visible_in_list: bool,
    /// Shown in the land detail view
    pub visible_in_detail: bool,
    /// Empty values fail validation
    pub required: bool,
    /// Inactive definitions are ignored by forms, validation and views
    pub active: bool,
    /// Sort position, neither unique nor contiguous
    pub order: i32,
    /// When the definition was created
    pub created_at: DateTimeUtc,
    /// When the definition was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// The option list, empty when the definition has none or the stored JSON is not a
    /// list of strings.
    #[must_use]
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_ref()
            .and_then(|json| serde_json::from_value::<Vec<String>>(json.clone()).ok())
            .unwrap_or_default()
    }
}

/// Field definitions are referenced by key from land attribute bags, never by foreign key
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
