//! Shared test utilities for the land registry.
//!
//! This module provides helpers for setting up test databases and creating field
//! definitions, land records and certificates with sensible defaults.

use crate::{
    core::{
        field::{self, FieldDefinitionInput},
        land::{self, LandColumns, LandPayload},
    },
    entities::{CertificateModel, FieldDefinitionModel, FieldType, LandModel, certificate},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Options given to choice fields created by the helpers below.
pub const TEST_OPTIONS: [&str; 3] = ["A", "B", "C"];

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn label_for(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Creates a test field definition with sensible defaults.
///
/// # Defaults
/// * `label`: the key in title case (`tahun_terbit` becomes "Tahun Terbit")
/// * `options`: [`TEST_OPTIONS`] for select, radio and checkbox fields
/// * visible everywhere, optional, active, appended at the end
pub async fn create_test_field(
    db: &DatabaseConnection,
    key: &str,
    field_type: FieldType,
) -> Result<FieldDefinitionModel> {
    let mut input = FieldDefinitionInput::new(key, label_for(key), field_type);
    if field_type.requires_options() {
        input = input.with_options(TEST_OPTIONS);
    }
    field::create_field(db, input).await
}

/// Creates a field definition from a fully specified input.
/// Use this when a test needs specific flags or options.
pub async fn create_custom_field(
    db: &DatabaseConnection,
    input: FieldDefinitionInput,
) -> Result<FieldDefinitionModel> {
    field::create_field(db, input).await
}

/// Builds an active, optional definition without touching a database.
/// Choice types get [`TEST_OPTIONS`].
pub fn field_model(id: i64, key: &str, field_type: FieldType) -> FieldDefinitionModel {
    let now = chrono::Utc::now();
    FieldDefinitionModel {
        id,
        key: key.to_string(),
        label: label_for(key),
        field_type,
        options: field_type
            .requires_options()
            .then(|| serde_json::json!(TEST_OPTIONS)),
        visible_in_list: true,
        visible_in_detail: true,
        required: false,
        active: true,
        order: i32::try_from(id).unwrap_or(i32::MAX),
        created_at: now,
        updated_at: now,
    }
}

/// A valid land payload with no custom-field values.
///
/// # Defaults
/// * `district`: "Ngaliyan", `village`: "Wonosari"
/// * `year`: 2021, `area`: 120.5
/// * `primary_owner`: "Siti Aminah"
pub fn test_payload() -> LandPayload {
    LandPayload {
        columns: LandColumns {
            district: Some("Ngaliyan".to_string()),
            village: Some("Wonosari".to_string()),
            year: Some(2021),
            area: Some(120.5),
            primary_owner: Some("Siti Aminah".to_string()),
            ..LandColumns::default()
        },
        ..LandPayload::default()
    }
}

/// Creates a land record from [`test_payload`].
pub async fn create_test_land(db: &DatabaseConnection) -> Result<LandModel> {
    land::create_land(db, &test_payload()).await
}

/// Inserts certificate metadata directly, without a stored document.
pub async fn insert_test_certificate(
    db: &DatabaseConnection,
    land_id: i64,
    number: &str,
) -> Result<CertificateModel> {
    let now = chrono::Utc::now();
    let file_name = format!("{number}.pdf");
    let model = certificate::ActiveModel {
        land_id: Set(land_id),
        certificate_number: Set(number.to_string()),
        description: Set(None),
        file_path: Set(file_name.clone()),
        file_name: Set(file_name),
        file_type: Set("application/pdf".to_string()),
        file_size: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}
