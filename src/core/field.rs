//! Field definition business logic - The custom-field schema store.
//!
//! Definitions are validated as a whole before any write: every failing input is
//! reported together. Key uniqueness is checked up front and enforced again by the
//! table's unique constraint, so two concurrent creates with the same key still end in
//! a `Conflict` for the slower one. Reads always hit the database; callers fetch a fresh
//! snapshot per operation so the current schema wins.

use crate::{
    entities::{FieldDefinition, FieldType, field_definition},
    errors::{Error, FieldViolation, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

const MAX_LABEL_CHARS: usize = 255;

const fn default_true() -> bool {
    true
}

/// Everything an administrator supplies when creating or editing a field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinitionInput {
    /// Attribute-bag key, lowercase ASCII letters and underscores only
    pub key: String,
    /// Display label
    pub label: String,
    /// Input type
    pub field_type: FieldType,
    /// Choices for select, radio and checkbox fields
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Show as a land table column
    #[serde(default = "default_true")]
    pub visible_in_list: bool,
    /// Show in the land detail view
    #[serde(default = "default_true")]
    pub visible_in_detail: bool,
    /// Reject land payloads without a value
    #[serde(default)]
    pub required: bool,
    /// Take part in forms, validation and views
    #[serde(default = "default_true")]
    pub active: bool,
    /// Sort position; on create `None` appends after the current maximum, on update
    /// `None` keeps the stored position
    #[serde(default)]
    pub order: Option<i32>,
}

impl FieldDefinitionInput {
    /// Input with the same defaults a fresh admin form starts with: visible everywhere,
    /// optional, active, appended at the end.
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            options: None,
            visible_in_list: true,
            visible_in_detail: true,
            required: false,
            active: true,
            order: None,
        }
    }

    /// Sets the option list.
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as inactive.
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Sets an explicit sort position.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    fn stored_options(&self) -> Option<Json> {
        self.options
            .as_ref()
            .filter(|options| !options.is_empty())
            .map(|options| Json::Array(options.iter().cloned().map(Json::String).collect()))
    }
}

/// Optional constraints for [`list_fields`]; `None` means "either".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FieldFilter {
    /// Match the `active` flag
    pub active: Option<bool>,
    /// Match the `visible_in_list` flag
    pub visible_in_list: Option<bool>,
    /// Match the `visible_in_detail` flag
    pub visible_in_detail: Option<bool>,
}

/// The surface active fields are listed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Land create/edit forms and validation: every active field
    Form,
    /// Land table columns
    List,
    /// Land detail view
    Detail,
}

/// One entry of a reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Definition to move
    pub id: i64,
    /// New sort position
    pub order: i32,
}

/// Whether `key` matches `^[a-z_]+$`.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

/// Checks everything about a definition that needs no database access.
#[must_use]
pub fn validate_definition(input: &FieldDefinitionInput) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if input.key.is_empty() {
        violations.push(FieldViolation::new("key", "is required"));
    } else if !is_valid_key(&input.key) {
        violations.push(FieldViolation::new(
            "key",
            "may only contain lowercase letters and underscores",
        ));
    }

    if input.label.trim().is_empty() {
        violations.push(FieldViolation::new("label", "is required"));
    } else if input.label.trim().chars().count() > MAX_LABEL_CHARS {
        violations.push(FieldViolation::new(
            "label",
            format!("may not be longer than {MAX_LABEL_CHARS} characters"),
        ));
    }

    let options = input.options.as_deref().unwrap_or_default();
    if input.field_type.requires_options() && options.is_empty() {
        violations.push(FieldViolation::new(
            "options",
            format!("are required for {} fields", input.field_type.as_str()),
        ));
    }
    for (index, option) in options.iter().enumerate() {
        if option.trim().is_empty() {
            violations.push(FieldViolation::new(
                format!("options.{index}"),
                "may not be empty",
            ));
        }
    }

    if input.order.is_some_and(|order| order < 0) {
        violations.push(FieldViolation::new("order", "must be at least 0"));
    }

    violations
}

/// Runs the definition rules plus the key uniqueness check.
///
/// A taken key on an otherwise valid definition is a `Conflict`; alongside other
/// failures it is reported as one more violation on `key`.
async fn check_definition<C>(db: &C, input: &FieldDefinitionInput, own_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut violations = validate_definition(input);

    let key_taken = if is_valid_key(&input.key) {
        let mut query = FieldDefinition::find().filter(field_definition::Column::Key.eq(input.key.as_str()));
        if let Some(id) = own_id {
            query = query.filter(field_definition::Column::Id.ne(id));
        }
        query.one(db).await?.is_some()
    } else {
        false
    };

    match (violations.is_empty(), key_taken) {
        (true, false) => Ok(()),
        (true, true) => Err(Error::Conflict {
            key: input.key.clone(),
        }),
        (false, taken) => {
            if taken {
                violations.push(FieldViolation::new("key", "has already been taken"));
            }
            Err(Error::Validation { violations })
        }
    }
}

/// Highest stored sort position plus one; `1` for the first definition.
async fn next_order<C>(db: &C) -> Result<i32>
where
    C: ConnectionTrait,
{
    let last = FieldDefinition::find()
        .order_by_desc(field_definition::Column::Order)
        .one(db)
        .await?;
    Ok(last.map_or(0, |field| field.order).saturating_add(1))
}

/// Creates a field definition.
///
/// # Errors
/// Returns an error if:
/// - The key, label, options or order are invalid (`Validation`)
/// - The key is already used by another definition (`Conflict`)
/// - The database insert fails
pub async fn create_field(
    db: &DatabaseConnection,
    input: FieldDefinitionInput,
) -> Result<field_definition::Model> {
    check_definition(db, &input, None).await?;

    let order = match input.order {
        Some(order) => order,
        None => next_order(db).await?,
    };
    let now = chrono::Utc::now();

    let field = field_definition::ActiveModel {
        key: Set(input.key.clone()),
        label: Set(input.label.trim().to_string()),
        field_type: Set(input.field_type),
        options: Set(input.stored_options()),
        visible_in_list: Set(input.visible_in_list),
        visible_in_detail: Set(input.visible_in_detail),
        required: Set(input.required),
        active: Set(input.active),
        order: Set(order),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = field
        .insert(db)
        .await
        .map_err(|e| Error::from_key_write(e, &input.key))?;
    info!(
        "Created field definition '{}' ({}) at order {}",
        created.key,
        created.field_type.as_str(),
        created.order
    );
    Ok(created)
}

/// Replaces a field definition's attributes. Changing the type takes effect
/// immediately for all later validation and rendering; stored values are untouched.
///
/// # Errors
/// Returns an error if:
/// - No definition has this id (`FieldNotFound`)
/// - The input is invalid (`Validation`)
/// - The key is used by a different definition (`Conflict`)
pub async fn update_field(
    db: &DatabaseConnection,
    field_id: i64,
    input: FieldDefinitionInput,
) -> Result<field_definition::Model> {
    let mut field: field_definition::ActiveModel = FieldDefinition::find_by_id(field_id)
        .one(db)
        .await?
        .ok_or(Error::FieldNotFound { id: field_id })?
        .into();

    check_definition(db, &input, Some(field_id)).await?;

    field.key = Set(input.key.clone());
    field.label = Set(input.label.trim().to_string());
    field.field_type = Set(input.field_type);
    field.options = Set(input.stored_options());
    field.visible_in_list = Set(input.visible_in_list);
    field.visible_in_detail = Set(input.visible_in_detail);
    field.required = Set(input.required);
    field.active = Set(input.active);
    if let Some(order) = input.order {
        field.order = Set(order);
    }
    field.updated_at = Set(chrono::Utc::now());

    let updated = field
        .update(db)
        .await
        .map_err(|e| Error::from_key_write(e, &input.key))?;
    info!("Updated field definition {} ('{}')", updated.id, updated.key);
    Ok(updated)
}

/// Deletes a field definition. Land records keep whatever they stored under its key.
///
/// # Errors
/// Returns `FieldNotFound` if no definition has this id.
pub async fn delete_field(db: &DatabaseConnection, field_id: i64) -> Result<()> {
    let result = FieldDefinition::delete_by_id(field_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::FieldNotFound { id: field_id });
    }
    info!("Deleted field definition {}", field_id);
    Ok(())
}

/// Retrieves a field definition by id.
pub async fn get_field(
    db: &DatabaseConnection,
    field_id: i64,
) -> Result<Option<field_definition::Model>> {
    FieldDefinition::find_by_id(field_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists definitions matching `filter`, by sort position, newest first among equal
/// positions.
pub async fn list_fields<C>(db: &C, filter: FieldFilter) -> Result<Vec<field_definition::Model>>
where
    C: ConnectionTrait,
{
    let mut query = FieldDefinition::find();
    if let Some(active) = filter.active {
        query = query.filter(field_definition::Column::Active.eq(active));
    }
    if let Some(visible) = filter.visible_in_list {
        query = query.filter(field_definition::Column::VisibleInList.eq(visible));
    }
    if let Some(visible) = filter.visible_in_detail {
        query = query.filter(field_definition::Column::VisibleInDetail.eq(visible));
    }

    query
        .order_by_asc(field_definition::Column::Order)
        .order_by_desc(field_definition::Column::CreatedAt)
        .order_by_desc(field_definition::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active definitions for one surface, in render order. Inactive definitions are
/// excluded whatever their visibility flags say.
pub async fn list_active_fields<C>(
    db: &C,
    visibility: Visibility,
) -> Result<Vec<field_definition::Model>>
where
    C: ConnectionTrait,
{
    let filter = match visibility {
        Visibility::Form => FieldFilter {
            active: Some(true),
            ..FieldFilter::default()
        },
        Visibility::List => FieldFilter {
            active: Some(true),
            visible_in_list: Some(true),
            ..FieldFilter::default()
        },
        Visibility::Detail => FieldFilter {
            active: Some(true),
            visible_in_detail: Some(true),
            ..FieldFilter::default()
        },
    };
    list_fields(db, filter).await
}

/// Applies a batch of sort positions atomically.
///
/// Every id is checked before anything is written; one unknown id rejects the whole
/// batch. Concurrent batches are last-write-wins per id.
///
/// # Errors
/// Returns an error if:
/// - The batch is empty or holds a negative order (`Validation`)
/// - Any id does not exist (`FieldNotFound` naming the first unknown id)
/// - The database update fails
pub async fn reorder_fields(db: &DatabaseConnection, updates: &[OrderUpdate]) -> Result<()> {
    if updates.is_empty() {
        return Err(Error::invalid("orders", "at least one entry is required"));
    }
    let violations: Vec<FieldViolation> = updates
        .iter()
        .enumerate()
        .filter(|(_, update)| update.order < 0)
        .map(|(index, _)| FieldViolation::new(format!("orders.{index}.order"), "must be at least 0"))
        .collect();
    if !violations.is_empty() {
        return Err(Error::Validation { violations });
    }

    let txn = db.begin().await?;

    let ids: Vec<i64> = updates.iter().map(|update| update.id).collect();
    let existing: HashSet<i64> = FieldDefinition::find()
        .filter(field_definition::Column::Id.is_in(ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|field| field.id)
        .collect();
    if let Some(missing) = updates.iter().find(|update| !existing.contains(&update.id)) {
        debug!("Rejecting reorder batch: unknown field {}", missing.id);
        return Err(Error::FieldNotFound { id: missing.id });
    }

    let now = chrono::Utc::now();
    for update in updates {
        FieldDefinition::update_many()
            .col_expr(field_definition::Column::Order, Expr::value(update.order))
            .col_expr(field_definition::Column::UpdatedAt, Expr::value(now))
            .filter(field_definition::Column::Id.eq(update.id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;
    info!("Reordered {} field definitions", updates.len());
    Ok(())
}

/// Creates every seed definition whose key does not exist yet and returns how many were
/// created. Existing definitions are left exactly as they are.
pub async fn seed_field_definitions(
    db: &DatabaseConnection,
    seeds: &[FieldDefinitionInput],
) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        let exists = FieldDefinition::find()
            .filter(field_definition::Column::Key.eq(seed.key.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Field definition '{}' already present, not seeding", seed.key);
            continue;
        }
        create_field(db, seed.clone()).await?;
        created += 1;
    }
    info!("Seeded {} of {} field definitions", created, seeds.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_key_pattern() {
        assert!(is_valid_key("tahun_terbit"));
        assert!(is_valid_key("_"));
        assert!(!is_valid_key("Tahun-Terbit"));
        assert!(!is_valid_key("tahun terbit"));
        assert!(!is_valid_key("tahun2"));
        assert!(!is_valid_key(""));
    }

    #[test]
    fn test_validate_definition_reports_every_failure() {
        let input = FieldDefinitionInput::new("Bad-Key", " ", FieldType::Radio).with_order(-1);
        let paths: Vec<String> = validate_definition(&input)
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(paths, vec!["key", "label", "options", "order"]);
    }

    #[test]
    fn test_label_length_ignores_surrounding_whitespace() {
        let padded = format!("{}{}", " ".repeat(10), "x".repeat(MAX_LABEL_CHARS - 5));
        let input = FieldDefinitionInput::new("catatan", padded, FieldType::Text);
        assert!(validate_definition(&input).is_empty());

        let too_long =
            FieldDefinitionInput::new("catatan", "x".repeat(MAX_LABEL_CHARS + 1), FieldType::Text);
        let paths: Vec<String> = validate_definition(&too_long)
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(paths, vec!["label"]);
    }

    #[test]
    fn test_validate_definition_rejects_blank_option() {
        let input =
            FieldDefinitionInput::new("status", "Status", FieldType::Select).with_options(["A", ""]);
        let violations = validate_definition(&input);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "options.1");
    }

    #[tokio::test]
    async fn test_create_field_rejects_bad_key_before_querying() -> Result<()> {
        // A malformed key never reaches the uniqueness query, so an empty mock is enough
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_field(
            &db,
            FieldDefinitionInput::new("Tahun-Terbit", "Tahun Terbit", FieldType::Number),
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.violations()[0].path, "key");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_field_requires_options() -> Result<()> {
        let db = setup_test_db().await?;

        for field_type in [FieldType::Select, FieldType::Radio, FieldType::Checkbox] {
            let result = create_field(&db, FieldDefinitionInput::new("pilihan", "Pilihan", field_type)).await;
            assert!(matches!(result, Err(Error::Validation { .. })));

            let empty = FieldDefinitionInput::new("pilihan", "Pilihan", field_type)
                .with_options(Vec::<String>::new());
            let result = create_field(&db, empty).await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }

        // Accepted once options are given, and the key pattern allows underscores
        create_field(
            &db,
            FieldDefinitionInput::new("tahun_terbit", "Pilihan", FieldType::Radio).with_options(["A"]),
        )
        .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_field_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let field = create_field(
            &db,
            FieldDefinitionInput::new("sumber_data", "  Sumber Data ", FieldType::Select)
                .with_options(["BPN", "Desa"])
                .required(),
        )
        .await?;

        assert_eq!(field.key, "sumber_data");
        assert_eq!(field.label, "Sumber Data");
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.option_list(), vec!["BPN", "Desa"]);
        assert!(field.required);
        assert!(field.active);
        assert!(field.visible_in_list);
        assert!(field.visible_in_detail);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_field_assigns_next_order() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_field(&db, "pertama", FieldType::Text).await?;
        assert_eq!(first.order, 1);

        create_field(
            &db,
            FieldDefinitionInput::new("kedua", "Kedua", FieldType::Text).with_order(10),
        )
        .await?;
        let third = create_test_field(&db, "ketiga", FieldType::Text).await?;
        assert_eq!(third.order, 11);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_field_duplicate_key_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_field(&db, "tahun_terbit", FieldType::Number).await?;

        let result = create_test_field(&db, "tahun_terbit", FieldType::Text).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Conflict { ref key } if key == "tahun_terbit"));
        assert_eq!(err.violations()[0].path, "key");

        // Duplicate keys are also rejected against inactive definitions
        create_field(
            &db,
            FieldDefinitionInput::new("arsip", "Arsip", FieldType::Text).inactive(),
        )
        .await?;
        let result = create_test_field(&db, "arsip", FieldType::Text).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_key_with_other_failures_is_one_validation_error() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_field(&db, "status", FieldType::Text).await?;

        let result = create_field(&db, FieldDefinitionInput::new("status", "", FieldType::Text)).await;
        let err = result.unwrap_err();
        let paths: Vec<String> = err.violations().into_iter().map(|v| v.path).collect();
        assert_eq!(paths, vec!["label", "key"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_constraint_is_enforced_by_the_table() -> Result<()> {
        let db = setup_test_db().await?;
        let existing = create_test_field(&db, "nomor_arsip", FieldType::Text).await?;

        // Bypass the application check to simulate the losing side of a race
        let now = chrono::Utc::now();
        let duplicate = field_definition::ActiveModel {
            key: Set(existing.key.clone()),
            label: Set("Nomor Arsip".to_string()),
            field_type: Set(FieldType::Text),
            options: Set(None),
            visible_in_list: Set(true),
            visible_in_detail: Set(true),
            required: Set(false),
            active: Set(true),
            order: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let err = duplicate
            .insert(&db)
            .await
            .map_err(|e| Error::from_key_write(e, &existing.key))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_field_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let field = create_test_field(&db, "catatan", FieldType::Text).await?;
        let other = create_test_field(&db, "lainnya", FieldType::Text).await?;

        // Keeping its own key is not a conflict; omitted order keeps the stored one
        let updated = update_field(
            &db,
            field.id,
            FieldDefinitionInput::new("catatan", "Catatan Panjang", FieldType::Textarea),
        )
        .await?;
        assert_eq!(updated.label, "Catatan Panjang");
        assert_eq!(updated.field_type, FieldType::Textarea);
        assert_eq!(updated.order, field.order);

        let result = update_field(
            &db,
            field.id,
            FieldDefinitionInput::new(other.key.clone(), "Catatan", FieldType::Text),
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        let result = update_field(
            &db,
            field.id,
            FieldDefinitionInput::new("catatan", "Catatan", FieldType::Checkbox),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = update_field(
            &db,
            999,
            FieldDefinitionInput::new("catatan", "Catatan", FieldType::Text),
        )
        .await;
        assert!(matches!(result, Err(Error::FieldNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_field() -> Result<()> {
        let db = setup_test_db().await?;
        let field = create_test_field(&db, "sementara", FieldType::Text).await?;

        delete_field(&db, field.id).await?;
        assert!(get_field(&db, field.id).await?.is_none());

        let result = delete_field(&db, field.id).await;
        assert!(matches!(result, Err(Error::FieldNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_fields_ordering_and_filters() -> Result<()> {
        let db = setup_test_db().await?;

        let late = create_field(
            &db,
            FieldDefinitionInput::new("akhir", "Akhir", FieldType::Text).with_order(5),
        )
        .await?;
        let tie_old = create_field(
            &db,
            FieldDefinitionInput::new("sama_lama", "Sama Lama", FieldType::Text).with_order(2),
        )
        .await?;
        let tie_new = create_field(
            &db,
            FieldDefinitionInput::new("sama_baru", "Sama Baru", FieldType::Text).with_order(2),
        )
        .await?;
        let mut hidden = FieldDefinitionInput::new("tersembunyi", "Tersembunyi", FieldType::Text)
            .inactive()
            .with_order(0);
        hidden.visible_in_list = true;
        let hidden = create_field(&db, hidden).await?;

        let all = list_fields(&db, FieldFilter::default()).await?;
        let ids: Vec<i64> = all.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![hidden.id, tie_new.id, tie_old.id, late.id]);

        let listed = list_active_fields(&db, Visibility::List).await?;
        assert!(listed.iter().all(|f| f.active));
        assert!(!listed.iter().any(|f| f.id == hidden.id));
        assert_eq!(listed.len(), 3);

        let inactive = list_fields(
            &db,
            FieldFilter {
                active: Some(false),
                ..FieldFilter::default()
            },
        )
        .await?;
        assert_eq!(inactive.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_fields_applies_batch() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_field(&db, "satu", FieldType::Text).await?;
        let b = create_test_field(&db, "dua", FieldType::Text).await?;

        reorder_fields(
            &db,
            &[
                OrderUpdate { id: a.id, order: 7 },
                OrderUpdate { id: b.id, order: 3 },
            ],
        )
        .await?;

        let fields = list_fields(&db, FieldFilter::default()).await?;
        assert_eq!(fields[0].id, b.id);
        assert_eq!(fields[0].order, 3);
        assert_eq!(fields[1].id, a.id);
        assert_eq!(fields[1].order, 7);

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_fields_is_all_or_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let field = create_test_field(&db, "satu", FieldType::Text).await?;

        let result = reorder_fields(
            &db,
            &[
                OrderUpdate { id: field.id, order: 5 },
                OrderUpdate { id: 999, order: 1 },
            ],
        )
        .await;
        assert!(matches!(result, Err(Error::FieldNotFound { id: 999 })));

        let unchanged = get_field(&db, field.id).await?.unwrap();
        assert_eq!(unchanged.order, field.order);

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_fields_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = reorder_fields(&db, &[]).await;
        assert_eq!(result.unwrap_err().violations()[0].path, "orders");

        let result = reorder_fields(
            &db,
            &[
                OrderUpdate { id: 1, order: 1 },
                OrderUpdate { id: 2, order: -4 },
            ],
        )
        .await;
        assert_eq!(result.unwrap_err().violations()[0].path, "orders.1.order");

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_field_definitions_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = vec![
            FieldDefinitionInput::new("sumber_data", "Sumber Data", FieldType::Select)
                .with_options(["BPN", "Desa"])
                .with_order(10),
            FieldDefinitionInput::new("tanggal_survey", "Tanggal Survey", FieldType::Date)
                .with_order(50),
        ];

        assert_eq!(seed_field_definitions(&db, &seeds).await?, 2);

        // Administrator edits survive a second seeding run
        let fields = list_fields(&db, FieldFilter::default()).await?;
        let mut edited = FieldDefinitionInput::new("sumber_data", "Asal Data", FieldType::Select)
            .with_options(["BPN"]);
        edited.order = Some(fields[0].order);
        update_field(&db, fields[0].id, edited).await?;

        assert_eq!(seed_field_definitions(&db, &seeds).await?, 0);
        let fields = list_fields(&db, FieldFilter::default()).await?;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "Asal Data");

        Ok(())
    }
}
