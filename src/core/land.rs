//! Land record business logic - create, update and delete parcels.
//!
//! Every write validates against the field definitions read in the same operation and
//! stores the fixed columns together with the attribute bag in a single statement.
//! Updates keep bag entries for keys that are not active fields unless the payload
//! overrides them, so deactivating a field never loses data already stored under it.

use crate::{
    core::{
        attributes::AttributeBag,
        codec::{self, FlatFormData},
        field::{self, Visibility},
        render::{self, RenderedField},
        validation::{self, ValidatedPayload},
    },
    entities::{Certificate, Land, certificate, land},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// The fixed administrative columns of a land record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandColumns {
    /// Administrative region code
    pub region_code: Option<String>,
    /// District (kecamatan)
    pub district: Option<String>,
    /// Village (kelurahan)
    pub village: Option<String>,
    /// Type of land right
    pub rights_type: Option<String>,
    /// Registration year
    pub year: Option<i32>,
    /// Parcel identification number
    pub parcel_number: Option<String>,
    /// Land use
    pub land_use: Option<String>,
    /// Rights certificate number
    pub rights_number: Option<String>,
    /// Survey letter number
    pub survey_letter: Option<String>,
    /// Registered area in square metres
    pub area: Option<f64>,
    /// Registration product
    pub product: Option<String>,
    /// Area measured on the map
    pub map_area: Option<f64>,
    /// Map quality class
    pub quality_class: Option<String>,
    /// Owner on the rights document
    pub primary_owner: Option<String>,
    /// Owner on the deed
    pub secondary_owner: Option<String>,
}

impl LandColumns {
    /// Names of the text columns, in form order.
    pub const TEXT_COLUMNS: [&'static str; 12] = [
        "region_code",
        "district",
        "village",
        "rights_type",
        "parcel_number",
        "land_use",
        "rights_number",
        "survey_letter",
        "product",
        "quality_class",
        "primary_owner",
        "secondary_owner",
    ];

    /// Text columns paired with their names, in [`Self::TEXT_COLUMNS`] order.
    pub fn text_columns_mut(&mut self) -> [(&'static str, &mut Option<String>); 12] {
        [
            ("region_code", &mut self.region_code),
            ("district", &mut self.district),
            ("village", &mut self.village),
            ("rights_type", &mut self.rights_type),
            ("parcel_number", &mut self.parcel_number),
            ("land_use", &mut self.land_use),
            ("rights_number", &mut self.rights_number),
            ("survey_letter", &mut self.survey_letter),
            ("product", &mut self.product),
            ("quality_class", &mut self.quality_class),
            ("primary_owner", &mut self.primary_owner),
            ("secondary_owner", &mut self.secondary_owner),
        ]
    }

    /// Text columns paired with their names, read-only.
    #[must_use]
    pub fn text_columns(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("region_code", self.region_code.as_deref()),
            ("district", self.district.as_deref()),
            ("village", self.village.as_deref()),
            ("rights_type", self.rights_type.as_deref()),
            ("parcel_number", self.parcel_number.as_deref()),
            ("land_use", self.land_use.as_deref()),
            ("rights_number", self.rights_number.as_deref()),
            ("survey_letter", self.survey_letter.as_deref()),
            ("product", self.product.as_deref()),
            ("quality_class", self.quality_class.as_deref()),
            ("primary_owner", self.primary_owner.as_deref()),
            ("secondary_owner", self.secondary_owner.as_deref()),
        ]
    }

    /// Copies the fixed columns out of a stored record.
    #[must_use]
    pub fn from_model(land: &land::Model) -> Self {
        Self {
            region_code: land.region_code.clone(),
            district: land.district.clone(),
            village: land.village.clone(),
            rights_type: land.rights_type.clone(),
            year: land.year,
            parcel_number: land.parcel_number.clone(),
            land_use: land.land_use.clone(),
            rights_number: land.rights_number.clone(),
            survey_letter: land.survey_letter.clone(),
            area: land.area,
            product: land.product.clone(),
            map_area: land.map_area,
            quality_class: land.quality_class.clone(),
            primary_owner: land.primary_owner.clone(),
            secondary_owner: land.secondary_owner.clone(),
        }
    }
}

/// A submitted land record before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandPayload {
    /// Fixed columns
    pub columns: LandColumns,
    /// Polygon; every entry must be a `[longitude, latitude]` pair
    pub coordinates: Option<Vec<Vec<f64>>>,
    /// Centroid; must be a `[longitude, latitude]` pair
    pub coordinate: Option<Vec<f64>>,
    /// Custom-field values
    pub additional_data: AttributeBag,
}

/// Everything a land create/edit form needs: one widget per active field plus the
/// current values in wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct LandForm {
    /// Widgets for the active fields, in render order
    pub fields: Vec<RenderedField>,
    /// Current values, fixed columns and attribute bag alike
    pub data: FlatFormData,
}

/// Reads the attribute bag of a stored record.
#[must_use]
pub fn attribute_bag(land: &land::Model) -> AttributeBag {
    AttributeBag::from_json(&land.additional_data)
}

fn pairs_to_json(pairs: &[[f64; 2]]) -> Json {
    Json::Array(pairs.iter().map(|pair| pair_to_json(*pair)).collect())
}

fn pair_to_json(pair: [f64; 2]) -> Json {
    Json::Array(
        pair.iter()
            .map(|value| serde_json::Number::from_f64(*value).map_or(Json::Null, Json::Number))
            .collect(),
    )
}

fn apply_validated(model: &mut land::ActiveModel, validated: ValidatedPayload) {
    let ValidatedPayload {
        columns,
        coordinates,
        coordinate,
        additional_data,
    } = validated;

    model.region_code = Set(columns.region_code);
    model.district = Set(columns.district);
    model.village = Set(columns.village);
    model.rights_type = Set(columns.rights_type);
    model.year = Set(columns.year);
    model.parcel_number = Set(columns.parcel_number);
    model.land_use = Set(columns.land_use);
    model.rights_number = Set(columns.rights_number);
    model.survey_letter = Set(columns.survey_letter);
    model.area = Set(columns.area);
    model.product = Set(columns.product);
    model.map_area = Set(columns.map_area);
    model.quality_class = Set(columns.quality_class);
    model.primary_owner = Set(columns.primary_owner);
    model.secondary_owner = Set(columns.secondary_owner);
    model.coordinates = Set(coordinates.as_deref().map(pairs_to_json));
    model.coordinate = Set(coordinate.map(pair_to_json));
    model.additional_data = Set(additional_data.to_json());
    model.updated_at = Set(chrono::Utc::now());
}

/// Retrieves a land record by id.
pub async fn get_land(db: &DatabaseConnection, land_id: i64) -> Result<Option<land::Model>> {
    Land::find_by_id(land_id).one(db).await.map_err(Into::into)
}

/// Validates and stores a new land record.
///
/// # Errors
/// Returns `Validation` listing every failing path, or a database error.
pub async fn create_land(db: &DatabaseConnection, payload: &LandPayload) -> Result<land::Model> {
    let validated = validation::validate_land_payload(db, payload).await?;

    let now = chrono::Utc::now();
    let mut model = land::ActiveModel {
        created_at: Set(now),
        ..Default::default()
    };
    apply_validated(&mut model, validated);

    let created = model.insert(db).await?;
    info!("Created land record {}", created.id);
    Ok(created)
}

/// Decodes a submitted form and stores it as a new land record.
///
/// Decoding problems (unparseable year, malformed coordinates) are reported together
/// with the rule violations.
pub async fn create_land_from_form(
    db: &DatabaseConnection,
    form: &FlatFormData,
) -> Result<land::Model> {
    let fields = field::list_active_fields(db, Visibility::Form).await?;
    let payload = decode_checked(&fields, form)?;
    create_land(db, &payload).await
}

fn decode_checked(
    fields: &[crate::entities::FieldDefinitionModel],
    form: &FlatFormData,
) -> Result<LandPayload> {
    let (payload, mut violations) = codec::decode_land_form(fields, form);
    if violations.is_empty() {
        return Ok(payload);
    }
    if let Err(err) = validation::validate_with_fields(fields, &payload) {
        violations.extend(err.violations());
    }
    Err(Error::Validation { violations })
}

/// Validates against the current schema and replaces a land record's data.
///
/// Active-field entries take the submitted values (absent means removed); entries
/// under any other key survive unless the payload supplies them.
///
/// # Errors
/// Returns `LandNotFound`, `Validation` or a database error.
pub async fn update_land(
    db: &DatabaseConnection,
    land_id: i64,
    payload: &LandPayload,
) -> Result<land::Model> {
    let txn = db.begin().await?;

    let existing = Land::find_by_id(land_id)
        .one(&txn)
        .await?
        .ok_or(Error::LandNotFound { id: land_id })?;

    let fields = field::list_active_fields(&txn, Visibility::Form).await?;
    let mut validated = validation::validate_with_fields(&fields, payload)?;

    let active_keys: HashSet<&str> = fields.iter().map(|field| field.key.as_str()).collect();
    for (key, value) in attribute_bag(&existing) {
        if !active_keys.contains(key.as_str()) && !validated.additional_data.contains_key(&key) {
            validated.additional_data.insert(key, value);
        }
    }

    let mut model: land::ActiveModel = existing.into();
    apply_validated(&mut model, validated);
    let updated = model.update(&txn).await?;

    txn.commit().await?;
    info!("Updated land record {}", updated.id);
    Ok(updated)
}

/// Decodes a submitted form and applies it to an existing land record.
pub async fn update_land_from_form(
    db: &DatabaseConnection,
    land_id: i64,
    form: &FlatFormData,
) -> Result<land::Model> {
    let fields = field::list_active_fields(db, Visibility::Form).await?;
    let payload = decode_checked(&fields, form)?;
    update_land(db, land_id, &payload).await
}

/// Deletes a land record together with its certificate rows.
///
/// Stored certificate documents are not touched; remove them through
/// [`crate::core::certificate::delete_certificate`] first if they should go too.
///
/// # Errors
/// Returns `LandNotFound` if no record has this id.
pub async fn delete_land(db: &DatabaseConnection, land_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    Certificate::delete_many()
        .filter(certificate::Column::LandId.eq(land_id))
        .exec(&txn)
        .await?;
    let result = Land::delete_by_id(land_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::LandNotFound { id: land_id });
    }

    txn.commit().await?;
    info!("Deleted land record {}", land_id);
    Ok(())
}

/// Builds the create form (`land_id = None`) or the edit form for a record.
///
/// # Errors
/// Returns `LandNotFound` when editing a missing record.
pub async fn land_form(db: &DatabaseConnection, land_id: Option<i64>) -> Result<LandForm> {
    let fields = field::list_active_fields(db, Visibility::Form).await?;

    let (bag, data) = match land_id {
        Some(id) => {
            let land = get_land(db, id)
                .await?
                .ok_or(Error::LandNotFound { id })?;
            (attribute_bag(&land), codec::encode_for_form(&fields, &land))
        }
        None => (
            AttributeBag::new(),
            codec::encode_bag(&fields, &AttributeBag::new()),
        ),
    };

    Ok(LandForm {
        fields: render::render_form(&fields, &bag, &[]),
        data,
    })
}
