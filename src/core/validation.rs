//! Validation rules for land payloads.
//!
//! Custom-field rules are built from the active field definitions every time a payload
//! is validated, never cached, because definitions can change between requests. The
//! rules for the fixed columns are static. Both sets run to completion so the caller
//! gets every failing path at once.

use crate::{
    core::{
        attributes::{AttributeBag, AttributeValue, parse_calendar_date},
        field::{self, Visibility},
        land::{LandColumns, LandPayload},
    },
    entities::{FieldType, field_definition},
    errors::{Error, FieldViolation, Result},
};
use sea_orm::ConnectionTrait;
use tracing::debug;

/// Maximum length of a fixed text column, in characters.
pub const MAX_TEXT_CHARS: usize = 255;

/// Prefix of every custom-field rule path.
pub const ADDITIONAL_DATA: &str = "additional_data";

/// Whether a value must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing or blank fails
    Required,
    /// Missing or blank passes and is dropped
    Optional,
}

/// Shape a present value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    /// A number, or text that parses as one
    Numeric,
    /// Text that parses as a calendar date
    Date,
    /// A list of strings, possibly empty
    List,
    /// Text
    Text,
}

impl From<FieldType> for TypeRule {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Number => Self::Numeric,
            FieldType::Date => Self::Date,
            FieldType::Checkbox => Self::List,
            FieldType::Text | FieldType::Textarea | FieldType::Select | FieldType::Radio => {
                Self::Text
            }
        }
    }
}

/// The composed rule for one custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Attribute-bag key the rule reads
    pub key: String,
    /// Reported path, `additional_data.<key>`
    pub path: String,
    /// Requiredness
    pub presence: Presence,
    /// Type-specific check
    pub type_rule: TypeRule,
}

impl FieldRule {
    /// Builds the rule for a definition.
    #[must_use]
    pub fn for_field(field: &field_definition::Model) -> Self {
        Self {
            key: field.key.clone(),
            path: format!("{ADDITIONAL_DATA}.{}", field.key),
            presence: if field.required {
                Presence::Required
            } else {
                Presence::Optional
            },
            type_rule: TypeRule::from(field.field_type),
        }
    }

    /// Checks one value. `Ok(None)` means the entry should not be stored; `Ok(Some)`
    /// carries the normalized value.
    pub fn check(
        &self,
        value: Option<&AttributeValue>,
    ) -> std::result::Result<Option<AttributeValue>, String> {
        let blank = value.is_none_or(AttributeValue::is_blank);
        if blank {
            return match (self.presence, value) {
                (Presence::Required, _) => Err("is required".to_string()),
                // An empty selection is still a selection
                (Presence::Optional, Some(AttributeValue::List(items))) => {
                    Ok(Some(AttributeValue::List(items.clone())))
                }
                (Presence::Optional, _) => Ok(None),
            };
        }
        let Some(value) = value else {
            return Ok(None);
        };

        match (self.type_rule, value) {
            (TypeRule::Numeric, AttributeValue::Number(number)) if number.is_finite() => {
                Ok(Some(value.clone()))
            }
            (TypeRule::Numeric, AttributeValue::Text(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(|number| Some(AttributeValue::Number(number)))
                .ok_or_else(|| "must be a number".to_string()),
            (TypeRule::Numeric, _) => Err("must be a number".to_string()),
            (TypeRule::Date, AttributeValue::Text(text)) if parse_calendar_date(text).is_some() => {
                Ok(Some(value.clone()))
            }
            (TypeRule::Date, _) => Err("must be a valid date".to_string()),
            (TypeRule::List, AttributeValue::List(_)) => Ok(Some(value.clone())),
            (TypeRule::List, _) => Err("must be a list".to_string()),
            (TypeRule::Text, AttributeValue::Text(_)) => Ok(Some(value.clone())),
            (TypeRule::Text, _) => Err("must be a string".to_string()),
        }
    }
}

/// Rules for every active field, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Builds rules for the active definitions in `fields`; inactive ones are skipped.
    #[must_use]
    pub fn for_fields(fields: &[field_definition::Model]) -> Self {
        Self {
            rules: fields
                .iter()
                .filter(|field| field.active)
                .map(FieldRule::for_field)
                .collect(),
        }
    }

    /// The individual rules.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Applies every rule to `bag`.
    ///
    /// Returns the normalized bag and all violations. Keys without a rule pass through
    /// untouched; the bag is schemaless to storage.
    #[must_use]
    pub fn apply(&self, bag: &AttributeBag) -> (AttributeBag, Vec<FieldViolation>) {
        let mut normalized = bag.clone();
        let mut violations = Vec::new();

        for rule in &self.rules {
            match rule.check(bag.get(&rule.key)) {
                Ok(Some(value)) => {
                    normalized.insert(rule.key.clone(), value);
                }
                Ok(None) => {
                    normalized.remove(&rule.key);
                }
                Err(message) => violations.push(FieldViolation::new(rule.path.clone(), message)),
            }
        }

        (normalized, violations)
    }
}

/// A land payload that passed every rule, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    /// Fixed columns with blank text normalized to `None`
    pub columns: LandColumns,
    /// Polygon as `[longitude, latitude]` pairs
    pub coordinates: Option<Vec<[f64; 2]>>,
    /// Centroid
    pub coordinate: Option<[f64; 2]>,
    /// Normalized attribute bag
    pub additional_data: AttributeBag,
}

fn to_pair(values: &[f64]) -> Option<[f64; 2]> {
    match values {
        [longitude, latitude] if longitude.is_finite() && latitude.is_finite() => {
            Some([*longitude, *latitude])
        }
        _ => None,
    }
}

/// Checks the fixed columns and geometry.
fn check_fixed(payload: &LandPayload, violations: &mut Vec<FieldViolation>) -> ValidatedPayload {
    let mut columns = payload.columns.clone();

    for (name, value) in columns.text_columns_mut() {
        if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
            *value = None;
        }
        if value
            .as_deref()
            .is_some_and(|text| text.chars().count() > MAX_TEXT_CHARS)
        {
            violations.push(FieldViolation::new(
                name,
                format!("may not be longer than {MAX_TEXT_CHARS} characters"),
            ));
        }
    }
    for (name, value) in [("area", columns.area), ("map_area", columns.map_area)] {
        if value.is_some_and(|number| !number.is_finite()) {
            violations.push(FieldViolation::new(name, "must be a number"));
        }
    }

    let coordinates = payload.coordinates.as_ref().map(|pairs| {
        pairs
            .iter()
            .enumerate()
            .filter_map(|(index, pair)| {
                let checked = to_pair(pair);
                if checked.is_none() {
                    violations.push(FieldViolation::new(
                        format!("coordinates.{index}"),
                        "must contain exactly 2 numbers",
                    ));
                }
                checked
            })
            .collect::<Vec<_>>()
    });

    let coordinate = payload.coordinate.as_ref().and_then(|pair| {
        let checked = to_pair(pair);
        if checked.is_none() {
            violations.push(FieldViolation::new(
                "coordinate",
                "must contain exactly 2 numbers",
            ));
        }
        checked
    });

    ValidatedPayload {
        columns,
        coordinates,
        coordinate,
        additional_data: AttributeBag::new(),
    }
}

/// Validates `payload` against the given field definitions.
///
/// # Errors
/// Returns `Validation` listing every failing fixed-column and custom-field path.
pub fn validate_with_fields(
    fields: &[field_definition::Model],
    payload: &LandPayload,
) -> Result<ValidatedPayload> {
    let mut violations = Vec::new();
    let mut validated = check_fixed(payload, &mut violations);

    let (bag, field_violations) = RuleSet::for_fields(fields).apply(&payload.additional_data);
    violations.extend(field_violations);
    validated.additional_data = bag;

    if violations.is_empty() {
        Ok(validated)
    } else {
        debug!("Land payload rejected with {} violations", violations.len());
        Err(Error::Validation { violations })
    }
}

/// Validates `payload` against the field definitions active right now.
///
/// # Errors
/// Returns `Validation` for rule failures or a database error if the definitions
/// cannot be read.
pub async fn validate_land_payload<C>(db: &C, payload: &LandPayload) -> Result<ValidatedPayload>
where
    C: ConnectionTrait,
{
    let fields = field::list_active_fields(db, Visibility::Form).await?;
    validate_with_fields(&fields, payload)
}
