//! Flat form encoding of land records.
//!
//! Forms submit `name=value` pairs. Custom-field values live under
//! `additional_data[<key>]`, and checkbox selections repeat `additional_data[<key>][]`
//! once per selected option. Polygon and centroid travel as JSON text.

use crate::{
    core::{
        attributes::{AttributeBag, AttributeValue},
        land::{LandColumns, LandPayload, attribute_bag},
    },
    entities::{FieldDefinitionModel, FieldType, land},
    errors::FieldViolation,
};
use std::collections::HashSet;

const BAG_PREFIX: &str = "additional_data[";

/// Ordered `name=value` pairs as submitted by a form. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFormData(Vec<(String, String)>);

impl FlatFormData {
    /// Creates empty form data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value submitted under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name`, in submission order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// All pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for FlatFormData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Wire name of a single-valued custom field.
#[must_use]
pub fn bag_key(key: &str) -> String {
    format!("{BAG_PREFIX}{key}]")
}

/// Wire name repeated once per checkbox selection.
#[must_use]
pub fn bag_list_key(key: &str) -> String {
    format!("{BAG_PREFIX}{key}][]")
}

/// Splits `additional_data[key]` or `additional_data[key][]` into the key and whether it
/// is a list entry.
fn parse_bag_name(name: &str) -> Option<(&str, bool)> {
    let inner = name.strip_prefix(BAG_PREFIX)?;
    if let Some(key) = inner.strip_suffix("][]") {
        return Some((key, true));
    }
    inner.strip_suffix(']').map(|key| (key, false))
}

/// Turns the submitted entries for one field into a bag value. `None` means the entry
/// is absent.
///
/// Checkbox fields always decode to a list, so submitting no selection stores an empty
/// list. Number text that does not parse is kept as text for the validator to reject.
#[must_use]
pub fn decode_value(field_type: FieldType, entries: &[&str]) -> Option<AttributeValue> {
    if field_type == FieldType::Checkbox {
        return Some(AttributeValue::List(
            entries.iter().map(|entry| (*entry).to_string()).collect(),
        ));
    }

    let raw = entries.first()?;
    if raw.trim().is_empty() {
        return None;
    }
    match field_type {
        FieldType::Number => Some(
            raw.trim()
                .parse::<f64>()
                .map_or_else(|_| AttributeValue::Text((*raw).to_string()), AttributeValue::Number),
        ),
        _ => Some(AttributeValue::Text((*raw).to_string())),
    }
}

/// Builds the attribute bag from submitted form data.
///
/// Entries for keys that have no definition are carried through as text (or lists for
/// `[]` names).
#[must_use]
pub fn decode_from_form(fields: &[FieldDefinitionModel], form: &FlatFormData) -> AttributeBag {
    let mut bag = AttributeBag::new();

    for field in fields {
        let entries = if field.field_type == FieldType::Checkbox {
            form.get_all(&bag_list_key(&field.key))
        } else {
            form.get_all(&bag_key(&field.key))
        };
        if let Some(value) = decode_value(field.field_type, &entries) {
            bag.insert(field.key.clone(), value);
        }
    }

    let known: HashSet<&str> = fields.iter().map(|field| field.key.as_str()).collect();
    for (name, value) in form.iter() {
        let Some((key, is_list)) = parse_bag_name(name) else {
            continue;
        };
        if key.is_empty() || known.contains(key) {
            continue;
        }
        if is_list {
            let mut items = match bag.remove(key) {
                Some(AttributeValue::List(items)) => items,
                _ => Vec::new(),
            };
            items.push(value.to_string());
            bag.insert(key, AttributeValue::List(items));
        } else if !bag.contains_key(key) {
            bag.insert(key, AttributeValue::Text(value.to_string()));
        }
    }

    bag
}

/// How a value is written back into a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEncoding {
    /// One `additional_data[key]` entry
    Single(String),
    /// One `additional_data[key][]` entry per item
    Multi(Vec<String>),
}

/// Encodes a stored value for a field of the given type.
///
/// Values stored under a different type are shown as their text; a scalar under a
/// checkbox field becomes a one-item selection.
#[must_use]
pub fn encode_value(field_type: FieldType, value: Option<&AttributeValue>) -> FormEncoding {
    if field_type == FieldType::Checkbox {
        return FormEncoding::Multi(match value {
            None => Vec::new(),
            Some(AttributeValue::List(items)) => items.clone(),
            Some(other) if other.is_blank() => Vec::new(),
            Some(other) => vec![other.display()],
        });
    }
    FormEncoding::Single(
        value
            .filter(|value| !matches!(value, AttributeValue::Raw(json) if json.is_null()))
            .map(AttributeValue::display)
            .unwrap_or_default(),
    )
}

/// Encodes the values of `fields` from `bag`, one entry per single-valued field.
#[must_use]
pub fn encode_bag(fields: &[FieldDefinitionModel], bag: &AttributeBag) -> FlatFormData {
    let mut form = FlatFormData::new();
    for field in fields {
        match encode_value(field.field_type, bag.get(&field.key)) {
            FormEncoding::Single(value) => form.push(bag_key(&field.key), value),
            FormEncoding::Multi(items) => {
                let name = bag_list_key(&field.key);
                for item in items {
                    form.push(name.clone(), item);
                }
            }
        }
    }
    form
}

/// Encodes a stored record for its edit form: fixed columns, geometry as JSON text, then
/// the custom fields.
#[must_use]
pub fn encode_for_form(fields: &[FieldDefinitionModel], land: &land::Model) -> FlatFormData {
    let columns = LandColumns::from_model(land);
    let mut form = FlatFormData::new();

    for (name, value) in columns.text_columns() {
        form.push(name, value.unwrap_or_default());
    }
    form.push("year", columns.year.map(|year| year.to_string()).unwrap_or_default());
    form.push("area", columns.area.map(|area| area.to_string()).unwrap_or_default());
    form.push(
        "map_area",
        columns.map_area.map(|area| area.to_string()).unwrap_or_default(),
    );
    form.push(
        "coordinates",
        land.coordinates.as_ref().map(ToString::to_string).unwrap_or_default(),
    );
    form.push(
        "coordinate",
        land.coordinate.as_ref().map(ToString::to_string).unwrap_or_default(),
    );

    for (name, value) in encode_bag(fields, &attribute_bag(land)).iter() {
        form.push(name, value);
    }
    form
}

fn trimmed<'a>(form: &'a FlatFormData, name: &str) -> Option<&'a str> {
    form.get(name).map(str::trim).filter(|value| !value.is_empty())
}

/// Decodes a submitted land form.
///
/// Text columns are trimmed and blank ones dropped. Values that cannot be read at all
/// (a non-integer year, non-JSON geometry) are reported as violations and left unset;
/// shape rules are left to validation.
#[must_use]
pub fn decode_land_form(
    fields: &[FieldDefinitionModel],
    form: &FlatFormData,
) -> (LandPayload, Vec<FieldViolation>) {
    let mut violations = Vec::new();
    let mut columns = LandColumns::default();

    for (name, slot) in columns.text_columns_mut() {
        *slot = trimmed(form, name).map(str::to_string);
    }

    columns.year = trimmed(form, "year").and_then(|year| {
        year.parse::<i32>().map_or_else(
            |_| {
                violations.push(FieldViolation::new("year", "must be an integer"));
                None
            },
            Some,
        )
    });

    for name in ["area", "map_area"] {
        let parsed = trimmed(form, name).and_then(|area| {
            area.parse::<f64>().map_or_else(
                |_| {
                    violations.push(FieldViolation::new(name, "must be a number"));
                    None
                },
                Some,
            )
        });
        if name == "area" {
            columns.area = parsed;
        } else {
            columns.map_area = parsed;
        }
    }

    let coordinates = trimmed(form, "coordinates").and_then(|text| {
        serde_json::from_str::<Vec<Vec<f64>>>(text).map_or_else(
            |_| {
                violations.push(FieldViolation::new(
                    "coordinates",
                    "must be a list of coordinate pairs",
                ));
                None
            },
            Some,
        )
    });
    let coordinate = trimmed(form, "coordinate").and_then(|text| {
        serde_json::from_str::<Vec<f64>>(text).map_or_else(
            |_| {
                violations.push(FieldViolation::new("coordinate", "must be a coordinate pair"));
                None
            },
            Some,
        )
    });

    let payload = LandPayload {
        columns,
        coordinates,
        coordinate,
        additional_data: decode_from_form(fields, form),
    };
    (payload, violations)
}
