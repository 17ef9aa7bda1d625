//! Field rendering contract: which input affordance a field gets, how edits change its
//! value, and how stored values are shown in tables and detail views.
//!
//! Everything here is a pure function of a field definition and a value, so any front
//! end can drive it. Submitted values are produced in the shape [`crate::core::codec`]
//! decodes.

use crate::{
    core::{
        attributes::{AttributeBag, AttributeValue, parse_calendar_date},
        codec,
        validation::ADDITIONAL_DATA,
    },
    entities::{FieldDefinitionModel, FieldType},
    errors::FieldViolation,
};
use serde::Serialize;

/// Placeholder shown in a table cell with no value.
pub const EMPTY_CELL: &str = "-";

/// One option of a choice widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Option text, submitted as-is
    pub value: String,
    /// Whether the option is currently chosen
    pub checked: bool,
}

/// The input affordance for a field, carrying its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    /// Single-line text input
    SingleLine {
        /// Current text
        value: String,
    },
    /// Multi-line text input
    MultiLine {
        /// Current text
        value: String,
    },
    /// Numeric input; an empty input means "no value"
    NumberInput {
        /// Current value as typed
        value: String,
    },
    /// Date picker holding a `YYYY-MM-DD` value
    DatePicker {
        /// Current date, empty when unset
        value: String,
    },
    /// Single-choice dropdown
    Dropdown {
        /// The configured options
        choices: Vec<Choice>,
        /// Current value, kept even when it is no longer an option
        selected: Option<String>,
    },
    /// Single-choice radio group, one control per option
    RadioGroup {
        /// One control per option
        choices: Vec<Choice>,
    },
    /// Multi-choice group, one control per option
    CheckboxGroup {
        /// One control per option
        choices: Vec<Choice>,
    },
}

/// A field ready to be drawn in a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    /// Attribute-bag key
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Form entry name the widget submits under
    pub name: String,
    /// Whether submission is blocked while the value is blank
    pub required: bool,
    /// The input affordance
    pub widget: Widget,
    /// Messages for this field from the last failed submission
    pub errors: Vec<String>,
}

/// Strips any time component from a date value. Unparseable text is returned trimmed.
#[must_use]
pub fn normalize_date(text: &str) -> String {
    parse_calendar_date(text).map_or_else(
        || text.trim().to_string(),
        |date| date.format("%Y-%m-%d").to_string(),
    )
}

fn text_of(value: Option<&AttributeValue>) -> String {
    value
        .filter(|value| !value.is_blank())
        .map(AttributeValue::display)
        .unwrap_or_default()
}

fn selections(value: Option<&AttributeValue>) -> Vec<String> {
    match value {
        Some(AttributeValue::List(items)) => items.clone(),
        Some(other) if !other.is_blank() => vec![other.display()],
        _ => Vec::new(),
    }
}

fn choices(options: &[String], is_checked: impl Fn(&str) -> bool) -> Vec<Choice> {
    options
        .iter()
        .map(|option| Choice {
            value: option.clone(),
            checked: is_checked(option),
        })
        .collect()
}

/// Picks the widget for `field` and fills it with `value`.
#[must_use]
pub fn render_field(field: &FieldDefinitionModel, value: Option<&AttributeValue>) -> RenderedField {
    let options = field.option_list();
    let current = text_of(value);

    let widget = match field.field_type {
        FieldType::Text => Widget::SingleLine { value: current },
        FieldType::Textarea => Widget::MultiLine { value: current },
        FieldType::Number => Widget::NumberInput { value: current },
        FieldType::Date => Widget::DatePicker {
            value: if current.is_empty() {
                current
            } else {
                normalize_date(&current)
            },
        },
        FieldType::Select => Widget::Dropdown {
            choices: choices(&options, |option| option == current),
            selected: (!current.is_empty()).then_some(current),
        },
        FieldType::Radio => Widget::RadioGroup {
            choices: choices(&options, |option| option == current),
        },
        FieldType::Checkbox => {
            let selected = selections(value);
            Widget::CheckboxGroup {
                choices: choices(&options, |option| selected.iter().any(|s| s == option)),
            }
        }
    };

    let name = if field.field_type == FieldType::Checkbox {
        codec::bag_list_key(&field.key)
    } else {
        codec::bag_key(&field.key)
    };

    RenderedField {
        key: field.key.clone(),
        label: field.label.clone(),
        name,
        required: field.required,
        widget,
        errors: Vec::new(),
    }
}

/// Renders every field with its value from `bag`, attaching the messages of
/// `violations` reported on `additional_data.<key>`.
#[must_use]
pub fn render_form(
    fields: &[FieldDefinitionModel],
    bag: &AttributeBag,
    violations: &[FieldViolation],
) -> Vec<RenderedField> {
    fields
        .iter()
        .map(|field| {
            let mut rendered = render_field(field, bag.get(&field.key));
            let path = format!("{ADDITIONAL_DATA}.{}", field.key);
            rendered.errors = violations
                .iter()
                .filter(|violation| violation.path == path)
                .map(|violation| violation.message.clone())
                .collect();
            rendered
        })
        .collect()
}

/// A user interaction with a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// New text typed or chosen
    Value(String),
    /// A checkbox option ticked or unticked
    Toggle {
        /// The option's value
        option: String,
        /// Whether it is now ticked
        checked: bool,
    },
}

/// Applies an interaction to the current value, returning the new value.
///
/// An emptied input clears the value to absent. Toggling keeps the relative order of
/// the remaining selections and appends newly ticked options at the end. Interactions
/// that do not fit the widget leave the value unchanged.
#[must_use]
pub fn apply_input(
    field_type: FieldType,
    current: Option<AttributeValue>,
    input: FieldInput,
) -> Option<AttributeValue> {
    match (field_type, input) {
        (FieldType::Checkbox, FieldInput::Toggle { option, checked }) => {
            let mut items = selections(current.as_ref());
            if checked {
                if !items.contains(&option) {
                    items.push(option);
                }
            } else {
                items.retain(|item| *item != option);
            }
            Some(AttributeValue::List(items))
        }
        (FieldType::Checkbox, FieldInput::Value(_)) | (_, FieldInput::Toggle { .. }) => current,
        (field_type, FieldInput::Value(text)) => codec::decode_value(field_type, &[text.as_str()]),
    }
}

/// Keys of required fields that are still blank. Submission is blocked while this is
/// non-empty; blankness is judged exactly as server-side validation judges it.
#[must_use]
pub fn missing_required(fields: &[FieldDefinitionModel], bag: &AttributeBag) -> Vec<String> {
    fields
        .iter()
        .filter(|field| field.active && field.required)
        .filter(|field| bag.get(&field.key).is_none_or(AttributeValue::is_blank))
        .map(|field| field.key.clone())
        .collect()
}

/// Display text for a stored value under the given field type.
#[must_use]
pub fn display_value(field_type: FieldType, value: &AttributeValue) -> String {
    match (field_type, value) {
        (FieldType::Date, AttributeValue::Text(text)) => normalize_date(text),
        _ => value.display(),
    }
}

/// Table-cell text: the display value, or [`EMPTY_CELL`] when absent or blank.
#[must_use]
pub fn list_cell(field: &FieldDefinitionModel, value: Option<&AttributeValue>) -> String {
    value
        .filter(|value| !value.is_blank())
        .map_or_else(|| EMPTY_CELL.to_string(), |value| display_value(field.field_type, value))
}

/// One labelled value of a detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    /// Attribute-bag key
    pub key: String,
    /// Field label
    pub label: String,
    /// Display text
    pub value: String,
}

/// Detail-view entries for `fields`, skipping any without a value.
#[must_use]
pub fn detail_entries(fields: &[FieldDefinitionModel], bag: &AttributeBag) -> Vec<DetailEntry> {
    fields
        .iter()
        .filter_map(|field| {
            let value = bag.get(&field.key).filter(|value| !value.is_blank())?;
            Some(DetailEntry {
                key: field.key.clone(),
                label: field.label.clone(),
                value: display_value(field.field_type, value),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::field_model;

    fn text(value: &str) -> AttributeValue {
        AttributeValue::Text(value.to_string())
    }

    fn list(items: &[&str]) -> AttributeValue {
        AttributeValue::List(items.iter().map(|item| (*item).to_string()).collect())
    }

    #[test]
    fn test_one_widget_per_type() {
        let cases = [
            (FieldType::Text, "SingleLine"),
            (FieldType::Textarea, "MultiLine"),
            (FieldType::Number, "NumberInput"),
            (FieldType::Date, "DatePicker"),
            (FieldType::Select, "Dropdown"),
            (FieldType::Radio, "RadioGroup"),
            (FieldType::Checkbox, "CheckboxGroup"),
        ];
        for (field_type, expected) in cases {
            let rendered = render_field(&field_model(1, "nilai", field_type), None);
            let name = format!("{:?}", rendered.widget);
            assert!(name.starts_with(expected), "{field_type:?} rendered as {name}");
        }
    }

    #[test]
    fn test_date_is_shown_date_only() {
        let field = field_model(1, "tanggal_survey", FieldType::Date);
        let rendered = render_field(&field, Some(&text("2024-03-15T08:30:00.000000Z")));
        assert_eq!(
            rendered.widget,
            Widget::DatePicker {
                value: "2024-03-15".to_string()
            }
        );
        assert_eq!(normalize_date("bukan tanggal"), "bukan tanggal");
    }

    #[test]
    fn test_choice_widgets_mark_current_value() {
        let mut field = field_model(1, "dokumen", FieldType::Checkbox);
        field.options = Some(serde_json::json!(["KTP", "KK", "PBB"]));

        let rendered = render_field(&field, Some(&list(&["PBB", "KTP"])));
        let Widget::CheckboxGroup { choices } = rendered.widget else {
            panic!("expected checkbox group");
        };
        let checked: Vec<bool> = choices.iter().map(|c| c.checked).collect();
        assert_eq!(checked, vec![true, false, true]);
        assert_eq!(rendered.name, "additional_data[dokumen][]");

        field.field_type = FieldType::Radio;
        let rendered = render_field(&field, Some(&text("KK")));
        let Widget::RadioGroup { choices } = rendered.widget else {
            panic!("expected radio group");
        };
        assert_eq!(choices.len(), 3);
        assert!(choices[1].checked);
        assert_eq!(rendered.name, "additional_data[dokumen]");
    }

    #[test]
    fn test_toggle_preserves_selection_order() {
        let current = Some(list(&["A", "B", "C"]));

        let removed = apply_input(
            FieldType::Checkbox,
            current,
            FieldInput::Toggle {
                option: "B".to_string(),
                checked: false,
            },
        );
        assert_eq!(removed, Some(list(&["A", "C"])));

        let added = apply_input(
            FieldType::Checkbox,
            removed,
            FieldInput::Toggle {
                option: "B".to_string(),
                checked: true,
            },
        );
        assert_eq!(added, Some(list(&["A", "C", "B"])));

        let emptied = apply_input(
            FieldType::Checkbox,
            Some(list(&["A"])),
            FieldInput::Toggle {
                option: "A".to_string(),
                checked: false,
            },
        );
        assert_eq!(emptied, Some(list(&[])));
    }

    #[test]
    fn test_emptied_number_clears_to_absent() {
        let cleared = apply_input(
            FieldType::Number,
            Some(AttributeValue::Number(5.0)),
            FieldInput::Value(String::new()),
        );
        assert_eq!(cleared, None);

        let typed = apply_input(FieldType::Number, None, FieldInput::Value("7".to_string()));
        assert_eq!(typed, Some(AttributeValue::Number(7.0)));
    }

    #[test]
    fn test_missing_required_matches_validation() {
        let mut required = field_model(1, "sumber_data", FieldType::Select);
        required.required = true;
        let mut checkbox = field_model(2, "dokumen", FieldType::Checkbox);
        checkbox.required = true;
        let fields = vec![required, checkbox];

        let mut bag = AttributeBag::new();
        bag.insert("sumber_data", text("   "));
        bag.insert("dokumen", list(&[]));
        assert_eq!(missing_required(&fields, &bag), vec!["sumber_data", "dokumen"]);

        bag.insert("sumber_data", text("BPN"));
        bag.insert("dokumen", list(&["KTP"]));
        assert!(missing_required(&fields, &bag).is_empty());
    }

    #[test]
    fn test_render_form_attaches_errors() {
        let fields = vec![
            field_model(1, "sumber_data", FieldType::Select),
            field_model(2, "catatan", FieldType::Text),
        ];
        let violations = vec![FieldViolation::new("additional_data.sumber_data", "is required")];

        let rendered = render_form(&fields, &AttributeBag::new(), &violations);
        assert_eq!(rendered[0].errors, vec!["is required"]);
        assert!(rendered[1].errors.is_empty());
    }

    #[test]
    fn test_list_cells_and_detail_entries() {
        let fields = vec![
            field_model(1, "dokumen", FieldType::Checkbox),
            field_model(2, "tanggal_survey", FieldType::Date),
            field_model(3, "catatan", FieldType::Textarea),
        ];
        let mut bag = AttributeBag::new();
        bag.insert("dokumen", list(&["KTP", "PBB"]));
        bag.insert("tanggal_survey", text("2024-03-15 10:00:00"));
        bag.insert("catatan", text(""));

        assert_eq!(list_cell(&fields[0], bag.get("dokumen")), "KTP, PBB");
        assert_eq!(list_cell(&fields[2], bag.get("catatan")), EMPTY_CELL);
        assert_eq!(list_cell(&fields[2], None), EMPTY_CELL);

        let entries = detail_entries(&fields, &bag);
        let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["KTP, PBB", "2024-03-15"]);
    }
}
