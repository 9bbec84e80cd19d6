//! Data serializers: declarative validation of `submit_data` payloads.

use serde_json::{Map, Number, Value};
use validator::{ValidateEmail, ValidateLength};

use crate::error::FieldErrors;

use super::{PluginContent, ResolvedPlugin};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const NOT_A_DICT: &str = "Invalid data. Expected a dictionary.";

/// FieldKind
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Trimmed string, at most `max_length` characters.
    Text { max_length: u64 },
    Email,
    /// Index into the choices declared by the plugin instance being submitted to.
    PluginChoice,
}

/// DataField
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl DataField {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// A field that may be omitted, sent as `null` or left blank.
    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    fn validate(&self, raw: &Value, plugin: &ResolvedPlugin) -> Result<Value, String> {
        match &self.kind {
            FieldKind::Text { max_length } => {
                let text = raw.as_str().ok_or_else(|| NOT_A_STRING.to_string())?.trim();
                if text.is_empty() && self.required {
                    return Err(BLANK.to_string());
                }
                if !text.validate_length(None, Some(*max_length), None) {
                    return Err(format!(
                        "Ensure this field has no more than {max_length} characters."
                    ));
                }
                Ok(Value::String(text.to_string()))
            }
            FieldKind::Email => {
                let text = raw.as_str().ok_or_else(|| NOT_A_STRING.to_string())?.trim();
                if text.is_empty() && self.required {
                    return Err(BLANK.to_string());
                }
                if !text.validate_email() {
                    return Err(INVALID_EMAIL.to_string());
                }
                Ok(Value::String(text.to_string()))
            }
            FieldKind::PluginChoice => {
                let value = as_integer(raw).ok_or_else(|| INVALID_INTEGER.to_string())?;
                let choices = match &plugin.content {
                    PluginContent::Poll(poll) => poll.choices.len(),
                    _ => 0,
                };
                if value < 0 || value as usize >= choices {
                    return Err(format!("\"{value}\" is not a valid choice."));
                }
                Ok(Value::Number(Number::from(value)))
            }
        }
    }
}

/// DataSerializer
///
/// The validation contract for the custom data a plugin type accepts. Validated
/// output only contains declared fields; unknown keys are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSerializer {
    pub name: &'static str,
    pub fields: Vec<DataField>,
}

impl DataSerializer {
    pub fn new(name: &'static str, fields: Vec<DataField>) -> Self {
        Self { name, fields }
    }

    pub fn validate(&self, payload: &Value, plugin: &ResolvedPlugin) -> Result<Value, FieldErrors> {
        let mut errors = FieldErrors::new();

        let Some(input) = payload.as_object() else {
            errors.insert("non_field_errors".to_string(), vec![NOT_A_DICT.to_string()]);
            return Err(errors);
        };

        let mut validated = Map::new();
        for field in &self.fields {
            match input.get(field.name).filter(|v| !v.is_null()) {
                None if field.required => {
                    errors.insert(field.name.to_string(), vec![REQUIRED.to_string()]);
                }
                None => {}
                Some(raw) => match field.validate(raw, plugin) {
                    Ok(value) => {
                        validated.insert(field.name.to_string(), value);
                    }
                    Err(message) => {
                        errors.insert(field.name.to_string(), vec![message]);
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(validated))
        } else {
            Err(errors)
        }
    }
}

fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
