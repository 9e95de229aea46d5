//! Field Schema
//!
//! Describes the form fields the assistant collects. The host form supplies
//! an ordered list of [`FieldSpec`]; order defines the collection sequence.

use crate::error::{VoiceFillError, VoiceFillResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// One selectable option of a `select` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Token stored into the collected data
    pub value: String,
    /// Display/spoken text matched against transcripts
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Field type with its type-specific constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Number {
        #[serde(deserialize_with = "de_number")]
        min: f64,
        #[serde(deserialize_with = "de_number")]
        max: f64,
        #[serde(default, deserialize_with = "de_opt_number")]
        step: Option<f64>,
    },
    Select {
        options: Vec<SelectOption>,
    },
    Text,
}

/// One form field to collect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique key in the collected data
    pub name: String,
    /// Display/spoken label
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn number(name: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Number {
                min,
                max,
                step: None,
            },
        }
    }

    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Select { options },
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
        }
    }

    /// Hint describing acceptable values: an inclusive range for numbers,
    /// the option labels for selects, nothing for free text.
    pub fn guidance(&self) -> String {
        match &self.kind {
            FieldKind::Number { min, max, .. } => {
                format!("({} to {})", format_bound(*min), format_bound(*max))
            }
            FieldKind::Select { options } => {
                let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
                format!("({})", labels.join(", "))
            }
            FieldKind::Text => String::new(),
        }
    }

    /// Human-readable form of a stored value: the option label for selects
    pub fn display_value<'a>(&'a self, value: &'a str) -> &'a str {
        match &self.kind {
            FieldKind::Select { options } => options
                .iter()
                .find(|o| o.value == value)
                .map(|o| o.label.as_str())
                .unwrap_or(value),
            _ => value,
        }
    }

    /// Whether a numeric value lies inside the declared range
    pub fn in_range(&self, value: f64) -> bool {
        match &self.kind {
            FieldKind::Number { min, max, .. } => value >= *min && value <= *max,
            _ => true,
        }
    }
}

/// Render a bound without a trailing `.0` for whole numbers
fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Host forms often carry bounds as strings ("29"); accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number '{}'", s))),
        }
    }
}

fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(v) => v.into_f64().map(Some),
        None => Ok(None),
    }
}

/// Check a schema for problems the dialogue cannot recover from
pub fn validate(fields: &[FieldSpec]) -> VoiceFillResult<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(VoiceFillError::Schema(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
        match &field.kind {
            FieldKind::Number { min, max, .. } if min > max => {
                return Err(VoiceFillError::Schema(format!(
                    "field '{}' has min {} greater than max {}",
                    field.name, min, max
                )));
            }
            FieldKind::Select { options } if options.is_empty() => {
                return Err(VoiceFillError::Schema(format!(
                    "select field '{}' has no options",
                    field.name
                )));
            }
            // An empty label would match every transcript
            FieldKind::Select { options }
                if options.iter().any(|o| o.label.trim().is_empty()) =>
            {
                return Err(VoiceFillError::Schema(format!(
                    "select field '{}' has an option without a label",
                    field.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Load and validate a field list from a JSON file
pub fn load_schema(path: &Path) -> VoiceFillResult<Vec<FieldSpec>> {
    let content = std::fs::read_to_string(path)?;
    let fields: Vec<FieldSpec> = serde_json::from_str(&content)?;
    validate(&fields)?;
    debug!("Loaded {} fields from {}", fields.len(), path.display());
    Ok(fields)
}
