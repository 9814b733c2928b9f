use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider-agnostic form description, usually produced by the generator step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AbstractSchema {
    #[serde(default = "default_title", deserialize_with = "deserialize_title")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display order of the created form follows this sequence.
    pub fields: Vec<AbstractField>,
}

impl AbstractSchema {
    /// The description, if it carries any non-whitespace text.
    pub fn non_empty_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AbstractField {
    #[serde(default = "default_label", deserialize_with = "deserialize_label")]
    pub label: String,

    #[serde(rename = "type", default, deserialize_with = "deserialize_field_type")]
    pub field_type: FieldType,

    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
    Time,
}

impl FieldType {
    /// Lenient parse; anything other than the exact lowercase names is a short text field.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "time" => Self::Time,
            _ => Self::Text,
        }
    }
}

fn deserialize_field_type<'de, D>(deserializer: D) -> Result<FieldType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(raw)) => FieldType::parse_lenient(&raw),
        _ => FieldType::Text,
    })
}

/// Explicit `null` reads like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title))
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_label))
}

fn default_title() -> String {
    "Untitled Form".to_string()
}

fn default_label() -> String {
    "Untitled Question".to_string()
}
