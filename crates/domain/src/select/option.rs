use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ComponentError;

/// One entry of a Select dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    /// Display text
    pub text: String,
    /// Opaque selection payload
    #[serde(default)]
    pub value: Value,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            value,
        }
    }

    /// Lenient read of a caller-supplied option. Numeric ids are accepted and
    /// stringified; missing text reads as empty.
    pub fn from_json(raw: &Value) -> Result<Self, ComponentError> {
        let Value::Object(fields) = raw else {
            return Err(ComponentError::validation(format!(
                "option must be an object, got {raw}"
            )));
        };

        let id = match fields.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            None | Some(Value::Null) => String::new(),
            Some(other) => {
                return Err(ComponentError::validation(format!(
                    "option id must be a string, got {other}"
                )))
            }
        };
        let text = match fields.get("text") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let value = fields.get("value").cloned().unwrap_or(Value::Null);

        Ok(Self { id, text, value })
    }

    /// Same entry for multi-select membership purposes.
    pub fn same_entry(&self, other: &SelectOption) -> bool {
        self.id == other.id && self.value == other.value
    }

    /// Case-insensitive substring match on the display text.
    pub fn matches(&self, query: &str) -> bool {
        self.text.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Validate an options argument. Returns the typed view; callers store the
/// raw array so extra fields survive a round trip.
pub fn parse_options(raw: &Value) -> Result<Vec<SelectOption>, ComponentError> {
    let Value::Array(items) = raw else {
        return Err(ComponentError::validation("options must be an array"));
    };
    items.iter().map(SelectOption::from_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_are_stringified() {
        let opt = SelectOption::from_json(&json!({"id": 3, "text": "Three", "value": 3})).unwrap();
        assert_eq!(opt.id, "3");
        assert_eq!(opt.value, json!(3));
    }

    #[test]
    fn non_array_options_are_rejected() {
        assert!(matches!(
            parse_options(&json!({"id": "1"})),
            Err(ComponentError::Validation(_))
        ));
        assert!(matches!(
            parse_options(&json!([1, 2])),
            Err(ComponentError::Validation(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive() {
        let opt = SelectOption::new("1", "Option One", json!("one"));
        assert!(opt.matches("ONE"));
        assert!(opt.matches("tion o"));
        assert!(!opt.matches("two"));
    }
}
