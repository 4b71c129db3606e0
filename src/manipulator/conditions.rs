//! Condition construction and validation.
//!
//! The runtime owns a closed set of condition types; anything else in a
//! `type` field is a configuration mistake and reported as such. Unknown
//! keys inside a known condition are carried through untouched.

use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::json;

/// The closed set of condition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    FrontmostApplicationIf,
    FrontmostApplicationUnless,
    DeviceIf,
    DeviceUnless,
    DeviceExistsIf,
    DeviceExistsUnless,
    KeyboardTypeIf,
    KeyboardTypeUnless,
    InputSourceIf,
    InputSourceUnless,
    VariableIf,
    VariableUnless,
    EventChangedIf,
    EventChangedUnless,
}

impl ConditionType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "frontmost_application_if" => Some(Self::FrontmostApplicationIf),
            "frontmost_application_unless" => Some(Self::FrontmostApplicationUnless),
            "device_if" => Some(Self::DeviceIf),
            "device_unless" => Some(Self::DeviceUnless),
            "device_exists_if" => Some(Self::DeviceExistsIf),
            "device_exists_unless" => Some(Self::DeviceExistsUnless),
            "keyboard_type_if" => Some(Self::KeyboardTypeIf),
            "keyboard_type_unless" => Some(Self::KeyboardTypeUnless),
            "input_source_if" => Some(Self::InputSourceIf),
            "input_source_unless" => Some(Self::InputSourceUnless),
            "variable_if" => Some(Self::VariableIf),
            "variable_unless" => Some(Self::VariableUnless),
            "event_changed_if" => Some(Self::EventChangedIf),
            "event_changed_unless" => Some(Self::EventChangedUnless),
            _ => None,
        }
    }
}

/// Decodes and validates one condition. Returns its type on success.
pub fn make_condition(value: &Value) -> Result<ConditionType> {
    let object = json::requires_object(value, "condition")?;

    let condition_type = match object.get("type") {
        None => return Err(ConfigError::unmarshal("`type` is missing")),
        Some(v) => {
            let name = json::requires_string(v, "`type`")?;
            ConditionType::from_name(name)
                .ok_or_else(|| ConfigError::unmarshal(format!("unknown type `{name}`")))?
        }
    };

    match condition_type {
        ConditionType::FrontmostApplicationIf | ConditionType::FrontmostApplicationUnless => {
            validate_string_array(value, "bundle_identifiers")?;
            validate_string_array(value, "file_paths")?;
        }
        ConditionType::DeviceIf
        | ConditionType::DeviceUnless
        | ConditionType::DeviceExistsIf
        | ConditionType::DeviceExistsUnless => {
            if let Some(v) = object.get("identifiers") {
                let entries = json::requires_array(v, "`identifiers`")?;
                for entry in entries {
                    json::requires_object(entry, "`identifiers` entry")
                        .map_err(|e| e.in_key("identifiers"))?;
                }
            }
        }
        ConditionType::KeyboardTypeIf | ConditionType::KeyboardTypeUnless => {
            validate_string_array(value, "keyboard_types")?;
        }
        ConditionType::InputSourceIf | ConditionType::InputSourceUnless => {
            if let Some(v) = object.get("input_sources") {
                let entries = json::requires_array(v, "`input_sources`")?;
                for entry in entries {
                    json::requires_object(entry, "`input_sources` entry")
                        .map_err(|e| e.in_key("input_sources"))?;
                }
            }
        }
        ConditionType::VariableIf | ConditionType::VariableUnless => {
            match object.get("name") {
                None => return Err(ConfigError::unmarshal("`name` is missing")),
                Some(v) => {
                    json::requires_string(v, "`name`")?;
                }
            }
            // `value` may be any JSON scalar; its absence means unset.
        }
        ConditionType::EventChangedIf | ConditionType::EventChangedUnless => {
            match object.get("value") {
                None => return Err(ConfigError::unmarshal("`value` is missing")),
                Some(Value::Bool(_)) => {}
                Some(other) => {
                    return Err(ConfigError::unmarshal(format!(
                        "`value` must be a boolean, but is `{}`",
                        json::dump_for_error_message(other)
                    )));
                }
            }
        }
    }

    Ok(condition_type)
}

fn validate_string_array(value: &Value, key: &str) -> Result<()> {
    if let Some(v) = json::find_value(value, key) {
        let entries = json::requires_array(v, format!("`{key}`").as_str())?;
        for entry in entries {
            json::requires_string(entry, format!("`{key}` entry").as_str())
                .map_err(|e| e.in_key(key))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_types() {
        let t = make_condition(&json!({
            "type": "frontmost_application_if",
            "bundle_identifiers": ["^com\\.apple\\.Terminal$"],
        }))
        .unwrap();
        assert_eq!(t, ConditionType::FrontmostApplicationIf);

        let t = make_condition(&json!({
            "type": "device_if",
            "identifiers": [{"vendor_id": 1, "product_id": 2}],
        }))
        .unwrap();
        assert_eq!(t, ConditionType::DeviceIf);

        let t = make_condition(&json!({
            "type": "variable_unless",
            "name": "mode",
            "value": 1,
        }))
        .unwrap();
        assert_eq!(t, ConditionType::VariableUnless);
    }

    #[test]
    fn test_missing_type() {
        let err = make_condition(&json!({"name": "x"})).unwrap_err();
        assert_eq!(err.to_string(), "`type` is missing");
    }

    #[test]
    fn test_unknown_type_names_the_value() {
        let err = make_condition(&json!({"type": "battery_if"})).unwrap_err();
        assert_eq!(err.to_string(), "unknown type `battery_if`");
    }

    #[test]
    fn test_variable_requires_name() {
        let err = make_condition(&json!({"type": "variable_if"})).unwrap_err();
        assert_eq!(err.to_string(), "`name` is missing");
    }

    #[test]
    fn test_event_changed_requires_bool_value() {
        let err = make_condition(&json!({"type": "event_changed_if"})).unwrap_err();
        assert_eq!(err.to_string(), "`value` is missing");

        let err =
            make_condition(&json!({"type": "event_changed_if", "value": 1})).unwrap_err();
        assert!(err.to_string().starts_with("`value` must be a boolean"));
    }

    #[test]
    fn test_bundle_identifiers_must_be_strings() {
        let err = make_condition(&json!({
            "type": "frontmost_application_unless",
            "bundle_identifiers": [123],
        }))
        .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("`bundle_identifiers` error: `bundle_identifiers` entry must be a string"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        assert!(make_condition(&json!({
            "type": "keyboard_type_if",
            "keyboard_types": ["ansi"],
            "future_key": {"x": 1},
        }))
        .is_ok());
    }
}
