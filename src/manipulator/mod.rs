//! Manipulator construction and linting.
//!
//! `make_manipulator` decodes the `type` discriminator into the closed set
//! of manipulator types and type-checks the recognized fields without
//! executing anything. `lint_rule` runs it over a whole rule and collects
//! the failures, which is what asset import dialogs and the `lint`
//! subcommand display.

pub mod conditions;

use serde_json::Value;

use crate::config::complex_modifications::Rule;
use crate::error::{ConfigError, Result};
use crate::json;

/// The closed set of manipulator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManipulatorType {
    Basic,
    MouseBasic,
    MouseMotionToScroll,
}

impl ManipulatorType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(Self::Basic),
            "mouse_basic" => Some(Self::MouseBasic),
            "mouse_motion_to_scroll" => Some(Self::MouseMotionToScroll),
            _ => None,
        }
    }
}

// Event keys accepted inside a `from` definition.
const FROM_EVENT_KEYS: &[&str] = &[
    "any",
    "key_code",
    "consumer_key_code",
    "pointing_button",
    "apple_vendor_keyboard_key_code",
    "apple_vendor_top_case_key_code",
    "simultaneous",
];

/// Decodes and validates one manipulator. Returns its type on success.
pub fn make_manipulator(value: &Value) -> Result<ManipulatorType> {
    let object = json::requires_object(value, "manipulator")?;

    let manipulator_type = match object.get("type") {
        None => return Err(ConfigError::unmarshal("`type` is missing")),
        Some(v) => {
            let name = json::requires_string(v, "`type`")?;
            ManipulatorType::from_name(name)
                .ok_or_else(|| ConfigError::unmarshal(format!("unknown type `{name}`")))?
        }
    };

    match manipulator_type {
        ManipulatorType::Basic => {
            match object.get("from") {
                None => return Err(ConfigError::unmarshal("`from` is missing")),
                Some(v) => validate_from_event_definition(v)?,
            }
            for key in [
                "to",
                "to_if_alone",
                "to_if_held_down",
                "to_after_key_up",
            ] {
                if let Some(v) = object.get(key) {
                    validate_to_event_definitions(v, key)?;
                }
            }
            if let Some(v) = object.get("to_delayed_action") {
                let delayed = json::requires_object(v, "`to_delayed_action`")?;
                for key in ["to_if_invoked", "to_if_canceled"] {
                    if let Some(v) = delayed.get(key) {
                        validate_to_event_definitions(v, key)
                            .map_err(|e| e.in_key("to_delayed_action"))?;
                    }
                }
            }
        }
        ManipulatorType::MouseBasic => {
            if let Some(v) = object.get("from") {
                validate_from_event_definition(v)?;
            }
            if let Some(v) = object.get("to") {
                validate_to_event_definitions(v, "to")?;
            }
        }
        ManipulatorType::MouseMotionToScroll => {
            if let Some(v) = object.get("from") {
                // Only modifiers make sense here; the motion itself is the
                // trigger.
                let from = json::requires_object(v, "`from`")?;
                if let Some(m) = from.get("modifiers") {
                    validate_from_modifiers(m).map_err(|e| e.in_key("from"))?;
                }
            }
            if let Some(v) = object.get("options") {
                json::requires_object(v, "`options`")?;
            }
        }
    }

    if let Some(v) = object.get("conditions") {
        let entries = json::requires_array(v, "`conditions`")?;
        for entry in entries {
            conditions::make_condition(entry).map_err(|e| e.in_key("conditions"))?;
        }
    }

    Ok(manipulator_type)
}

fn validate_from_event_definition(value: &Value) -> Result<()> {
    let object = json::requires_object(value, "`from`")?;

    let has_event = FROM_EVENT_KEYS.iter().any(|k| object.contains_key(*k));
    if !has_event {
        return Err(ConfigError::unmarshal(format!(
            "`from` must contain an event definition, but is `{}`",
            json::dump_for_error_message(value)
        )));
    }

    if let Some(v) = object.get("simultaneous") {
        let entries = json::requires_array(v, "`simultaneous`").map_err(|e| e.in_key("from"))?;
        for entry in entries {
            json::requires_object(entry, "`simultaneous` entry")
                .map_err(|e| e.in_key("from"))?;
        }
    }

    if let Some(m) = object.get("modifiers") {
        validate_from_modifiers(m).map_err(|e| e.in_key("from"))?;
    }

    Ok(())
}

fn validate_from_modifiers(value: &Value) -> Result<()> {
    let object = json::requires_object(value, "`modifiers`")?;

    for key in ["mandatory", "optional"] {
        if let Some(v) = object.get(key) {
            let entries =
                json::requires_array(v, format!("`{key}`").as_str()).map_err(|e| e.in_key("modifiers"))?;
            for entry in entries {
                json::requires_string(entry, format!("`{key}` entry").as_str())
                    .map_err(|e| e.in_key("modifiers"))?;
            }
        }
    }

    Ok(())
}

// A `to` list may be a single event object or an array of them.
fn validate_to_event_definitions(value: &Value, key: &str) -> Result<()> {
    match value {
        Value::Object(_) => validate_to_event_definition(value, key),
        Value::Array(entries) => {
            for entry in entries {
                validate_to_event_definition(entry, key)?;
            }
            Ok(())
        }
        other => Err(ConfigError::unmarshal(format!(
            "`{key}` must be an array, but is `{}`",
            json::dump_for_error_message(other)
        ))),
    }
}

fn validate_to_event_definition(value: &Value, key: &str) -> Result<()> {
    let object =
        json::requires_object(value, format!("`{key}` entry").as_str())?;

    if let Some(v) = object.get("shell_command") {
        json::requires_string(v, "`shell_command`").map_err(|e| e.in_key(key))?;
    }
    if let Some(v) = object.get("set_variable") {
        json::requires_object(v, "`set_variable`").map_err(|e| e.in_key(key))?;
    }
    if let Some(v) = object.get("mouse_key") {
        json::requires_object(v, "`mouse_key`").map_err(|e| e.in_key(key))?;
    }
    if let Some(v) = object.get("modifiers") {
        let entries = json::requires_array(v, "`modifiers`").map_err(|e| e.in_key(key))?;
        for entry in entries {
            json::requires_string(entry, "`modifiers` entry").map_err(|e| e.in_key(key))?;
        }
    }

    Ok(())
}

/// Constructs and discards every manipulator of `rule`, collecting one
/// formatted message per failure. An empty result means the rule is clean.
#[must_use]
pub fn lint_rule(rule: &Rule) -> Vec<String> {
    let mut messages = Vec::new();

    for manipulator in rule.manipulators() {
        if let Err(e) = make_manipulator(manipulator.json()) {
            messages.push(format!("`{}` error: {e}", rule.description()));
        }
    }

    messages
}
