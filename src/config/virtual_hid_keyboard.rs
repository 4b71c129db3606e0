//! Settings for the virtual output keyboard device.

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::json;

#[derive(Debug, Clone)]
pub struct VirtualHidKeyboard {
    json: Value,
    country_code: i64,
    mouse_key_xy_scale: i64,
    keyboard_type_v2: String,
    indicate_sticky_modifier_keys_state: bool,
}

impl Default for VirtualHidKeyboard {
    fn default() -> Self {
        Self {
            json: Value::Object(Map::new()),
            country_code: 0,
            mouse_key_xy_scale: 100,
            keyboard_type_v2: String::new(),
            indicate_sticky_modifier_keys_state: true,
        }
    }
}

impl VirtualHidKeyboard {
    pub fn new(value: &Value) -> Result<Self> {
        let object = json::requires_object(value, "`virtual_hid_keyboard`")?;

        let mut keyboard = Self {
            json: value.clone(),
            ..Self::default()
        };

        if let Some(v) = object.get("country_code") {
            keyboard.country_code = v.as_i64().ok_or_else(|| {
                ConfigError::unmarshal(format!(
                    "`country_code` must be a number, but is `{}`",
                    json::dump_for_error_message(v)
                ))
            })?;
        }
        if let Some(v) = object.get("mouse_key_xy_scale") {
            keyboard.mouse_key_xy_scale = v.as_i64().ok_or_else(|| {
                ConfigError::unmarshal(format!(
                    "`mouse_key_xy_scale` must be a number, but is `{}`",
                    json::dump_for_error_message(v)
                ))
            })?;
        }
        if let Some(v) = object.get("keyboard_type_v2") {
            keyboard.keyboard_type_v2 = json::requires_string(v, "`keyboard_type_v2`")?.to_string();
        }
        if let Some(v) = object.get("indicate_sticky_modifier_keys_state") {
            keyboard.indicate_sticky_modifier_keys_state =
                v.as_bool().ok_or_else(|| {
                    ConfigError::unmarshal(format!(
                        "`indicate_sticky_modifier_keys_state` must be a boolean, but is `{}`",
                        json::dump_for_error_message(v)
                    ))
                })?;
        }

        Ok(keyboard)
    }

    #[must_use]
    pub fn country_code(&self) -> i64 {
        self.country_code
    }

    pub fn set_country_code(&mut self, value: i64) {
        self.country_code = value;
    }

    #[must_use]
    pub fn mouse_key_xy_scale(&self) -> i64 {
        self.mouse_key_xy_scale
    }

    pub fn set_mouse_key_xy_scale(&mut self, value: i64) {
        self.mouse_key_xy_scale = value;
    }

    #[must_use]
    pub fn keyboard_type_v2(&self) -> &str {
        &self.keyboard_type_v2
    }

    pub fn set_keyboard_type_v2(&mut self, value: impl Into<String>) {
        self.keyboard_type_v2 = value.into();
    }

    #[must_use]
    pub fn indicate_sticky_modifier_keys_state(&self) -> bool {
        self.indicate_sticky_modifier_keys_state
    }

    pub fn set_indicate_sticky_modifier_keys_state(&mut self, value: bool) {
        self.indicate_sticky_modifier_keys_state = value;
    }

    /// Re-renders onto the original subtree, omitting values equal to their
    /// defaults.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        set_or_erase(&mut object, "country_code", self.country_code != 0, || {
            Value::from(self.country_code)
        });
        set_or_erase(
            &mut object,
            "mouse_key_xy_scale",
            self.mouse_key_xy_scale != 100,
            || Value::from(self.mouse_key_xy_scale),
        );
        set_or_erase(
            &mut object,
            "keyboard_type_v2",
            !self.keyboard_type_v2.is_empty(),
            || Value::from(self.keyboard_type_v2.clone()),
        );
        set_or_erase(
            &mut object,
            "indicate_sticky_modifier_keys_state",
            !self.indicate_sticky_modifier_keys_state,
            || Value::Bool(self.indicate_sticky_modifier_keys_state),
        );

        Value::Object(object)
    }
}

fn set_or_erase(
    object: &mut Map<String, Value>,
    key: &str,
    non_default: bool,
    value: impl FnOnce() -> Value,
) {
    if non_default {
        object.insert(key.to_string(), value());
    } else {
        object.remove(key);
    }
}
