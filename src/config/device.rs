//! Per-device identity and override flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::simple_modifications::SimpleModifications;
use crate::error::{ConfigError, Result};
use crate::json;

/// Vendor id of security tokens that enumerate as keyboards but must never
/// be grabbed.
const SECURITY_TOKEN_VENDOR_ID: u32 = 0x1050;

/// The equality key for a physical device: vendor/product ids plus usage
/// flags, or a device address for HID devices lacking vendor/product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentifiers {
    #[serde(default)]
    pub vendor_id: u32,
    #[serde(default)]
    pub product_id: u32,
    /// Address string for devices without vendor/product ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_address: Option<String>,
    #[serde(default)]
    pub is_keyboard: bool,
    #[serde(default)]
    pub is_pointing_device: bool,
    #[serde(default)]
    pub is_game_pad: bool,
}

impl DeviceIdentifiers {
    pub fn keyboard(vendor_id: u32, product_id: u32) -> Self {
        Self {
            vendor_id,
            product_id,
            is_keyboard: true,
            ..Self::default()
        }
    }

    pub fn pointing_device(vendor_id: u32, product_id: u32) -> Self {
        Self {
            vendor_id,
            product_id,
            is_pointing_device: true,
            ..Self::default()
        }
    }
}

/// One device-override entry of a profile: immutable identity plus flags
/// whose defaults depend on what kind of device it is.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    json: Value,
    identifiers: DeviceIdentifiers,
    ignore: Option<bool>,
    manipulate_caps_lock_led: Option<bool>,
    treat_as_built_in_keyboard: Option<bool>,
    disable_built_in_keyboard_if_exists: Option<bool>,
    mouse_flip_x: Option<bool>,
    mouse_flip_y: Option<bool>,
    mouse_flip_vertical_wheel: Option<bool>,
    mouse_flip_horizontal_wheel: Option<bool>,
    mouse_swap_xy: Option<bool>,
    mouse_swap_wheels: Option<bool>,
    game_pad_swap_sticks: Option<bool>,
    game_pad_xy_stick_deadzone: Option<f64>,
    game_pad_stick_scale: Option<f64>,
    simple_modifications: SimpleModifications,
    fn_function_keys: SimpleModifications,
}

impl DeviceEntry {
    /// Builds an entry holding only identity; every flag reports its
    /// context-sensitive default.
    pub fn with_identifiers(identifiers: DeviceIdentifiers) -> Self {
        let mut entry = Self {
            json: Value::Object(Map::new()),
            identifiers,
            ignore: None,
            manipulate_caps_lock_led: None,
            treat_as_built_in_keyboard: None,
            disable_built_in_keyboard_if_exists: None,
            mouse_flip_x: None,
            mouse_flip_y: None,
            mouse_flip_vertical_wheel: None,
            mouse_flip_horizontal_wheel: None,
            mouse_swap_xy: None,
            mouse_swap_wheels: None,
            game_pad_swap_sticks: None,
            game_pad_xy_stick_deadzone: None,
            game_pad_stick_scale: None,
            simple_modifications: SimpleModifications::new(),
            fn_function_keys: SimpleModifications::new(),
        };
        entry.coordinate_between_properties();
        entry
    }

    pub fn new(value: &Value) -> Result<Self> {
        let object = json::requires_object(value, "device")?;

        let identifiers = match object.get("identifiers") {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| ConfigError::from(e).in_key("identifiers"))?,
            None => DeviceIdentifiers::default(),
        };

        let mut entry = Self::with_identifiers(identifiers);
        entry.json = value.clone();

        entry.ignore = read_bool(object, "ignore")?;
        entry.manipulate_caps_lock_led = read_bool(object, "manipulate_caps_lock_led")?;
        entry.treat_as_built_in_keyboard = read_bool(object, "treat_as_built_in_keyboard")?;
        entry.disable_built_in_keyboard_if_exists =
            read_bool(object, "disable_built_in_keyboard_if_exists")?;
        entry.mouse_flip_x = read_bool(object, "mouse_flip_x")?;
        entry.mouse_flip_y = read_bool(object, "mouse_flip_y")?;
        entry.mouse_flip_vertical_wheel = read_bool(object, "mouse_flip_vertical_wheel")?;
        entry.mouse_flip_horizontal_wheel = read_bool(object, "mouse_flip_horizontal_wheel")?;
        entry.mouse_swap_xy = read_bool(object, "mouse_swap_xy")?;
        entry.mouse_swap_wheels = read_bool(object, "mouse_swap_wheels")?;
        entry.game_pad_swap_sticks = read_bool(object, "game_pad_swap_sticks")?;
        entry.game_pad_xy_stick_deadzone = read_f64(object, "game_pad_xy_stick_deadzone")?;
        entry.game_pad_stick_scale = read_f64(object, "game_pad_stick_scale")?;

        if let Some(v) = object.get("simple_modifications") {
            entry.simple_modifications.update(v);
        }
        if let Some(v) = object.get("fn_function_keys") {
            entry.fn_function_keys.update(v);
        }

        entry.coordinate_between_properties();

        Ok(entry)
    }

    pub fn identifiers(&self) -> &DeviceIdentifiers {
        &self.identifiers
    }

    // Context-sensitive defaults.

    fn default_ignore(&self) -> bool {
        self.identifiers.is_pointing_device
            || self.identifiers.is_game_pad
            || self.identifiers.vendor_id == SECURITY_TOKEN_VENDOR_ID
    }

    fn default_manipulate_caps_lock_led(&self) -> bool {
        self.identifiers.is_keyboard
    }

    pub fn ignore(&self) -> bool {
        self.ignore.unwrap_or_else(|| self.default_ignore())
    }

    pub fn set_ignore(&mut self, value: bool) {
        self.ignore = Some(value);
        self.coordinate_between_properties();
    }

    pub fn manipulate_caps_lock_led(&self) -> bool {
        self.manipulate_caps_lock_led
            .unwrap_or_else(|| self.default_manipulate_caps_lock_led())
    }

    pub fn set_manipulate_caps_lock_led(&mut self, value: bool) {
        self.manipulate_caps_lock_led = Some(value);
        self.coordinate_between_properties();
    }

    pub fn treat_as_built_in_keyboard(&self) -> bool {
        self.treat_as_built_in_keyboard.unwrap_or(false)
    }

    pub fn set_treat_as_built_in_keyboard(&mut self, value: bool) {
        self.treat_as_built_in_keyboard = Some(value);
        self.coordinate_between_properties();
    }

    pub fn disable_built_in_keyboard_if_exists(&self) -> bool {
        self.disable_built_in_keyboard_if_exists.unwrap_or(false)
    }

    pub fn set_disable_built_in_keyboard_if_exists(&mut self, value: bool) {
        self.disable_built_in_keyboard_if_exists = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_flip_x(&self) -> bool {
        self.mouse_flip_x.unwrap_or(false)
    }

    pub fn set_mouse_flip_x(&mut self, value: bool) {
        self.mouse_flip_x = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_flip_y(&self) -> bool {
        self.mouse_flip_y.unwrap_or(false)
    }

    pub fn set_mouse_flip_y(&mut self, value: bool) {
        self.mouse_flip_y = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_flip_vertical_wheel(&self) -> bool {
        self.mouse_flip_vertical_wheel.unwrap_or(false)
    }

    pub fn set_mouse_flip_vertical_wheel(&mut self, value: bool) {
        self.mouse_flip_vertical_wheel = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_flip_horizontal_wheel(&self) -> bool {
        self.mouse_flip_horizontal_wheel.unwrap_or(false)
    }

    pub fn set_mouse_flip_horizontal_wheel(&mut self, value: bool) {
        self.mouse_flip_horizontal_wheel = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_swap_xy(&self) -> bool {
        self.mouse_swap_xy.unwrap_or(false)
    }

    pub fn set_mouse_swap_xy(&mut self, value: bool) {
        self.mouse_swap_xy = Some(value);
        self.coordinate_between_properties();
    }

    pub fn mouse_swap_wheels(&self) -> bool {
        self.mouse_swap_wheels.unwrap_or(false)
    }

    pub fn set_mouse_swap_wheels(&mut self, value: bool) {
        self.mouse_swap_wheels = Some(value);
        self.coordinate_between_properties();
    }

    pub fn game_pad_swap_sticks(&self) -> bool {
        self.game_pad_swap_sticks.unwrap_or(false)
    }

    pub fn set_game_pad_swap_sticks(&mut self, value: bool) {
        self.game_pad_swap_sticks = Some(value);
        self.coordinate_between_properties();
    }

    pub fn game_pad_xy_stick_deadzone(&self) -> f64 {
        self.game_pad_xy_stick_deadzone.unwrap_or(0.1)
    }

    pub fn set_game_pad_xy_stick_deadzone(&mut self, value: f64) {
        self.game_pad_xy_stick_deadzone = Some(value);
        self.coordinate_between_properties();
    }

    pub fn game_pad_stick_scale(&self) -> f64 {
        self.game_pad_stick_scale.unwrap_or(1.0)
    }

    pub fn set_game_pad_stick_scale(&mut self, value: f64) {
        self.game_pad_stick_scale = Some(value);
        self.coordinate_between_properties();
    }

    /// Key remappings applied only while this device is the source.
    pub fn simple_modifications(&self) -> &SimpleModifications {
        &self.simple_modifications
    }

    pub fn simple_modifications_mut(&mut self) -> &mut SimpleModifications {
        &mut self.simple_modifications
    }

    /// Per-device fn-key overrides; unlike the profile-level store this one
    /// is not pre-seeded.
    pub fn fn_function_keys(&self) -> &SimpleModifications {
        &self.fn_function_keys
    }

    pub fn fn_function_keys_mut(&mut self) -> &mut SimpleModifications {
        &mut self.fn_function_keys
    }

    /// Re-renders the entry onto its original JSON so unknown keys survive.
    /// Flags equal to their (context-sensitive) default are omitted.
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        object.insert(
            "identifiers".to_string(),
            serde_json::to_value(&self.identifiers).unwrap_or(Value::Null),
        );

        set_or_erase_bool(&mut object, "ignore", self.ignore(), self.default_ignore());
        set_or_erase_bool(
            &mut object,
            "manipulate_caps_lock_led",
            self.manipulate_caps_lock_led(),
            self.default_manipulate_caps_lock_led(),
        );
        set_or_erase_bool(
            &mut object,
            "treat_as_built_in_keyboard",
            self.treat_as_built_in_keyboard(),
            false,
        );
        set_or_erase_bool(
            &mut object,
            "disable_built_in_keyboard_if_exists",
            self.disable_built_in_keyboard_if_exists(),
            false,
        );
        set_or_erase_bool(&mut object, "mouse_flip_x", self.mouse_flip_x(), false);
        set_or_erase_bool(&mut object, "mouse_flip_y", self.mouse_flip_y(), false);
        set_or_erase_bool(
            &mut object,
            "mouse_flip_vertical_wheel",
            self.mouse_flip_vertical_wheel(),
            false,
        );
        set_or_erase_bool(
            &mut object,
            "mouse_flip_horizontal_wheel",
            self.mouse_flip_horizontal_wheel(),
            false,
        );
        set_or_erase_bool(&mut object, "mouse_swap_xy", self.mouse_swap_xy(), false);
        set_or_erase_bool(&mut object, "mouse_swap_wheels", self.mouse_swap_wheels(), false);
        set_or_erase_bool(
            &mut object,
            "game_pad_swap_sticks",
            self.game_pad_swap_sticks(),
            false,
        );
        set_or_erase_f64(
            &mut object,
            "game_pad_xy_stick_deadzone",
            self.game_pad_xy_stick_deadzone(),
            0.1,
        );
        set_or_erase_f64(
            &mut object,
            "game_pad_stick_scale",
            self.game_pad_stick_scale(),
            1.0,
        );

        for (key, store) in [
            ("simple_modifications", &self.simple_modifications),
            ("fn_function_keys", &self.fn_function_keys),
        ] {
            let rendered = store.to_json();
            if rendered.as_array().is_some_and(Vec::is_empty) {
                object.remove(key);
            } else {
                object.insert(key.to_string(), rendered);
            }
        }

        Value::Object(object)
    }

    // If both flags are true, the device would always be disabled; force
    // `disable_built_in_keyboard_if_exists` off.
    fn coordinate_between_properties(&mut self) {
        if self.treat_as_built_in_keyboard() && self.disable_built_in_keyboard_if_exists() {
            self.disable_built_in_keyboard_if_exists = Some(false);
        }
    }
}

fn read_bool(object: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ConfigError::unmarshal(format!(
            "`{key}` must be a boolean, but is `{}`",
            json::dump_for_error_message(other)
        ))),
    }
}

fn read_f64(object: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            ConfigError::unmarshal(format!(
                "`{key}` must be a number, but is `{}`",
                json::dump_for_error_message(value)
            ))
        }),
    }
}

fn set_or_erase_bool(object: &mut Map<String, Value>, key: &str, value: bool, default: bool) {
    if value == default {
        object.remove(key);
    } else {
        object.insert(key.to_string(), Value::Bool(value));
    }
}

fn set_or_erase_f64(object: &mut Map<String, Value>, key: &str, value: f64, default: f64) {
    if (value - default).abs() < f64::EPSILON {
        object.remove(key);
    } else {
        object.insert(key.to_string(), Value::from(value));
    }
}
