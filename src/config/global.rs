//! Application-wide settings shared by every profile.

use serde_json::{Map, Value};
use tracing::warn;

use crate::json;

#[derive(Debug, Clone)]
pub struct GlobalConfiguration {
    json: Value,
    check_for_updates_on_startup: bool,
    show_in_menu_bar: bool,
    ask_for_confirmation_before_quitting: bool,
    unsafe_ui: bool,
}

impl Default for GlobalConfiguration {
    fn default() -> Self {
        Self {
            json: Value::Object(Map::new()),
            check_for_updates_on_startup: true,
            show_in_menu_bar: true,
            ask_for_confirmation_before_quitting: true,
            unsafe_ui: false,
        }
    }
}

impl GlobalConfiguration {
    /// A wrong-typed flag keeps its default; the whole document is not worth
    /// failing over a display preference.
    pub fn new(value: &Value) -> Self {
        let mut global = Self {
            json: value.clone(),
            ..Self::default()
        };

        global.check_for_updates_on_startup =
            read_flag(value, "check_for_updates_on_startup", true);
        global.show_in_menu_bar = read_flag(value, "show_in_menu_bar", true);
        global.ask_for_confirmation_before_quitting =
            read_flag(value, "ask_for_confirmation_before_quitting", true);
        global.unsafe_ui = read_flag(value, "unsafe_ui", false);

        global
    }

    #[must_use]
    pub fn check_for_updates_on_startup(&self) -> bool {
        self.check_for_updates_on_startup
    }

    pub fn set_check_for_updates_on_startup(&mut self, value: bool) {
        self.check_for_updates_on_startup = value;
    }

    #[must_use]
    pub fn show_in_menu_bar(&self) -> bool {
        self.show_in_menu_bar
    }

    pub fn set_show_in_menu_bar(&mut self, value: bool) {
        self.show_in_menu_bar = value;
    }

    #[must_use]
    pub fn ask_for_confirmation_before_quitting(&self) -> bool {
        self.ask_for_confirmation_before_quitting
    }

    pub fn set_ask_for_confirmation_before_quitting(&mut self, value: bool) {
        self.ask_for_confirmation_before_quitting = value;
    }

    #[must_use]
    pub fn unsafe_ui(&self) -> bool {
        self.unsafe_ui
    }

    pub fn set_unsafe_ui(&mut self, value: bool) {
        self.unsafe_ui = value;
    }

    /// Re-renders onto the original subtree; flags at their default are
    /// omitted.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        for (key, value, default) in [
            (
                "check_for_updates_on_startup",
                self.check_for_updates_on_startup,
                true,
            ),
            ("show_in_menu_bar", self.show_in_menu_bar, true),
            (
                "ask_for_confirmation_before_quitting",
                self.ask_for_confirmation_before_quitting,
                true,
            ),
            ("unsafe_ui", self.unsafe_ui, false),
        ] {
            if value == default {
                object.remove(key);
            } else {
                object.insert(key.to_string(), Value::Bool(value));
            }
        }

        Value::Object(object)
    }
}

fn read_flag(value: &Value, key: &str, default: bool) -> bool {
    match json::find_value(value, key) {
        None => default,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            warn!(
                "`global.{key}` must be a boolean, but is `{}`; using the default",
                json::dump_for_error_message(other)
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let g = GlobalConfiguration::default();
        assert!(g.check_for_updates_on_startup());
        assert!(g.show_in_menu_bar());
        assert!(g.ask_for_confirmation_before_quitting());
        assert!(!g.unsafe_ui());
        assert_eq!(g.to_json(), json!({}));
    }

    #[test]
    fn test_explicit_values_round_trip() {
        let input = json!({"show_in_menu_bar": false, "future_key": true});
        let g = GlobalConfiguration::new(&input);
        assert!(!g.show_in_menu_bar());
        assert_eq!(g.to_json(), input);
    }

    #[test]
    fn test_wrong_type_keeps_default() {
        let g = GlobalConfiguration::new(&json!({"unsafe_ui": "yes"}));
        assert!(!g.unsafe_ui());
    }

    #[test]
    fn test_default_values_are_omitted_on_save() {
        let mut g = GlobalConfiguration::new(&json!({"show_in_menu_bar": false}));
        g.set_show_in_menu_bar(true);
        assert_eq!(g.to_json(), json!({}));
    }
}
