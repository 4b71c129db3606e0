//! Named, clamped numeric settings with defaults.
//!
//! A `Parameters` instance is a closed set of integer settings described by
//! a static spec table. Values supplied out of range are clamped with a
//! warning, never rejected: the daemon must always end up with a usable
//! timing value.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::json;

/// One entry of a parameter table: name, default, optional clamp range.
#[derive(Debug)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Timing parameters for complex-modification manipulators.
pub static COMPLEX_MODIFICATIONS_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "basic.simultaneous_threshold_milliseconds",
        default: 50,
        min: Some(0),
        max: Some(1000),
    },
    ParameterSpec {
        name: "basic.to_if_alone_timeout_milliseconds",
        default: 1000,
        min: Some(0),
        max: None,
    },
    ParameterSpec {
        name: "basic.to_if_held_down_threshold_milliseconds",
        default: 500,
        min: Some(0),
        max: None,
    },
    ParameterSpec {
        name: "basic.to_delayed_action_delay_milliseconds",
        default: 500,
        min: Some(0),
        max: None,
    },
    ParameterSpec {
        name: "mouse_motion_to_scroll.speed",
        default: 100,
        min: Some(0),
        max: None,
    },
];

/// Profile-level parameters.
pub static PROFILE_PARAMETERS: &[ParameterSpec] = &[ParameterSpec {
    name: "delay_milliseconds_before_open_device",
    default: 1000,
    min: Some(0),
    max: None,
}];

/// A closed set of named integer settings, each with a default and an
/// optional clamp range.
#[derive(Debug, Clone)]
pub struct Parameters {
    specs: &'static [ParameterSpec],
    values: BTreeMap<&'static str, i64>,
    // Keys that were supplied by the user, as opposed to defaults. Only
    // these are rendered back to JSON.
    explicit: Vec<&'static str>,
}

impl Parameters {
    /// Creates a parameter set with every value at its default.
    pub fn new(specs: &'static [ParameterSpec]) -> Self {
        let values = specs.iter().map(|s| (s.name, s.default)).collect();
        Self {
            specs,
            values,
            explicit: Vec::new(),
        }
    }

    /// Overwrites the keys present in `input`, then re-applies all clamps.
    ///
    /// `input` must be an object. Unknown keys and recognized keys with a
    /// non-integer value are warned about and skipped.
    pub fn update(&mut self, input: &Value) -> Result<()> {
        let object = json::requires_object(input, "`parameters`")?;

        for (key, value) in object {
            let Some(spec) = self.specs.iter().find(|s| s.name == key) else {
                warn!("unknown parameter `{key}` is ignored");
                continue;
            };

            let Some(v) = value.as_i64() else {
                warn!(
                    "parameter `{key}` must be an integer, but is `{}`; ignored",
                    json::dump_for_error_message(value)
                );
                continue;
            };

            self.values.insert(spec.name, v);
            if !self.explicit.contains(&spec.name) {
                self.explicit.push(spec.name);
            }
        }

        self.normalize();

        Ok(())
    }

    /// Returns the current value for `name`, or `None` for names outside
    /// the closed set.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Returns the default for `name`.
    pub fn default_value(&self, name: &str) -> Option<i64> {
        self.specs.iter().find(|s| s.name == name).map(|s| s.default)
    }

    /// Sets one value, clamping it into range. Unknown names are ignored
    /// with a warning.
    pub fn set_value(&mut self, name: &str, value: i64) {
        let Some(spec) = self.specs.iter().find(|s| s.name == name) else {
            warn!("unknown parameter `{name}` is ignored");
            return;
        };

        self.values.insert(spec.name, clamp(spec, value));
        if !self.explicit.contains(&spec.name) {
            self.explicit.push(spec.name);
        }
    }

    /// True when `name` belongs to this parameter set.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Renders only the explicitly supplied keys, in spec order.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for spec in self.specs {
            if self.explicit.contains(&spec.name) {
                object.insert(spec.name.to_string(), Value::from(self.values[spec.name]));
            }
        }
        Value::Object(object)
    }

    fn normalize(&mut self) {
        for spec in self.specs {
            let value = self.values[spec.name];
            let clamped = clamp(spec, value);
            if clamped != value {
                warn!(
                    "parameter `{}` value {} is out of range; clamped to {}",
                    spec.name, value, clamped
                );
                self.values.insert(spec.name, clamped);
            }
        }
    }
}

fn clamp(spec: &ParameterSpec, value: i64) -> i64 {
    let mut v = value;
    if let Some(min) = spec.min {
        v = v.max(min);
    }
    if let Some(max) = spec.max {
        v = v.min(max);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        assert_eq!(p.get("basic.simultaneous_threshold_milliseconds"), Some(50));
        assert_eq!(p.get("basic.to_if_alone_timeout_milliseconds"), Some(1000));
        assert_eq!(
            p.get("basic.to_if_held_down_threshold_milliseconds"),
            Some(500)
        );
        assert_eq!(p.get("basic.to_delayed_action_delay_milliseconds"), Some(500));
        assert_eq!(p.get("mouse_motion_to_scroll.speed"), Some(100));
        assert_eq!(p.get("unknown"), None);
    }

    #[test]
    fn test_update_overwrites_only_present_keys() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        p.update(&json!({"basic.to_if_alone_timeout_milliseconds": 1234}))
            .unwrap();
        assert_eq!(p.get("basic.to_if_alone_timeout_milliseconds"), Some(1234));
        assert_eq!(p.get("basic.simultaneous_threshold_milliseconds"), Some(50));
    }

    #[test]
    fn test_update_ignores_wrong_type() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        p.update(&json!({"basic.to_if_alone_timeout_milliseconds": "1234"}))
            .unwrap();
        assert_eq!(p.get("basic.to_if_alone_timeout_milliseconds"), Some(1000));
    }

    #[test]
    fn test_update_requires_object() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        assert!(p.update(&json!([])).is_err());
    }

    #[test]
    fn test_clamp_lower_bound() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        p.update(&json!({
            "basic.simultaneous_threshold_milliseconds": -1000,
            "basic.to_if_alone_timeout_milliseconds": -1000,
            "basic.to_if_held_down_threshold_milliseconds": -1000,
            "basic.to_delayed_action_delay_milliseconds": -1000,
        }))
        .unwrap();
        assert_eq!(p.get("basic.simultaneous_threshold_milliseconds"), Some(0));
        assert_eq!(p.get("basic.to_if_alone_timeout_milliseconds"), Some(0));
        assert_eq!(p.get("basic.to_if_held_down_threshold_milliseconds"), Some(0));
        assert_eq!(p.get("basic.to_delayed_action_delay_milliseconds"), Some(0));
    }

    #[test]
    fn test_clamp_upper_bound_only_where_specified() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        p.update(&json!({
            "basic.simultaneous_threshold_milliseconds": 100_000,
            "basic.to_if_alone_timeout_milliseconds": 100_000,
        }))
        .unwrap();
        assert_eq!(
            p.get("basic.simultaneous_threshold_milliseconds"),
            Some(1000)
        );
        assert_eq!(
            p.get("basic.to_if_alone_timeout_milliseconds"),
            Some(100_000)
        );
    }

    #[test]
    fn test_set_value_clamps() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        p.set_value("basic.simultaneous_threshold_milliseconds", -1000);
        assert_eq!(p.get("basic.simultaneous_threshold_milliseconds"), Some(0));
    }

    #[test]
    fn test_to_json_renders_only_explicit_keys() {
        let mut p = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        assert_eq!(p.to_json(), json!({}));

        p.set_value("mouse_motion_to_scroll.speed", 30);
        assert_eq!(p.to_json(), json!({"mouse_motion_to_scroll.speed": 30}));
    }

    #[test]
    fn test_profile_parameters() {
        let p = Parameters::new(PROFILE_PARAMETERS);
        assert_eq!(p.get("delay_milliseconds_before_open_device"), Some(1000));
    }
}
