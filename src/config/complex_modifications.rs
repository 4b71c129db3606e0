//! The rule tree for complex modifications.
//!
//! Construction is forward-compatible: unknown keys are carried through
//! untouched, while recognized keys with the wrong type raise `Unmarshal`
//! errors re-wrapped with the enclosing key so the message reads as a path
//! into the document.

use serde_json::{Map, Value};

use crate::config::parameters::{Parameters, COMPLEX_MODIFICATIONS_PARAMETERS};
use crate::error::{ConfigError, Result};
use crate::json;

/// An opaque condition payload. Semantic validation happens in the
/// manipulator factory; the store only carries the tree.
#[derive(Debug, Clone)]
pub struct Condition {
    json: Value,
}

impl Condition {
    pub fn new(value: &Value) -> Result<Self> {
        json::requires_object(value, "`conditions` entry")?;
        Ok(Self {
            json: value.clone(),
        })
    }

    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }
}

#[derive(Debug, Clone)]
pub struct Manipulator {
    json: Value,
    conditions: Vec<Condition>,
    parameters: Parameters,
    description: String,
}

impl Manipulator {
    /// Builds a manipulator from its JSON. `parameters` is the enclosing
    /// store's set; the manipulator starts from a copy and overrides it with
    /// its own `parameters` object.
    pub fn new(value: &Value, parameters: &Parameters) -> Result<Self> {
        let object = json::requires_object(value, "`manipulators` entry")?;

        let mut manipulator = Self {
            json: value.clone(),
            conditions: Vec::new(),
            parameters: parameters.clone(),
            description: String::new(),
        };

        for (key, value) in object {
            match key.as_str() {
                "conditions" => {
                    let entries = json::requires_array(value, "`conditions`")?;
                    for entry in entries {
                        manipulator
                            .conditions
                            .push(Condition::new(entry).map_err(|e| e.in_key(key))?);
                    }
                }
                "parameters" => {
                    manipulator.parameters.update(value)?;
                }
                "description" => {
                    manipulator.description =
                        json::requires_string(value, "`description`")?.to_string();
                }
                _ => {
                    // Unknown keys (from, to, type, ...) are validated by the
                    // manipulator factory, not here.
                }
            }
        }

        Ok(manipulator)
    }

    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    json: Value,
    enabled: bool,
    description: String,
    manipulators: Vec<Manipulator>,
}

impl Rule {
    pub fn new(value: &Value, parameters: &Parameters) -> Result<Self> {
        let object = json::requires_object(value, "`rules` entry")?;

        let mut manipulators = Vec::new();
        match object.get("manipulators") {
            None => {
                return Err(ConfigError::unmarshal("`manipulators` is missing"));
            }
            Some(v) => {
                let entries = json::requires_array(v, "`manipulators`")?;
                if entries.is_empty() {
                    return Err(ConfigError::unmarshal("`manipulators` must not be empty"));
                }
                for entry in entries {
                    manipulators.push(
                        Manipulator::new(entry, parameters)
                            .map_err(|e| e.in_key("manipulators"))?,
                    );
                }
            }
        }

        let mut description = match object.get("description") {
            Some(v) => json::requires_string(v, "`description`")?.to_string(),
            None => String::new(),
        };
        if description.is_empty() {
            // Fall back to the first manipulator that carries one.
            if let Some(m) = manipulators.iter().find(|m| !m.description().is_empty()) {
                description = m.description().to_string();
            }
        }

        let enabled = json::find_bool(value, "enabled").unwrap_or(true);

        Ok(Self {
            json: value.clone(),
            enabled,
            description,
            manipulators,
        })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, value: bool) {
        self.enabled = value;
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn manipulators(&self) -> &[Manipulator] {
        &self.manipulators
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        if self.enabled {
            object.remove("enabled");
        } else {
            object.insert("enabled".to_string(), Value::Bool(false));
        }

        Value::Object(object)
    }
}

#[derive(Debug, Clone)]
pub struct ComplexModifications {
    json: Value,
    parameters: Parameters,
    rules: Vec<Rule>,
}

impl Default for ComplexModifications {
    fn default() -> Self {
        Self {
            json: Value::Object(Map::new()),
            parameters: Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS),
            rules: Vec::new(),
        }
    }
}

impl ComplexModifications {
    pub fn new(value: &Value) -> Result<Self> {
        let object = json::requires_object(value, "`complex_modifications`")?;

        let mut store = Self {
            json: value.clone(),
            ..Self::default()
        };

        // Parameters must land before rules so manipulators copy the
        // overridden values.
        if let Some(v) = object.get("parameters") {
            store.parameters.update(v)?;
        }

        if let Some(v) = object.get("rules") {
            let entries = json::requires_array(v, "`rules`")?;
            for entry in entries {
                store
                    .rules
                    .push(Rule::new(entry, &store.parameters).map_err(|e| e.in_key("rules"))?);
            }
        }

        Ok(store)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn rules_mut(&mut self) -> &mut [Rule] {
        &mut self.rules
    }

    /// Appends a rule built from `value` against the store's parameters.
    pub fn push_back_rule(&mut self, value: &Value) -> Result<()> {
        let rule = Rule::new(value, &self.parameters)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn erase_rule(&mut self, index: usize) {
        if index < self.rules.len() {
            self.rules.remove(index);
        }
    }

    pub fn swap_rules(&mut self, a: usize, b: usize) {
        if a < self.rules.len() && b < self.rules.len() {
            self.rules.swap(a, b);
        }
    }

    pub fn set_parameter_value(&mut self, name: &str, value: i64) {
        self.parameters.set_value(name, value);
    }

    /// The smallest and largest value of `name` in effect anywhere in the
    /// store: the store-level value plus every manipulator's override.
    /// `None` for names outside the closed set.
    #[must_use]
    pub fn minmax_parameter_value(&self, name: &str) -> Option<(i64, i64)> {
        let mut min = self.parameters.get(name)?;
        let mut max = min;

        for rule in &self.rules {
            for manipulator in rule.manipulators() {
                if let Some(v) = manipulator.parameters().get(name) {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
        }

        Some((min, max))
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let parameters = self.parameters.to_json();
        if parameters.as_object().is_some_and(Map::is_empty) {
            object.remove("parameters");
        } else {
            object.insert("parameters".to_string(), parameters);
        }

        if self.rules.is_empty() {
            object.remove("rules");
        } else {
            object.insert(
                "rules".to_string(),
                Value::Array(self.rules.iter().map(Rule::to_json).collect()),
            );
        }

        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> ComplexModifications {
        ComplexModifications::new(&value).unwrap()
    }

    #[test]
    fn test_empty_store() {
        let s = ComplexModifications::default();
        assert!(s.rules().is_empty());
        assert_eq!(
            s.parameters().get("basic.to_if_alone_timeout_milliseconds"),
            Some(1000)
        );
    }

    #[test]
    fn test_rule_requires_manipulators() {
        let err = ComplexModifications::new(&json!({
            "rules": [{"description": "empty rule"}],
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`rules` error: `manipulators` is missing"
        );

        let err = ComplexModifications::new(&json!({
            "rules": [{"manipulators": []}],
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`rules` error: `manipulators` must not be empty"
        );
    }

    #[test]
    fn test_nested_error_reads_as_path() {
        let err = ComplexModifications::new(&json!({
            "rules": [{"manipulators": [{"conditions": {"type": "device_if"}}]}],
        }))
        .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("`rules` error: `manipulators` error: `conditions` must be an array"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_rule_description_falls_back_to_manipulator() {
        let s = store(json!({
            "rules": [{
                "manipulators": [
                    {"type": "basic", "from": {"key_code": "a"}},
                    {"type": "basic", "from": {"key_code": "b"}, "description": "b to c"},
                ],
            }],
        }));
        assert_eq!(s.rules()[0].description(), "b to c");
    }

    #[test]
    fn test_rule_enabled_defaults_to_true() {
        let s = store(json!({
            "rules": [
                {"manipulators": [{"type": "basic"}]},
                {"enabled": false, "manipulators": [{"type": "basic"}]},
            ],
        }));
        assert!(s.rules()[0].enabled());
        assert!(!s.rules()[1].enabled());
    }

    #[test]
    fn test_manipulator_parameters_layering() {
        let s = store(json!({
            "parameters": {"basic.to_if_alone_timeout_milliseconds": 500},
            "rules": [{
                "manipulators": [
                    {"type": "basic"},
                    {"type": "basic", "parameters": {"basic.to_if_alone_timeout_milliseconds": 250}},
                ],
            }],
        }));

        let manipulators = s.rules()[0].manipulators();
        assert_eq!(
            manipulators[0]
                .parameters()
                .get("basic.to_if_alone_timeout_milliseconds"),
            Some(500)
        );
        assert_eq!(
            manipulators[1]
                .parameters()
                .get("basic.to_if_alone_timeout_milliseconds"),
            Some(250)
        );
    }

    #[test]
    fn test_minmax_parameter_value() {
        let s = store(json!({
            "parameters": {"basic.to_if_alone_timeout_milliseconds": 800},
            "rules": [{
                "manipulators": [
                    {"type": "basic", "parameters": {"basic.to_if_alone_timeout_milliseconds": 250}},
                    {"type": "basic", "parameters": {"basic.to_if_alone_timeout_milliseconds": 1200}},
                ],
            }],
        }));

        assert_eq!(
            s.minmax_parameter_value("basic.to_if_alone_timeout_milliseconds"),
            Some((250, 1200))
        );
        assert_eq!(s.minmax_parameter_value("unknown"), None);
    }

    #[test]
    fn test_rule_mutations() {
        let mut s = store(json!({
            "rules": [
                {"description": "first", "manipulators": [{"type": "basic"}]},
                {"description": "second", "manipulators": [{"type": "basic"}]},
            ],
        }));

        s.swap_rules(0, 1);
        assert_eq!(s.rules()[0].description(), "second");

        s.push_back_rule(&json!({"description": "third", "manipulators": [{"type": "basic"}]}))
            .unwrap();
        assert_eq!(s.rules().len(), 3);

        s.erase_rule(0);
        assert_eq!(s.rules()[0].description(), "first");

        // Out-of-range indices are ignored.
        s.erase_rule(10);
        s.swap_rules(0, 10);
        assert_eq!(s.rules().len(), 2);
    }

    #[test]
    fn test_to_json_round_trip_preserves_unknown_keys() {
        let input = json!({
            "future_key": 1,
            "rules": [{
                "description": "rule",
                "future_rule_key": 2,
                "manipulators": [{"type": "basic", "from": {"key_code": "a"}}],
            }],
        });
        let s = store(input.clone());
        assert_eq!(s.to_json(), input);
    }

    #[test]
    fn test_to_json_overlays_enabled() {
        let mut s = store(json!({
            "rules": [{"manipulators": [{"type": "basic"}]}],
        }));
        s.rules_mut()[0].set_enabled(false);
        assert_eq!(s.to_json()["rules"][0]["enabled"], json!(false));
    }
}
