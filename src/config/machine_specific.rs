//! Settings keyed by machine identifier, for configurations shared between
//! machines.

use serde_json::{Map, Value};
use tracing::warn;

use crate::json;

#[derive(Debug, Clone, Default)]
pub struct MachineSpecificEntry {
    json: Value,
    enable_multitouch_extension: bool,
}

impl MachineSpecificEntry {
    fn new(value: &Value) -> Self {
        let mut entry = Self {
            json: value.clone(),
            ..Self::default()
        };

        match json::find_value(value, "enable_multitouch_extension") {
            None => {}
            Some(Value::Bool(b)) => entry.enable_multitouch_extension = *b,
            Some(other) => warn!(
                "`enable_multitouch_extension` must be a boolean, but is `{}`; using the default",
                json::dump_for_error_message(other)
            ),
        }

        entry
    }

    #[must_use]
    pub fn enable_multitouch_extension(&self) -> bool {
        self.enable_multitouch_extension
    }

    pub fn set_enable_multitouch_extension(&mut self, value: bool) {
        self.enable_multitouch_extension = value;
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        if self.enable_multitouch_extension {
            object.insert(
                "enable_multitouch_extension".to_string(),
                Value::Bool(true),
            );
        } else {
            object.remove("enable_multitouch_extension");
        }

        Value::Object(object)
    }
}

/// The `machine_specific` subtree: one entry per machine identifier.
#[derive(Debug, Clone, Default)]
pub struct MachineSpecific {
    json: Value,
    entries: Vec<(String, MachineSpecificEntry)>,
}

impl MachineSpecific {
    pub fn new(value: &Value) -> Self {
        let mut machine_specific = Self {
            json: value.clone(),
            entries: Vec::new(),
        };

        if let Some(object) = value.as_object() {
            for (key, entry_value) in object {
                if entry_value.is_object() {
                    machine_specific
                        .entries
                        .push((key.clone(), MachineSpecificEntry::new(entry_value)));
                } else {
                    warn!(
                        "`machine_specific.{key}` must be an object, but is `{}`; ignored",
                        json::dump_for_error_message(entry_value)
                    );
                }
            }
        }

        machine_specific
    }

    #[must_use]
    pub fn get(&self, machine_identifier: &str) -> Option<&MachineSpecificEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == machine_identifier)
            .map(|(_, e)| e)
    }

    /// Returns the entry for this machine, inserting a default one first if
    /// needed.
    pub fn get_or_insert(&mut self, machine_identifier: &str) -> &mut MachineSpecificEntry {
        if !self.entries.iter().any(|(k, _)| k == machine_identifier) {
            self.entries.push((
                machine_identifier.to_string(),
                MachineSpecificEntry::default(),
            ));
        }
        let index = self
            .entries
            .iter()
            .position(|(k, _)| k == machine_identifier)
            .unwrap_or(0);
        &mut self.entries[index].1
    }

    /// Re-renders onto the original subtree; entries that serialize to an
    /// empty object are omitted.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        for (key, entry) in &self.entries {
            let rendered = entry.to_json();
            if rendered.as_object().is_some_and(Map::is_empty) {
                object.remove(key);
            } else {
                object.insert(key.clone(), rendered);
            }
        }

        Value::Object(object)
    }
}
