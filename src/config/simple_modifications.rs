//! The versioned key-to-key remapping store.
//!
//! Three on-disk shapes feed the same store: v1 documents carry an object of
//! `{key_name: key_name}` strings, v2 an array of `{from, to}` objects with
//! `to` as a bare object, v3 the same array with `to` as an array of events.
//! Everything is normalized to v3 at ingestion.
//!
//! Pairs keep their structured `from`/`to` values plus a canonical
//! serialization of `from` used for ordering and deduplication, so malformed
//! edits are rejected at the edit site instead of being silently dropped at
//! save time.

use serde_json::{json, Map, Value};
use tracing::{error, warn};

use crate::json;

/// One remapping: a `from` event definition and an array of `to` events.
#[derive(Debug, Clone)]
pub struct SimpleModificationPair {
    from: Value,
    to: Value,
    canonical_from: String,
}

impl SimpleModificationPair {
    fn new(from: Value, to: Value) -> Self {
        let canonical_from = json::canonical_dump(&from);
        Self {
            from,
            to,
            canonical_from,
        }
    }

    #[must_use]
    pub fn from_value(&self) -> &Value {
        &self.from
    }

    #[must_use]
    pub fn to_value(&self) -> &Value {
        &self.to
    }

    /// True when the pair is complete enough to persist: `from` is a
    /// non-empty object and `to` is a non-empty array.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.from.as_object().is_some_and(|o| !o.is_empty())
            && self.to.as_array().is_some_and(|a| !a.is_empty())
    }
}

/// Ordered, deduplicated list of simple modification pairs.
#[derive(Debug, Clone, Default)]
pub struct SimpleModifications {
    pairs: Vec<SimpleModificationPair>,
}

impl SimpleModifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pairs(&self) -> &[SimpleModificationPair] {
        &self.pairs
    }

    /// Merges `input` into the store, accepting any of the three document
    /// versions. Existing pairs with a matching `from` get their `to`
    /// replaced, so a store pre-seeded with defaults keeps them unless the
    /// user overrode them. The result is sorted by natural order of the
    /// canonical `from`.
    pub fn update(&mut self, input: &Value) {
        match input {
            Value::Array(entries) => {
                for entry in entries {
                    self.update_from_v3_entry(entry);
                }
            }
            Value::Object(object) => {
                for (key, value) in object {
                    self.update_from_v1_entry(key, value);
                }
            }
            Value::Null => {}
            other => {
                error!(
                    "simple modifications must be an array or an object, but is `{}`",
                    json::dump_for_error_message(other)
                );
            }
        }

        self.pairs.sort_by(|a, b| {
            natord::compare(&a.canonical_from, &b.canonical_from)
        });
    }

    fn update_from_v3_entry(&mut self, entry: &Value) {
        let Some(object) = entry.as_object() else {
            error!(
                "simple modification entry must be an object, but is `{}`",
                json::dump_for_error_message(entry)
            );
            return;
        };

        let mut from = None;
        let mut to = None;

        for (key, value) in object {
            match key.as_str() {
                "from" => from = Some(value.clone()),
                "to" => to = Some(migrate_to_json(value)),
                _ => {
                    error!("unknown key `{key}` in simple modification entry");
                }
            }
        }

        if from.is_none() && to.is_none() {
            return;
        }

        self.insert_or_replace(SimpleModificationPair::new(
            from.unwrap_or_else(|| json!({})),
            to.unwrap_or_else(|| json!([])),
        ));
    }

    fn update_from_v1_entry(&mut self, key: &str, value: &Value) {
        let Some(to_key) = value.as_str() else {
            error!(
                "simple modification value for `{key}` must be a string, but is `{}`",
                json::dump_for_error_message(value)
            );
            return;
        };

        let from = if key.is_empty() {
            json!({})
        } else {
            json!({"key_code": key})
        };
        let to = if to_key.is_empty() {
            json!([])
        } else {
            json!([{"key_code": to_key}])
        };

        self.insert_or_replace(SimpleModificationPair::new(from, to));
    }

    // At most one pair per canonical from; the later entry wins.
    fn insert_or_replace(&mut self, pair: SimpleModificationPair) {
        if let Some(existing) = self
            .pairs
            .iter_mut()
            .find(|p| p.canonical_from == pair.canonical_from)
        {
            existing.to = pair.to;
        } else {
            self.pairs.push(pair);
        }
    }

    /// Appends an empty pair for the UI to fill in. Incomplete pairs are
    /// filtered out at save time.
    pub fn push_back_pair(&mut self) {
        self.pairs
            .push(SimpleModificationPair::new(json!({}), json!([])));
    }

    /// Replaces both sides of the pair at `index` from edit-box text. If
    /// either side fails to parse the pair is left untouched.
    pub fn replace_pair(&mut self, index: usize, from_text: &str, to_text: &str) {
        let Some(pair) = self.pairs.get_mut(index) else {
            return;
        };

        let (Ok(from), Ok(to)) = (json::parse_jsonc(from_text), json::parse_jsonc(to_text))
        else {
            warn!("ignoring malformed simple modification edit at index {index}");
            return;
        };

        *pair = SimpleModificationPair::new(from, migrate_to_json(&to));
    }

    /// Replaces the `to` of the pair whose `from` matches `from_text`. A
    /// parse failure on either side leaves the store untouched.
    pub fn replace_second(&mut self, from_text: &str, to_text: &str) {
        let (Ok(from), Ok(to)) = (json::parse_jsonc(from_text), json::parse_jsonc(to_text))
        else {
            warn!("ignoring malformed simple modification edit");
            return;
        };

        let canonical_from = json::canonical_dump(&from);
        if let Some(pair) = self
            .pairs
            .iter_mut()
            .find(|p| p.canonical_from == canonical_from)
        {
            pair.to = migrate_to_json(&to);
        }
    }

    pub fn erase_pair(&mut self, index: usize) {
        if index < self.pairs.len() {
            self.pairs.remove(index);
        }
    }

    /// Renders the v3 array: only complete pairs, one entry per canonical
    /// `from` (first occurrence wins).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut seen: Vec<&str> = Vec::new();
        let mut entries = Vec::new();

        for pair in &self.pairs {
            if !pair.is_complete() {
                continue;
            }
            if seen.contains(&pair.canonical_from.as_str()) {
                continue;
            }
            seen.push(&pair.canonical_from);

            let mut object = Map::new();
            object.insert("from".to_string(), pair.from.clone());
            object.insert("to".to_string(), pair.to.clone());
            entries.push(Value::Object(object));
        }

        Value::Array(entries)
    }
}

/// Normalizes a v2 `to` (bare object) into the v3 array form. An empty
/// object becomes an empty array; anything else passes through unchanged.
fn migrate_to_json(to: &Value) -> Value {
    match to {
        Value::Object(object) if object.is_empty() => json!([]),
        Value::Object(_) => json!([to.clone()]),
        _ => to.clone(),
    }
}
