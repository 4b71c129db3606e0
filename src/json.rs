//! JSON helpers shared by the configuration stores.
//!
//! User documents are "jsonc": ordinary JSON that may carry `//` and
//! `/* */` comments. Parsing strips comments (string-aware) before handing
//! the text to `serde_json`. Saving is atomic: write to a temp file in the
//! destination directory, fix permissions, then rename over the target.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// Parse a comment-tolerant JSON document.
pub fn parse_jsonc(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(&strip_comments(text))?)
}

/// Replace `//` and `/* */` comments with spaces, leaving string literals
/// untouched. Positions are preserved so parse errors still point at the
/// right offset.
fn strip_comments(text: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Normal,
        InString,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Normal;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '"' => {
                    state = State::InString;
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                    out.push_str("  ");
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            State::InString => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' => state = State::Normal,
                    _ => {}
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                    out.push_str("  ");
                } else if c == '\n' {
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}

/// Serialize with object keys sorted recursively.
///
/// The in-memory trees preserve user key order for round-trips, so two
/// logically equal values can serialize differently. Canonical dumps are
/// used wherever serialized equality matters (simple-modification dedup).
pub fn canonical_dump(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(values) => Value::Array(values.iter().map(canonicalize).collect()),
        _ => value.clone(),
    }
}

/// Short, single-line rendering of a value for error messages.
pub fn dump_for_error_message(value: &Value) -> String {
    let mut s = value.to_string();
    if s.len() > 256 {
        s.truncate(253);
        s.push_str("...");
    }
    s
}

/// Requires `value` to be an object; the error names `what`.
pub fn requires_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ConfigError::unmarshal(format!(
            "{what} must be an object, but is `{}`",
            dump_for_error_message(value)
        ))
    })
}

/// Requires `value` to be an array; the error names `what`.
pub fn requires_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        ConfigError::unmarshal(format!(
            "{what} must be an array, but is `{}`",
            dump_for_error_message(value)
        ))
    })
}

/// Requires `value` to be a string; the error names `what`.
pub fn requires_string<'a>(value: &'a Value, what: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        ConfigError::unmarshal(format!(
            "{what} must be a string, but is `{}`",
            dump_for_error_message(value)
        ))
    })
}

/// Looks up `key` in an object value; `None` for non-objects.
pub fn find_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|o| o.get(key))
}

/// Looks up `key` and returns it only when it is an object.
pub fn find_object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    find_value(value, key).and_then(Value::as_object)
}

/// Looks up `key` and returns it only when it is an array.
pub fn find_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    find_value(value, key).and_then(Value::as_array)
}

/// Looks up `key` and returns it only when it is a bool.
pub fn find_bool(value: &Value, key: &str) -> Option<bool> {
    find_value(value, key).and_then(Value::as_bool)
}

/// Looks up `key` and returns it only when it is a string.
pub fn find_string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    find_value(value, key).and_then(Value::as_str)
}

/// Atomically write `value` to `path` with restrictive permissions.
///
/// The parent directory is created with `dir_mode`; the file ends up with
/// `file_mode`. The write goes through a temp file in the same directory so
/// a crash never leaves a truncated document behind.
pub fn sync_save_to_file(
    value: &Value,
    path: &Path,
    dir_mode: u32,
    file_mode: u32,
) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        ConfigError::unmarshal(format!("{} has no parent directory", path.display()))
    })?;

    create_directory(parent, dir_mode)?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;

    set_permissions(file.path(), file_mode)?;

    file.persist(path)
        .map_err(|e| ConfigError::Io(e.error))?;

    Ok(())
}

fn create_directory(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        if !path.exists() {
            fs::DirBuilder::new().recursive(true).mode(mode).create(path)?;
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
        fs::create_dir_all(path)?;
        Ok(())
    }
}

fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}
