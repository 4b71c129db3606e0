//! Importable complex-modification rule bundles.
//!
//! Asset files live in the user assets directory and are only ever read;
//! importing copies rules into the profile's own store. The single
//! destructive operation, `unlink_file`, refuses paths that resolve outside
//! the assets directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::error;

use crate::config::complex_modifications::Rule;
use crate::config::parameters::{Parameters, COMPLEX_MODIFICATIONS_PARAMETERS};
use crate::error::{ConfigError, Result};
use crate::json;
use crate::manipulator;
use crate::paths;

#[derive(Debug, Clone)]
pub struct AssetBundle {
    path: PathBuf,
    title: String,
    rules: Vec<Rule>,
}

impl AssetBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value = json::parse_jsonc(&text)?;
        let object = json::requires_object(&value, "asset file")?;

        let title = json::find_string(&value, "title").unwrap_or_default().to_string();

        let parameters = Parameters::new(COMPLEX_MODIFICATIONS_PARAMETERS);
        let mut rules = Vec::new();
        if let Some(v) = object.get("rules") {
            let entries = json::requires_array(v, "`rules`")?;
            for entry in entries {
                rules.push(Rule::new(entry, &parameters).map_err(|e| e.in_key("rules"))?);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            title,
            rules,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Constructs every manipulator and condition in the bundle, collecting
    /// one message per failure.
    #[must_use]
    pub fn lint(&self) -> Vec<String> {
        self.rules.iter().flat_map(manipulator::lint_rule).collect()
    }

    /// Deletes the bundle's file, but only when it resolves under the user
    /// assets directory.
    pub fn unlink_file(&self) -> Result<()> {
        self.unlink_file_in(&paths::user_assets_directory()?)
    }

    fn unlink_file_in(&self, assets_directory: &Path) -> Result<()> {
        let file = fs::canonicalize(&self.path)?;
        let directory = fs::canonicalize(assets_directory)?;

        if !file.starts_with(&directory) {
            return Err(ConfigError::OutsideAssetsDirectory {
                path: self.path.display().to_string(),
            });
        }

        fs::remove_file(&file)?;
        Ok(())
    }
}

/// Loads every `.json` bundle in the user assets directory, sorted by file
/// name. Unparsable files are logged and skipped.
pub fn load_user_assets() -> Result<Vec<AssetBundle>> {
    load_assets_in(&paths::user_assets_directory()?)
}

fn load_assets_in(directory: &Path) -> Result<Vec<AssetBundle>> {
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    paths.sort();

    let mut bundles = Vec::new();
    for path in paths {
        match AssetBundle::load(&path) {
            Ok(bundle) => bundles.push(bundle),
            Err(e) => error!("failed to load asset file {}: {e}", path.display()),
        }
    }

    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_bundle(directory: &Path, name: &str, text: &str) -> PathBuf {
        let path = directory.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_bundle_with_comments() {
        let temp = TempDir::new().unwrap();
        let path = write_bundle(
            temp.path(),
            "caps.json",
            r#"{
                // community bundle
                "title": "Caps Lock tweaks",
                "rules": [{
                    "description": "caps to escape",
                    "manipulators": [{
                        "type": "basic",
                        "from": {"key_code": "caps_lock"},
                        "to": [{"key_code": "escape"}]
                    }]
                }]
            }"#,
        );

        let bundle = AssetBundle::load(&path).unwrap();
        assert_eq!(bundle.title(), "Caps Lock tweaks");
        assert_eq!(bundle.rules().len(), 1);
        assert!(bundle.lint().is_empty());
    }

    #[test]
    fn test_lint_reports_broken_manipulators() {
        let temp = TempDir::new().unwrap();
        let path = write_bundle(
            temp.path(),
            "broken.json",
            r#"{
                "title": "Broken",
                "rules": [{
                    "description": "broken rule",
                    "manipulators": [{"type": "basic"}]
                }]
            }"#,
        );

        let bundle = AssetBundle::load(&path).unwrap();
        assert_eq!(
            bundle.lint(),
            vec!["`broken rule` error: `from` is missing"]
        );
    }

    #[test]
    fn test_load_assets_in_skips_unparsable_files() {
        let temp = TempDir::new().unwrap();
        write_bundle(temp.path(), "a.json", r#"{"title": "A", "rules": []}"#);
        write_bundle(temp.path(), "b.json", "not json");
        write_bundle(temp.path(), "c.txt", "ignored");

        let bundles = load_assets_in(temp.path()).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].title(), "A");
    }

    #[test]
    fn test_unlink_refuses_paths_outside_assets_directory() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        let outside = write_bundle(temp.path(), "outside.json", r#"{"title": "X"}"#);

        let bundle = AssetBundle::load(&outside).unwrap();
        let err = bundle.unlink_file_in(&assets).unwrap_err();
        assert!(matches!(err, ConfigError::OutsideAssetsDirectory { .. }));
        assert!(outside.exists());
    }

    #[test]
    fn test_unlink_removes_files_inside_assets_directory() {
        let temp = TempDir::new().unwrap();
        let inside = write_bundle(temp.path(), "inside.json", r#"{"title": "X"}"#);

        let bundle = AssetBundle::load(&inside).unwrap();
        bundle.unlink_file_in(temp.path()).unwrap();
        assert!(!inside.exists());
    }
}
