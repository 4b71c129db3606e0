//! The top-level configuration document.
//!
//! Loading is fail-soft: a missing, unreadable, foreign-owned, or malformed
//! file logs the problem and yields a default document, so the daemon always
//! comes up with a usable configuration. Saving re-renders onto the
//! originally loaded tree (unknown keys survive), takes a dated backup
//! first, and writes atomically with restrictive permissions.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::config::global::GlobalConfiguration;
use crate::config::machine_specific::MachineSpecific;
use crate::config::profile::Profile;
use crate::error::Result;
use crate::json;

const DEFAULT_PROFILE_NAME: &str = "Default profile";
const NEW_PROFILE_NAME: &str = "New profile";
const BACKUP_PREFIX: &str = "remapd_";
const BACKUP_RETENTION: usize = 20;

#[derive(Debug, Clone)]
pub struct ConfigDocument {
    json: Value,
    loaded: bool,
    global: GlobalConfiguration,
    machine_specific: MachineSpecific,
    profiles: Vec<Profile>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let mut profile = Profile::with_name(DEFAULT_PROFILE_NAME);
        profile.set_selected(true);

        Self {
            json: Value::Object(Map::new()),
            loaded: false,
            global: GlobalConfiguration::default(),
            machine_specific: MachineSpecific::default(),
            profiles: vec![profile],
        }
    }
}

impl ConfigDocument {
    pub fn new(value: &Value) -> Result<Self> {
        let object = json::requires_object(value, "configuration")?;

        let mut document = Self {
            json: value.clone(),
            loaded: false,
            global: GlobalConfiguration::default(),
            machine_specific: MachineSpecific::default(),
            profiles: Vec::new(),
        };

        if let Some(v) = object.get("global") {
            document.global = GlobalConfiguration::new(v);
        }
        if let Some(v) = object.get("machine_specific") {
            document.machine_specific = MachineSpecific::new(v);
        }
        if let Some(v) = object.get("profiles") {
            let entries = json::requires_array(v, "`profiles`")?;
            for entry in entries {
                document
                    .profiles
                    .push(Profile::new(entry).map_err(|e| e.in_key("profiles"))?);
            }
        }

        if document.profiles.is_empty() {
            let mut profile = Profile::with_name(DEFAULT_PROFILE_NAME);
            profile.set_selected(true);
            document.profiles.push(profile);
        }

        Ok(document)
    }

    /// Loads `path`, falling back to the default document on any problem.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(document) => document,
            Err(e) => {
                error!("failed to load {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        verify_owner(path)?;

        let text = fs::read_to_string(path)?;
        let value = json::parse_jsonc(&text)?;

        let mut document = Self::new(&value)?;
        document.loaded = true;
        Ok(document)
    }

    /// True when the document actually came from disk rather than defaults.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn global(&self) -> &GlobalConfiguration {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalConfiguration {
        &mut self.global
    }

    #[must_use]
    pub fn machine_specific(&self) -> &MachineSpecific {
        &self.machine_specific
    }

    pub fn machine_specific_mut(&mut self) -> &mut MachineSpecific {
        &mut self.machine_specific
    }

    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut [Profile] {
        &mut self.profiles
    }

    /// The selected profile, falling back to the first one when the
    /// document marks none (or several; the first marked wins).
    #[must_use]
    pub fn selected_profile(&self) -> &Profile {
        self.profiles
            .iter()
            .find(|p| p.selected())
            .unwrap_or(&self.profiles[0])
    }

    pub fn selected_profile_mut(&mut self) -> &mut Profile {
        let index = self
            .profiles
            .iter()
            .position(Profile::selected)
            .unwrap_or(0);
        &mut self.profiles[index]
    }

    /// Marks exactly one profile as selected. Out-of-range indices leave
    /// the document unchanged.
    pub fn select_profile(&mut self, index: usize) {
        if index >= self.profiles.len() {
            return;
        }
        for (i, profile) in self.profiles.iter_mut().enumerate() {
            profile.set_selected(i == index);
        }
    }

    pub fn push_back_profile(&mut self) {
        self.profiles.push(Profile::with_name(NEW_PROFILE_NAME));
    }

    /// Removes the profile at `index`. The last remaining profile cannot be
    /// removed; if the selected profile goes away, the first one takes over.
    pub fn erase_profile(&mut self, index: usize) {
        if index >= self.profiles.len() || self.profiles.len() == 1 {
            return;
        }
        self.profiles.remove(index);
        if !self.profiles.iter().any(Profile::selected) {
            self.profiles[0].set_selected(true);
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let global = self.global.to_json();
        if global.as_object().is_some_and(Map::is_empty) {
            object.remove("global");
        } else {
            object.insert("global".to_string(), global);
        }

        let machine_specific = self.machine_specific.to_json();
        if machine_specific.as_object().is_some_and(Map::is_empty) {
            object.remove("machine_specific");
        } else {
            object.insert("machine_specific".to_string(), machine_specific);
        }

        object.insert(
            "profiles".to_string(),
            Value::Array(self.profiles.iter().map(Profile::to_json).collect()),
        );

        Value::Object(object)
    }

    /// Backs up the current file (at most once per day), prunes old
    /// backups, then atomically writes the document with 0600 permissions
    /// under a 0700 directory.
    pub fn sync_save_to_file(&self, path: &Path) -> Result<()> {
        if let Err(e) = backup(path) {
            // A failed backup is not worth losing the save over.
            warn!("failed to back up {}: {e}", path.display());
        }

        json::sync_save_to_file(&self.to_json(), path, 0o700, 0o600)
    }
}

fn backup(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    let directory = parent.join("automatic_backups");
    let stamp = chrono::Local::now().format("%Y%m%d");
    let backup_path = directory.join(format!("{BACKUP_PREFIX}{stamp}.json"));

    if !backup_path.exists() {
        fs::create_dir_all(&directory)?;
        fs::copy(path, &backup_path)?;
    }

    prune_backups(&directory)
}

// Backup names embed the date, so lexicographic order is chronological.
fn prune_backups(directory: &Path) -> Result<()> {
    let mut names: Vec<String> = fs::read_dir(directory)?
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(BACKUP_PREFIX) && name.ends_with(".json"))
        .collect();
    names.sort();

    while names.len() > BACKUP_RETENTION {
        let oldest = names.remove(0);
        fs::remove_file(directory.join(oldest))?;
    }

    Ok(())
}

#[cfg(unix)]
fn verify_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let uid = fs::metadata(path)?.uid();
    if uid != 0 && uid != nix::unistd::geteuid().as_raw() {
        return Err(crate::error::ConfigError::unmarshal(format!(
            "{} is owned by uid {uid}, not by root or the current user",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn verify_owner(path: &Path) -> Result<()> {
    fs::metadata(path)?;
    Ok(())
}
