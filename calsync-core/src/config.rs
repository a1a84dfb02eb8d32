//! Global calsync configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalSyncError, CalSyncResult};
use crate::identity::Identity;

static DEFAULT_DATA_FILE: &str = "~/.local/share/calsync/store.json";

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn is_default_data_file(p: &PathBuf) -> bool {
    *p == default_data_file()
}

/// A user offered by the identity picker.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&RosterEntry> for Identity {
    fn from(entry: &RosterEntry) -> Self {
        Identity {
            id: entry.id.clone(),
            email: entry.email.clone(),
            display_name: Some(entry.display_name.clone()),
            avatar_url: entry.avatar_url.clone(),
        }
    }
}

/// Global configuration at ~/.config/calsync/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CalSyncConfig {
    /// Where the local collection store keeps its snapshot.
    #[serde(default = "default_data_file", skip_serializing_if = "is_default_data_file")]
    pub data_file: PathBuf,

    /// Where the currently selected user is remembered between runs.
    /// Defaults to `current_user.json` next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<RosterEntry>,
}

impl Default for CalSyncConfig {
    fn default() -> Self {
        CalSyncConfig {
            data_file: default_data_file(),
            identity_file: None,
            users: Vec::new(),
        }
    }
}

impl CalSyncConfig {
    pub fn config_dir() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir)
    }

    pub fn config_path() -> CalSyncResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load ~/.config/calsync/config.toml, creating a commented-out default
    /// file on first run.
    pub fn load() -> CalSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }

    /// Save the current config to ~/.config/calsync/config.toml
    pub fn save(&self) -> CalSyncResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> CalSyncResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalSyncError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Append a user to the roster. Ids must be unique.
    pub fn add_user(&mut self, entry: RosterEntry) -> CalSyncResult<()> {
        if self.find_user(&entry.id).is_some() {
            return Err(CalSyncError::Config(format!(
                "User '{}' already exists",
                entry.id
            )));
        }
        self.users.push(entry);
        Ok(())
    }

    /// Store snapshot path with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        expand(&self.data_file)
    }

    pub fn identity_path(&self) -> CalSyncResult<PathBuf> {
        match &self.identity_file {
            Some(path) => Ok(expand(path)),
            None => Ok(Self::config_dir()?.join("current_user.json")),
        }
    }

    pub fn find_user(&self, id: &str) -> Option<&RosterEntry> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Where events and shifts are stored:
# data_file = \"{}\"

# Where the selected user is remembered:
# identity_file = \"~/.config/calsync/current_user.json\"

# Users offered by `calsync user select`:
# [[users]]
# id = \"u1\"
# display_name = \"Ana\"
# email = \"ana@example.com\"
",
            DEFAULT_DATA_FILE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        CalSyncConfig::create_default_config(&path).unwrap();

        let config = CalSyncConfig::load_from(&path).unwrap();
        assert_eq!(config.data_file, default_data_file());
        assert!(config.identity_file.is_none());
        assert!(config.users.is_empty());
    }

    #[test]
    fn roster_is_read_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_file = "/tmp/calsync/store.json"

[[users]]
id = "u1"
display_name = "Ana"
email = "ana@example.com"

[[users]]
id = "u2"
display_name = "Luis"
"#,
        )
        .unwrap();

        let config = CalSyncConfig::load_from(&path).unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/tmp/calsync/store.json"));
        assert_eq!(config.users.len(), 2);

        let luis = config.find_user("u2").unwrap();
        let identity = Identity::from(luis);
        assert_eq!(identity.display_name.as_deref(), Some("Luis"));
        assert_eq!(identity.email, None);
        assert!(config.find_user("u3").is_none());
    }

    #[test]
    fn added_users_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = CalSyncConfig::default();
        config
            .add_user(RosterEntry {
                id: "u1".into(),
                display_name: "Ana".into(),
                email: Some("ana@example.com".into()),
                avatar_url: None,
            })
            .unwrap();
        let duplicate = RosterEntry {
            id: "u1".into(),
            display_name: "Other".into(),
            email: None,
            avatar_url: None,
        };
        assert!(config.add_user(duplicate).is_err());

        config.save_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("data_file"));

        let reloaded = CalSyncConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.users, config.users);
        assert_eq!(reloaded.data_file, default_data_file());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalSyncConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.data_file, default_data_file());
    }
}
