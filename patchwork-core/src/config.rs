//! Per-checkout YAML configuration and sync state, plus the patches-repo
//! marker files.
//!
//! # Storage layout
//!
//! ```text
//! <working tree>/
//!   .patchwork/
//!     config.yaml        (written by `init` or a bootstrapping `clone`)
//!     state.yaml         (last pull / push events)
//!     logs/activity.log
//!     templates/*.tera   (optional activity-log overrides)
//!
//! <patches repo>/
//!   BASE_COMMIT          (required)
//!   UPSTREAM_VERSION     (optional, MAJOR=/MINOR=/BUILD=/PATCH= lines)
//!   chromium_patches/    (the store)
//! ```
//!
//! Every writer serialises to a `.tmp` sibling and renames it into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const STATE_DIR_NAME: &str = ".patchwork";
pub const CONFIG_FILE: &str = "config.yaml";
pub const STATE_FILE: &str = "state.yaml";
pub const LOGS_DIR: &str = "logs";
pub const TEMPLATES_DIR: &str = "templates";
pub const BASE_COMMIT_FILE: &str = "BASE_COMMIT";
pub const UPSTREAM_VERSION_FILE: &str = "UPSTREAM_VERSION";
pub const DEFAULT_PATCHES_DIR: &str = "chromium_patches";
pub const DEFAULT_APPLY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 120;

/// Directories that must exist for a path to be treated as an upstream checkout.
pub const DEFAULT_CHECKOUT_MARKERS: &[&str] = &["chrome", "base"];

// ---------------------------------------------------------------------------
// 1. Config
// ---------------------------------------------------------------------------

/// `.patchwork/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    /// Absolute, or relative to the working-tree root.
    pub patches_repo: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patches_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(name: impl Into<String>, patches_repo: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            patches_repo: patches_repo.into(),
            patches_dir: None,
            apply_timeout_secs: None,
            git_timeout_secs: None,
        }
    }

    pub fn patches_dir(&self) -> &str {
        self.patches_dir.as_deref().unwrap_or(DEFAULT_PATCHES_DIR)
    }

    pub fn apply_timeout_secs(&self) -> u64 {
        self.apply_timeout_secs.unwrap_or(DEFAULT_APPLY_TIMEOUT_SECS)
    }

    pub fn git_timeout_secs(&self) -> u64 {
        self.git_timeout_secs.unwrap_or(DEFAULT_GIT_TIMEOUT_SECS)
    }

    /// Resolve `patches_repo` against the working-tree root.
    pub fn resolve_patches_repo(&self, working_tree: &Path) -> PathBuf {
        if self.patches_repo.is_absolute() {
            self.patches_repo.clone()
        } else {
            working_tree.join(&self.patches_repo)
        }
    }
}

pub fn read_config(state_dir: &Path) -> Result<Config, ConfigError> {
    read_yaml(&state_dir.join(CONFIG_FILE))
}

/// Write `config.yaml`, creating the state directory if needed.
pub fn write_config(state_dir: &Path, config: &Config) -> Result<(), ConfigError> {
    std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;
    write_yaml_atomic(&state_dir.join(CONFIG_FILE), config)
}

// ---------------------------------------------------------------------------
// 2. State
// ---------------------------------------------------------------------------

/// One completed sync, recorded after a non-dry-run clone, pull or push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub patches_repo_rev: String,
    pub timestamp: DateTime<Utc>,
    pub file_count: usize,
}

impl SyncEvent {
    pub fn now(patches_repo_rev: impl Into<String>, file_count: usize) -> Self {
        Self {
            patches_repo_rev: patches_repo_rev.into(),
            timestamp: Utc::now(),
            file_count,
        }
    }
}

/// `.patchwork/state.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pull: Option<SyncEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_push: Option<SyncEvent>,
}

/// Missing file yields an empty state.
pub fn read_state(state_dir: &Path) -> Result<State, ConfigError> {
    let path = state_dir.join(STATE_FILE);
    if !path.exists() {
        return Ok(State::default());
    }
    read_yaml(&path)
}

pub fn write_state(state_dir: &Path, state: &State) -> Result<(), ConfigError> {
    write_yaml_atomic(&state_dir.join(STATE_FILE), state)
}

// ---------------------------------------------------------------------------
// 3. Patches repo markers
// ---------------------------------------------------------------------------

/// Trimmed contents of `<patches_repo>/BASE_COMMIT`.
pub fn read_base_commit(patches_repo: &Path) -> Result<String, ConfigError> {
    let path = patches_repo.join(BASE_COMMIT_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::BaseMarkerMissing {
                repo: patches_repo.to_path_buf(),
            })
        }
        Err(e) => return Err(io_err(path, e)),
    };
    let commit = data.trim();
    if commit.is_empty() {
        return Err(ConfigError::BaseMarkerEmpty {
            repo: patches_repo.to_path_buf(),
        });
    }
    Ok(commit.to_string())
}

/// `MAJOR.MINOR.BUILD.PATCH` from `<patches_repo>/UPSTREAM_VERSION`.
///
/// Returns `None` when the file is absent or has no `MAJOR`.
pub fn read_upstream_version(patches_repo: &Path) -> Result<Option<String>, ConfigError> {
    let path = patches_repo.join(UPSTREAM_VERSION_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };

    let vars: HashMap<&str, &str> = data
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let get = |key: &str| vars.get(key).copied().unwrap_or_default();
    if get("MAJOR").is_empty() {
        return Ok(None);
    }
    Ok(Some(format!(
        "{}.{}.{}.{}",
        get("MAJOR"),
        get("MINOR"),
        get("BUILD"),
        get("PATCH")
    )))
}

/// `true` if `dir` has a `.git` entry and every marker directory.
pub fn looks_like_checkout(dir: &Path, markers: &[&str]) -> bool {
    dir.join(".git").exists() && markers.iter().all(|m| dir.join(m).exists())
}

// ---------------------------------------------------------------------------
// 4. YAML helpers
// ---------------------------------------------------------------------------

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 5. Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_roundtrip_omits_defaults() {
        let dir = TempDir::new().unwrap();
        let state_dir = dir.path().join(STATE_DIR_NAME);
        let config = Config::new("src", "../patches");

        write_config(&state_dir, &config).expect("write");
        let raw = std::fs::read_to_string(state_dir.join(CONFIG_FILE)).unwrap();
        assert!(!raw.contains("patches_dir"));
        assert!(!state_dir.join("config.yaml.tmp").exists());

        let loaded = read_config(&state_dir).expect("read");
        assert_eq!(loaded, config);
        assert_eq!(loaded.patches_dir(), DEFAULT_PATCHES_DIR);
        assert_eq!(loaded.apply_timeout_secs(), 60);
        assert_eq!(loaded.git_timeout_secs(), 120);
    }

    #[test]
    fn relative_patches_repo_resolves_against_tree() {
        let config = Config::new("src", "../patches");
        assert_eq!(
            config.resolve_patches_repo(Path::new("/work/src")),
            PathBuf::from("/work/src/../patches")
        );
        let absolute = Config::new("src", "/opt/patches");
        assert_eq!(
            absolute.resolve_patches_repo(Path::new("/work/src")),
            PathBuf::from("/opt/patches")
        );
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: [unclosed").unwrap();
        let err = read_config(dir.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn state_missing_is_empty_and_roundtrips() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_state(dir.path()).unwrap(), State::default());

        let state = State {
            last_pull: Some(SyncEvent::now("abc123", 4)),
            last_push: None,
        };
        write_state(dir.path(), &state).unwrap();
        assert_eq!(read_state(dir.path()).unwrap(), state);
    }

    #[test]
    fn base_commit_is_trimmed_and_required() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_base_commit(dir.path()),
            Err(ConfigError::BaseMarkerMissing { .. })
        ));

        std::fs::write(dir.path().join(BASE_COMMIT_FILE), "  \n").unwrap();
        assert!(matches!(
            read_base_commit(dir.path()),
            Err(ConfigError::BaseMarkerEmpty { .. })
        ));

        std::fs::write(dir.path().join(BASE_COMMIT_FILE), "deadbeef\n").unwrap();
        assert_eq!(read_base_commit(dir.path()).unwrap(), "deadbeef");
    }

    #[test]
    fn upstream_version_parsing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_upstream_version(dir.path()).unwrap(), None);

        std::fs::write(
            dir.path().join(UPSTREAM_VERSION_FILE),
            "MAJOR=137\nMINOR=0\n\nBUILD=7151\nPATCH = 69\n",
        )
        .unwrap();
        assert_eq!(
            read_upstream_version(dir.path()).unwrap().as_deref(),
            Some("137.0.7151.69")
        );

        std::fs::write(dir.path().join(UPSTREAM_VERSION_FILE), "MINOR=1\n").unwrap();
        assert_eq!(read_upstream_version(dir.path()).unwrap(), None);
    }

    #[test]
    fn checkout_markers() {
        let dir = TempDir::new().unwrap();
        assert!(!looks_like_checkout(dir.path(), DEFAULT_CHECKOUT_MARKERS));
        for m in [".git", "chrome", "base"] {
            std::fs::create_dir(dir.path().join(m)).unwrap();
        }
        assert!(looks_like_checkout(dir.path(), DEFAULT_CHECKOUT_MARKERS));
        assert!(!looks_like_checkout(dir.path(), &["third_party"]));
    }
}
