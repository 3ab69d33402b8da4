//! Resolved operating environment for one command invocation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{self, Config, STATE_DIR_NAME};
use crate::error::{io_err, ConfigError};

/// Everything an orchestrator needs to know about where it is running.
///
/// Built once per invocation and only ever passed by shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Root of the upstream checkout (parent of `.patchwork/`).
    pub working_tree: PathBuf,
    pub state_dir: PathBuf,
    pub patches_repo: PathBuf,
    /// Store directory inside the patches repo.
    pub store_root: PathBuf,
    pub base_revision: String,
    pub checkout_name: String,
    pub upstream_version: Option<String>,
    pub apply_timeout: Duration,
    pub git_timeout: Duration,
}

impl Context {
    /// Resolve a context from a config without requiring `.patchwork/` to
    /// exist yet. Used by `init` and a bootstrapping `clone`.
    pub fn from_config(working_tree: &Path, config: &Config) -> Result<Self, ConfigError> {
        let patches_repo = config.resolve_patches_repo(working_tree);
        let store_root = patches_repo.join(config.patches_dir());
        if !store_root.is_dir() {
            return Err(ConfigError::StoreMissing { path: store_root });
        }
        let base_revision = config::read_base_commit(&patches_repo)?;
        let upstream_version = config::read_upstream_version(&patches_repo)?;

        Ok(Self {
            working_tree: working_tree.to_path_buf(),
            state_dir: working_tree.join(STATE_DIR_NAME),
            patches_repo,
            store_root,
            base_revision,
            checkout_name: config.name.clone(),
            upstream_version,
            apply_timeout: Duration::from_secs(config.apply_timeout_secs()),
            git_timeout: Duration::from_secs(config.git_timeout_secs()),
        })
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join(config::LOGS_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.state_dir.join(config::TEMPLATES_DIR)
    }
}

/// Walk up from `start` to the nearest directory holding `.patchwork/`.
pub fn find_checkout_root(start: &Path) -> Result<PathBuf, ConfigError> {
    start
        .ancestors()
        .find(|dir| dir.join(STATE_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::NotACheckout {
            start: start.to_path_buf(),
        })
}

/// Discover the checkout above `start` and load its context.
pub fn load_context_at(start: &Path) -> Result<Context, ConfigError> {
    let working_tree = find_checkout_root(start)?;
    let config = config::read_config(&working_tree.join(STATE_DIR_NAME))?;
    Context::from_config(&working_tree, &config)
}

/// `load_context_at` convenience wrapper using the process working directory.
pub fn load_context() -> Result<Context, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
    load_context_at(&cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{write_config, BASE_COMMIT_FILE};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("src");
        let patches = dir.path().join("patches");
        std::fs::create_dir_all(tree.join("chrome/browser")).unwrap();
        std::fs::create_dir_all(patches.join("chromium_patches")).unwrap();
        std::fs::write(patches.join(BASE_COMMIT_FILE), "abc123\n").unwrap();
        write_config(&tree.join(STATE_DIR_NAME), &Config::new("src", "../patches")).unwrap();
        (dir, tree)
    }

    #[test]
    fn loads_from_nested_directory() {
        let (_dir, tree) = fixture();
        let ctx = load_context_at(&tree.join("chrome/browser")).expect("context");
        assert_eq!(ctx.working_tree, tree);
        assert_eq!(ctx.base_revision, "abc123");
        assert_eq!(ctx.checkout_name, "src");
        assert!(ctx.store_root.ends_with("chromium_patches"));
        assert_eq!(ctx.apply_timeout, Duration::from_secs(60));
        assert_eq!(ctx.upstream_version, None);
    }

    #[test]
    fn not_a_checkout() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_context_at(dir.path()),
            Err(ConfigError::NotACheckout { .. })
        ));
    }

    #[test]
    fn missing_store_dir() {
        let (dir, tree) = fixture();
        std::fs::remove_dir(dir.path().join("patches/chromium_patches")).unwrap();
        assert!(matches!(
            load_context_at(&tree),
            Err(ConfigError::StoreMissing { .. })
        ));
    }
}
