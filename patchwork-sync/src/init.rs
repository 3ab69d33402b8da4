//! Registering a checkout with a patches repo.

use std::path::{Path, PathBuf};

use patchwork_core::config::{
    looks_like_checkout, write_config, Config, CONFIG_FILE, DEFAULT_CHECKOUT_MARKERS, LOGS_DIR,
    STATE_DIR_NAME,
};
use patchwork_core::{ConfigError, Context};
use patchwork_git::GitRunner;

use crate::error::{io_err, SyncError};
use crate::store;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub patches_repo: PathBuf,
    /// Display name; defaults to the checkout directory's name.
    pub name: Option<String>,
    /// Store directory inside the patches repo.
    pub patches_dir: Option<String>,
    /// Directories that must exist alongside `.git`.
    pub markers: Vec<String>,
}

impl InitOptions {
    pub fn new(patches_repo: impl Into<PathBuf>) -> Self {
        Self {
            patches_repo: patches_repo.into(),
            name: None,
            patches_dir: None,
            markers: DEFAULT_CHECKOUT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub config: Config,
    pub context: Context,
    /// Canonical paths currently tracked by the store.
    pub store_entries: usize,
}

/// Build the config `init` would write for `dir`.
pub fn config_for(dir: &Path, opts: &InitOptions) -> Config {
    let name = opts.name.clone().unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkout".to_string())
    });
    let patches_repo = if opts.patches_repo.is_absolute() {
        opts.patches_repo.clone()
    } else {
        dir.join(&opts.patches_repo)
    };
    let mut config = Config::new(name, patches_repo);
    config.patches_dir = opts.patches_dir.clone();
    config
}

/// Validate `dir` and the patches repo, then write `.patchwork/config.yaml`.
pub fn init_checkout(dir: &Path, runner: &dyn GitRunner, opts: &InitOptions) -> Result<InitReport, SyncError> {
    let markers: Vec<&str> = opts.markers.iter().map(String::as_str).collect();
    if !looks_like_checkout(dir, &markers) {
        return Err(ConfigError::NotUpstreamCheckout {
            dir: dir.to_path_buf(),
            markers: opts.markers.clone(),
        }
        .into());
    }
    let state_dir = dir.join(STATE_DIR_NAME);
    let config_path = state_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(ConfigError::AlreadyInitialized { path: config_path }.into());
    }

    let config = config_for(dir, opts);
    let context = bootstrap(dir, runner, &config, true)?;
    let logs = state_dir.join(LOGS_DIR);
    std::fs::create_dir_all(&logs).map_err(|e| io_err(&logs, e))?;

    let store_entries = store::read_patch_files(&context.store_root)?.len();
    tracing::info!(
        "initialized {} against {} ({store_entries} store entries)",
        context.checkout_name,
        context.patches_repo.display()
    );
    Ok(InitReport {
        config,
        context,
        store_entries,
    })
}

/// Resolve a context for a checkout that may not have `.patchwork/` yet.
///
/// Checks that the base commit is in the checkout's history. With `persist`
/// the config is written.
pub fn bootstrap(
    dir: &Path,
    runner: &dyn GitRunner,
    config: &Config,
    persist: bool,
) -> Result<Context, SyncError> {
    let context = Context::from_config(dir, config)?;
    let git = crate::git_for(&context, runner);
    if !git.commit_exists(&context.base_revision)? {
        return Err(SyncError::UnknownBaseCommit {
            commit: context.base_revision.clone(),
        });
    }
    if persist {
        write_config(&context.state_dir, config)?;
    }
    Ok(context)
}
