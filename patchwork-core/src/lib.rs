//! Patchwork core library: domain types, diff parsing, delta computation and
//! checkout configuration.
//!
//! - [`types`]: `FilePatch`, `PatchSet`, `Delta`, result records
//! - [`parser`]: unified diff → `PatchSet`
//! - [`delta`]: local vs. store classification
//! - [`config`] / [`context`]: `.patchwork/` persistence and the resolved `Context`

pub mod config;
pub mod context;
pub mod delta;
pub mod error;
pub mod parser;
pub mod types;

pub use config::{Config, State, SyncEvent};
pub use context::{load_context, load_context_at, Context};
pub use delta::{compare, contents_equal, normalize_patch};
pub use error::{ConfigError, ParseError};
pub use parser::parse_unified_diff;
pub use types::{
    ConflictInfo, Delta, FileOperation, FilePatch, PatchSet, PullResult, PushResult,
};
