//! # patchwork-renderer
//!
//! Tera-based renderer for `.patchwork/logs/activity.log` entries.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Local;
//! use patchwork_core::PushResult;
//! use patchwork_renderer::{ActivityContext, ActivityKind, TemplateEngine};
//!
//! fn entry(result: &PushResult) -> Option<String> {
//!     let engine = TemplateEngine::new(None).ok()?;
//!     let ctx = ActivityContext::push("abc123", result, Local::now());
//!     engine.render(ActivityKind::Push, &ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ActivityContext, ConflictCtx};
pub use engine::{ActivityKind, TemplateEngine};
pub use error::RenderError;
