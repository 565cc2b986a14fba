//! Core domain types for metalint.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer: the runner, the workspace builder,
//! the invoker, and host adapters.

mod diagnostic;
mod settings;
mod source;

pub use diagnostic::{Diagnostic, Severity};
pub use settings::{CaptureMode, LintConfig, LintConfigError};
pub use source::{LintMode, SourceContext, ViewSettings};
