//! Live-buffer linting through an external multi-linter aggregator.
//!
//! The host builds a [`SourceContext`] and calls [`LintInvoker::lint`]. In
//! background mode the unsaved buffer is materialized in an ephemeral
//! workspace next to its siblings; in on-demand mode the aggregator runs
//! directly in the source directory. Output is parsed by [`parser`].

pub mod parser;

mod environment;
mod error;
mod invoker;
mod notice;

pub use environment::build_environment;
pub use error::LintError;
pub use invoker::{LintInvoker, LintOutcome, SkipReason, include_filter};
pub use notice::{Notice, NoticeSink, TracingNotices};

pub use metalint_types::{Diagnostic, LintConfig, LintMode, Severity, SourceContext, ViewSettings};
