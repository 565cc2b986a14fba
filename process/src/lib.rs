//! Launches the external aggregator and captures its output.
//!
//! No knowledge of linting semantics lives here: a [`CommandSpec`] goes in,
//! captured bytes come out. A non-zero exit status is a normal outcome; only
//! failure to start the executable is an error ([`LaunchError`]).

mod error;
mod guard;
mod runner;
mod spec;

pub use error::LaunchError;
pub use metalint_types::CaptureMode;
pub use runner::{ProcessRunner, RunFut, SystemRunner};
pub use spec::CommandSpec;
