use std::io::{self, Write};

use metalint_lint::{Diagnostic, Notice, NoticeSink, TracingNotices};

use crate::args::Format;

pub const EXIT_CLEAN: u8 = 0;
pub const EXIT_FINDINGS: u8 = 1;
pub const EXIT_FAILURE: u8 = 2;

pub fn write_diagnostics(
    out: &mut impl Write,
    diagnostics: &[Diagnostic],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Text => {
            for diag in diagnostics {
                writeln!(out, "{diag}")?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, diagnostics)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Error diagnostics fail the run; warnings alone do not.
pub fn exit_code(diagnostics: &[Diagnostic]) -> u8 {
    if diagnostics.iter().any(|d| d.severity().is_error()) {
        EXIT_FINDINGS
    } else {
        EXIT_CLEAN
    }
}

/// Shows skip notices on stderr and logs every notice.
///
/// Stdout carries only diagnostics. Launch failures are reported by `main`
/// from the returned error.
#[derive(Debug, Default)]
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notice(&self, notice: &Notice) {
        TracingNotices.notice(notice);
        if matches!(
            notice,
            Notice::UnsavedBuffer | Notice::NonUtf8FileName { .. } | Notice::TooManyFiles { .. }
        ) {
            eprintln!("metalint: {notice}");
        }
    }
}
