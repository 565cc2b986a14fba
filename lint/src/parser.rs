//! Aggregator output parser.
//!
//! One issue per line: `<file>:<line>:<col?>:<severity>:<message>`. Everything
//! else the aggregator prints (summaries, echoed tool invocations, panics from
//! a sub-linter) is dropped line by line without affecting the rest.

use std::sync::LazyLock;

use regex::Regex;

use metalint_types::{Diagnostic, Severity};

static LINE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>(?:[A-Za-z]:[\\/])?[^:]+):(?P<line>[^:]*):(?P<col>[^:]*):(?P<severity>[^:]*):\s*(?P<message>.*)$",
    )
    .expect("valid aggregator line regex")
});

/// Why a line produced no diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSkip {
    /// Empty or whitespace-only.
    Blank,
    /// Not enough colon-separated fields to be an issue line.
    ShapeMismatch,
    /// The line or column field is not a non-negative integer that fits.
    MalformedNumber,
}

/// Parse a single output line.
pub fn parse_line(line: &str) -> Result<Diagnostic, LineSkip> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Err(LineSkip::Blank);
    }
    let caps = LINE_SHAPE.captures(line).ok_or(LineSkip::ShapeMismatch)?;

    let line_no = parse_number(&caps["line"])?;
    let column = match &caps["col"] {
        "" => None,
        raw => Some(parse_number(raw)?),
    };

    Ok(Diagnostic::new(
        &caps["file"],
        line_no,
        column,
        Severity::from_token(caps["severity"].trim()),
        &caps["message"],
    ))
}

fn parse_number(raw: &str) -> Result<u32, LineSkip> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineSkip::MalformedNumber);
    }
    raw.parse().map_err(|_| LineSkip::MalformedNumber)
}

/// Lazily parse aggregator output, preserving input order.
pub fn parse(raw: &str) -> impl Iterator<Item = Diagnostic> + '_ {
    raw.lines().filter_map(|line| match parse_line(line) {
        Ok(diag) => Some(diag),
        Err(skip) => {
            if skip != LineSkip::Blank {
                tracing::trace!(?skip, line, "Dropping aggregator line");
            }
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parses_line_with_column() {
        let diag = parse_line("a.go:3:2:error:unused variable x").unwrap();
        assert_eq!(diag.file(), Path::new("a.go"));
        assert_eq!(diag.line(), 3);
        assert_eq!(diag.column(), Some(2));
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.message(), "unused variable x");
    }

    #[test]
    fn parses_line_without_column() {
        let diag = parse_line("pkg/b.go:12::warning:exported function Foo should have comment")
            .unwrap();
        assert_eq!(diag.file(), Path::new("pkg/b.go"));
        assert_eq!(diag.line(), 12);
        assert_eq!(diag.column(), None);
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(diag.message(), "exported function Foo should have comment");
    }

    #[test]
    fn message_keeps_embedded_colons_and_trims_leading_space() {
        let diag = parse_line("a.go:1:1:warning: error return value not checked: (f.Close) (errcheck)")
            .unwrap();
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(
            diag.message(),
            "error return value not checked: (f.Close) (errcheck)"
        );
    }

    #[test]
    fn unknown_severity_defaults_to_error() {
        let diag = parse_line("a.go:7:4:fatal:could not import fmt").unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        let diag = parse_line("a.go:7:4::no token").unwrap();
        assert_eq!(diag.severity(), Severity::Error);
    }

    #[test]
    fn accepts_windows_drive_prefix() {
        let diag = parse_line(r"C:\src\p\a.go:9:1:error:undefined: y").unwrap();
        assert_eq!(diag.file(), Path::new(r"C:\src\p\a.go"));
        assert_eq!(diag.line(), 9);
        assert_eq!(diag.message(), "undefined: y");
    }

    #[test]
    fn single_letter_file_is_not_a_drive() {
        let diag = parse_line("x:3:2:error:undefined: y").unwrap();
        assert_eq!(diag.file(), Path::new("x"));
        assert_eq!(diag.line(), 3);
        assert_eq!(diag.column(), Some(2));
        assert_eq!(diag.message(), "undefined: y");

        let diag = parse_line("C:/src/a.go:4::warning:w").unwrap();
        assert_eq!(diag.file(), Path::new("C:/src/a.go"));
        assert_eq!(diag.line(), 4);
    }

    #[test]
    fn strips_carriage_return() {
        let diag = parse_line("a.go:3:2:error:msg\r").unwrap();
        assert_eq!(diag.message(), "msg");
    }

    #[test]
    fn skip_reasons() {
        assert_eq!(parse_line(""), Err(LineSkip::Blank));
        assert_eq!(parse_line("   "), Err(LineSkip::Blank));
        assert_eq!(parse_line("OK: 3 linters passed"), Err(LineSkip::ShapeMismatch));
        assert_eq!(parse_line("a.go:3:2 error msg"), Err(LineSkip::ShapeMismatch));
        assert_eq!(parse_line("a.go:x:2:error:msg"), Err(LineSkip::MalformedNumber));
        assert_eq!(parse_line("a.go:3:y:error:msg"), Err(LineSkip::MalformedNumber));
        assert_eq!(parse_line("a.go::2:error:msg"), Err(LineSkip::MalformedNumber));
        assert_eq!(parse_line("a.go:-3:2:error:msg"), Err(LineSkip::MalformedNumber));
        assert_eq!(
            parse_line("a.go:99999999999:2:error:msg"),
            Err(LineSkip::MalformedNumber)
        );
    }

    #[test]
    fn mixed_batch_keeps_only_issue_lines_in_order() {
        let raw = "\
gometalinter: running linters
a.go:3:2:error:unused variable x
WARNING: deadline exceeded by linter gotype
b.go:10::warning:exported func B should have comment
a.go:bad:1:error:not a number

c.go:1:1:warning:last one
";
        let diags: Vec<Diagnostic> = parse(raw).collect();
        assert_eq!(diags.len(), 3);
        assert_eq!(diags[0].file(), Path::new("a.go"));
        assert_eq!(diags[1].file(), Path::new("b.go"));
        assert_eq!(diags[2].file(), Path::new("c.go"));
        assert_eq!(diags[2].message(), "last one");
    }

    #[test]
    fn duplicates_are_preserved() {
        let raw = "a.go:1:1:error:dup\na.go:1:1:error:dup\n";
        assert_eq!(parse(raw).count(), 2);
    }
}
