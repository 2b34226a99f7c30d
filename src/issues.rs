//! Issue types for gettext analysis results.
//!
//! Each issue is self-contained with all information the reporter needs to
//! display it, in text or JSON form.

use enum_dispatch::enum_dispatch;

use crate::core::SourceContext;
use crate::utils::python_repr;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    NonGettextString,
    ParseError,
}

impl Rule {
    /// Message code shown next to the severity, e.g. `warning[W0001]`.
    pub fn code(self) -> &'static str {
        match self {
            Rule::NonGettextString => "W0001",
            Rule::ParseError => "E0001",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rule::NonGettextString => "There is a raw string that's not passed through gettext",
            Rule::ParseError => "A tree dump could not be read or lowered",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::NonGettextString => write!(f, "non-gettext-string"),
            Rule::ParseError => write!(f, "parse-error"),
        }
    }
}

// ============================================================
// Issue Types
// ============================================================

/// A target-script literal that is not passed through gettext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGettextIssue {
    pub context: SourceContext,
    /// The literal's text.
    pub text: String,
}

impl MissingGettextIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::NonGettextString
    }
}

/// Tree dump could not be read or lowered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorIssue {
    pub file_path: String,
    pub error: String,
}

impl ParseErrorIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::ParseError
    }
}

// ============================================================
// Issue Enum
// ============================================================

#[enum_dispatch(Report)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    MissingGettext(MissingGettextIssue),
    ParseError(ParseErrorIssue),
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::MissingGettext(_) => MissingGettextIssue::severity(),
            Issue::ParseError(_) => ParseErrorIssue::severity(),
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            Issue::MissingGettext(_) => MissingGettextIssue::rule(),
            Issue::ParseError(_) => ParseErrorIssue::rule(),
        }
    }
}

// ============================================================
// Report Trait (for CLI output)
// ============================================================

/// Location information for report output.
pub enum ReportLocation<'a> {
    /// Position inside a checked file.
    Source(&'a SourceContext),
    /// File-level only (for ParseError - no line context).
    File { path: &'a str },
}

/// Trait for types that can be reported to CLI.
///
/// Uses `enum_dispatch` for zero-cost dispatch on the `Issue` enum.
#[enum_dispatch]
pub trait Report {
    fn location(&self) -> ReportLocation<'_>;

    /// Primary message to display.
    fn message(&self) -> String;

    fn report_severity(&self) -> Severity;

    fn report_rule(&self) -> Rule;

    /// Optional hint for fixing the issue.
    fn hint(&self) -> Option<&str> {
        None
    }

    /// Optional details for the "= note:" line.
    fn details(&self) -> Option<String> {
        None
    }
}

// ============================================================
// Report Implementations
// ============================================================

impl Report for MissingGettextIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Source(&self.context)
    }

    fn message(&self) -> String {
        format!("non-gettext-ed string {}", python_repr(&self.text))
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn hint(&self) -> Option<&str> {
        Some("wrap the string in _() or another gettext function")
    }
}

impl Report for ParseErrorIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File {
            path: &self.file_path,
        }
    }

    fn message(&self) -> String {
        self.error.clone()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

// ============================================================
// Ordering for Issue (for sorting in reports)
// ============================================================

impl Issue {
    fn sort_file_path(&self) -> &str {
        match self.location() {
            ReportLocation::Source(ctx) => &ctx.location.file_path,
            ReportLocation::File { path } => path,
        }
    }

    fn sort_line(&self) -> usize {
        match self.location() {
            ReportLocation::Source(ctx) => ctx.location.line,
            ReportLocation::File { .. } => 0,
        }
    }

    fn sort_col(&self) -> usize {
        match self.location() {
            ReportLocation::Source(ctx) => ctx.location.col,
            ReportLocation::File { .. } => 0,
        }
    }
}

impl Ord for Issue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: file_path, line, col, message
        self.sort_file_path()
            .cmp(other.sort_file_path())
            .then_with(|| self.sort_line().cmp(&other.sort_line()))
            .then_with(|| self.sort_col().cmp(&other.sort_col()))
            .then_with(|| self.message().cmp(&other.message()))
    }
}

impl PartialOrd for Issue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
