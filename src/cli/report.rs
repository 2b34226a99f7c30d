//! Report formatting and printing utilities.
//!
//! Issues are displayed either in cargo-style text or as a JSON document.
//! Separate from core logic to allow the checker to be used as a library.

use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use super::{
    args::OutputFormat,
    commands::{CommandResult, CommandSummary, InitSummary},
};
use crate::config::CONFIG_FILE_NAME;
use crate::issues::{Issue, Report, ReportLocation, Severity};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print issues in cargo-style format to stdout.
pub fn report(issues: &[Issue]) {
    report_to(issues, &mut io::stdout().lock());
}

/// Print issues to a custom writer. Expects `issues` to be sorted.
pub fn report_to<W: Write>(issues: &[Issue], writer: &mut W) {
    if issues.is_empty() {
        return;
    }

    let max_line_width = calculate_max_line_width(issues);

    for issue in issues {
        print_issue(issue, writer, max_line_width);
    }

    print_summary(issues, writer);
}

/// Print a success message when no issues are found.
pub fn print_success(files: usize) {
    print_success_to(files, &mut io::stdout().lock());
}

pub fn print_success_to<W: Write>(files: usize, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Checked {} {} - no issues found",
            files,
            if files == 1 { "file" } else { "files" }
        )
        .green()
    );
}

/// Print a warning about dumps that could not be loaded.
pub fn print_parse_warning(count: usize, verbose: bool) {
    print_parse_warning_to(count, verbose, &mut io::stderr().lock());
}

pub fn print_parse_warning_to<W: Write>(count: usize, verbose: bool, writer: &mut W) {
    if count > 0 && !verbose {
        let _ = writeln!(
            writer,
            "{} {} file(s) could not be parsed (use {} for details)",
            "warning:".bold().yellow(),
            count,
            "-v".cyan()
        );
    }
}

// ============================================================
// JSON output
// ============================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub issues: Vec<JsonIssue>,
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonIssue {
    pub severity: String,
    pub code: &'static str,
    pub rule: String,
    pub message: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    /// Raw literal text, for missing gettext issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl From<&Issue> for JsonIssue {
    fn from(issue: &Issue) -> Self {
        let rule = issue.report_rule();
        let (file, line, col) = match issue.location() {
            ReportLocation::Source(ctx) => {
                (ctx.file_path().to_string(), Some(ctx.line()), Some(ctx.col()))
            }
            ReportLocation::File { path } => (path.to_string(), None, None),
        };
        let text = match issue {
            Issue::MissingGettext(i) => Some(i.text.clone()),
            Issue::ParseError(_) => None,
        };
        Self {
            severity: issue.report_severity().to_string(),
            code: rule.code(),
            rule: rule.to_string(),
            message: issue.message(),
            file,
            line,
            col,
            text,
        }
    }
}

pub fn json_report(result: &CommandResult) -> JsonReport {
    JsonReport {
        issues: result.issues.iter().map(JsonIssue::from).collect(),
        summary: JsonSummary {
            files_checked: result.files_checked,
            errors: result.error_count,
            warnings: result.warning_count,
        },
    }
}

pub fn report_json_to<W: Write>(result: &CommandResult, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &json_report(result))?;
    writeln!(writer)
}

// ============================================================
// Internal Functions
// ============================================================

fn print_issue<W: Write>(issue: &Issue, writer: &mut W, max_line_width: usize) {
    let loc = issue.location();
    let (file_path, line, col, source_line) = extract_location_info(&loc);

    let severity = issue.report_severity();
    let rule = issue.report_rule();
    let severity_str = match severity {
        Severity::Error => format!("error[{}]", rule.code()).bold().red(),
        Severity::Warning => format!("warning[{}]", rule.code()).bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: {}  {}",
        severity_str,
        issue.message(),
        rule.to_string().dimmed().cyan()
    );

    // Clickable location: --> path:line:col
    if line > 0 {
        let _ = writeln!(writer, "  {} {}:{}:{}", "-->".blue(), file_path, line, col);
    } else {
        let _ = writeln!(writer, "  {} {}", "-->".blue(), file_path);
    }

    if let Some(source_line) = source_line {
        let caret_char = match severity {
            Severity::Error => "^".red(),
            Severity::Warning => "^".yellow(),
        };

        let _ = writeln!(
            writer,
            "{:>width$} {}",
            "",
            "|".blue(),
            width = max_line_width
        );
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            line.to_string().blue(),
            "|".blue(),
            source_line,
            width = max_line_width
        );

        // Caret pointing to the column (col is 1-based)
        let prefix = if col > 1 {
            source_line.chars().take(col - 1).collect::<String>()
        } else {
            String::new()
        };
        let caret_padding = UnicodeWidthStr::width(prefix.as_str());
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret_char,
            width = max_line_width,
            padding = caret_padding
        );
    }

    if let Some(details) = issue.details() {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "note:".bold(),
            details,
            width = max_line_width
        );
    }

    if let Some(hint) = issue.hint() {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "hint:".bold().cyan(),
            hint,
            width = max_line_width
        );
    }

    let _ = writeln!(writer);
}

fn print_summary<W: Write>(issues: &[Issue], writer: &mut W) {
    let total_errors = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Error)
        .count();
    let total_warnings = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Warning)
        .count();
    let total_problems = total_errors + total_warnings;

    if total_problems > 0 {
        let _ = writeln!(
            writer,
            "{} {} problems ({} {}, {} {})",
            FAILURE_MARK.red(),
            total_problems,
            total_errors,
            if total_errors == 1 { "error" } else { "errors" }.red(),
            total_warnings,
            if total_warnings == 1 {
                "warning"
            } else {
                "warnings"
            }
            .yellow()
        );
    }
}

fn extract_location_info<'a>(
    loc: &'a ReportLocation<'a>,
) -> (&'a str, usize, usize, Option<&'a str>) {
    match loc {
        ReportLocation::Source(ctx) => (
            ctx.file_path(),
            ctx.line(),
            ctx.col(),
            ctx.source_line.as_deref(),
        ),
        ReportLocation::File { path } => (path, 0, 0, None),
    }
}

fn calculate_max_line_width(issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter_map(|i| match i.location() {
            ReportLocation::Source(ctx) => Some(ctx.line()),
            ReportLocation::File { .. } => None,
        })
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1)
}

pub fn print(result: &CommandResult, verbose: bool) {
    match &result.summary {
        CommandSummary::Check => match result.format {
            OutputFormat::Text => {
                report(&result.issues);
                if result.issues.is_empty() {
                    print_success(result.files_checked);
                }
                print_parse_warning(result.parse_error_count, verbose);
            }
            OutputFormat::Json => {
                if let Err(e) = report_json_to(result, &mut io::stdout().lock()) {
                    tracing::error!(error = %e, "failed to write JSON report");
                }
            }
        },
        CommandSummary::Init(summary) => print_init(summary),
    }
}

fn print_init(summary: &InitSummary) {
    if summary.created {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    }
    if let Some(error) = &summary.error {
        eprintln!("Error: {}", error);
    }
}

// ============================================================
// Tests
// ============================================================
