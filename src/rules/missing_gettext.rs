//! Non-gettext-ed string detection.
//!
//! Walks every string literal of a tree, asks the [`Classifier`] for a verdict
//! and turns flagged literals into [`MissingGettextIssue`]s.

use std::collections::HashSet;

use rayon::prelude::*;

use super::classify::{Classifier, Verdict};
use crate::{
    core::{NodeId, SourceContext, SourceLocation, Span, SyntaxTree, TreeDocument},
    issues::MissingGettextIssue,
};

/// A literal the classifier flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedLiteral {
    pub node: NodeId,
    pub text: String,
    /// Own span, or the nearest ancestor's when the literal has none.
    pub span: Option<Span>,
}

/// Classifies every string literal of `tree` and returns the flagged ones in
/// document order.
pub fn check_tree(tree: &SyntaxTree, classifier: &Classifier) -> Vec<FlaggedLiteral> {
    tree.string_literals()
        .par_iter()
        .filter_map(|&literal| {
            let classification = match classifier.explain(tree, literal) {
                Ok(classification) => classification,
                Err(err) => {
                    tracing::debug!(literal = %literal, error = %err, "skipping node");
                    return None;
                }
            };
            if let Some(reason) = classification.reason {
                tracing::debug!(literal = %literal, %reason, "exempt");
            }
            if classification.verdict != Verdict::Flagged {
                return None;
            }
            let text = tree.get(literal)?.as_str_literal()?.to_string();
            Some(FlaggedLiteral {
                node: literal,
                text,
                span: nearest_span(tree, literal),
            })
        })
        .collect()
}

/// Checks one lowered dump and reports its flagged literals.
///
/// Texts listed in `ignore_texts` are dropped after classification, compared
/// against the trimmed literal.
pub fn check_document(
    doc: &TreeDocument,
    file_path: &str,
    classifier: &Classifier,
    ignore_texts: &HashSet<String>,
) -> Vec<MissingGettextIssue> {
    check_tree(&doc.tree, classifier)
        .into_iter()
        .filter(|flagged| !ignore_texts.contains(flagged.text.trim()))
        .map(|flagged| {
            let span = flagged.span.unwrap_or_default();
            let source_line = doc.source_line(span.line).map(str::to_string);
            let col = char_column(source_line.as_deref(), span.col);
            MissingGettextIssue {
                context: SourceContext::new(
                    SourceLocation::new(file_path, span.line, col),
                    source_line,
                ),
                text: flagged.text,
            }
        })
        .collect()
}

fn nearest_span(tree: &SyntaxTree, id: NodeId) -> Option<Span> {
    tree.ancestors(id)
        .find_map(|ancestor| tree.get(ancestor).and_then(|node| node.span))
}

/// 1-based character column for a 0-based UTF-8 byte offset into `line`.
///
/// Without the line the offset is taken as a character count.
fn char_column(line: Option<&str>, byte_offset: usize) -> usize {
    let Some(line) = line else {
        return byte_offset + 1;
    };
    let mut chars = 0;
    for (idx, _) in line.char_indices() {
        if idx >= byte_offset {
            break;
        }
        chars += 1;
    }
    chars + 1
}
