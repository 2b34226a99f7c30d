//! String literal classification.
//!
//! A literal is checked in three stages:
//!
//! 1. the target-script gate: text outside the target script is out of scope;
//! 2. the content pre-filter ([`content_exemption`]);
//! 3. the ancestor scan: walk from the literal towards the root and stop at the
//!    first ancestor that is a localization call or satisfies a structural
//!    exemption rule.
//!
//! The node directly below the root is the last one examined; the root itself
//! never is. If no ancestor exempts the literal it is flagged.

use std::collections::HashSet;

use thiserror::Error;

use super::content::{ContentExemption, content_exemption};
use super::structural::{RuleContext, RuleId, matching_rule};
use crate::config::default_field_constructors;
use crate::core::{Node, NodeId, NodeKind, ScriptPattern, ScriptPredicate, SyntaxTree};

/// Callee names that mark their arguments for translation.
pub const GETTEXT_NAMES: [&str; 9] = [
    "_",
    "ugettext",
    "ugettext_lazy",
    "gettext",
    "gettext_lazy",
    "pgettext",
    "pgettext_lazy",
    "ngettext",
    "ngettext_lazy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exempt,
    Flagged,
}

impl Verdict {
    pub fn is_flagged(self) -> bool {
        matches!(self, Verdict::Flagged)
    }
}

/// The reason a literal was exempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    /// The text is not written in the target script.
    NotTargetScript,
    Content(ContentExemption),
    /// An enclosing call to one of [`GETTEXT_NAMES`].
    LocalizationCall {
        ancestor: NodeId,
        name: &'static str,
    },
    Structural {
        rule: RuleId,
        ancestor: NodeId,
    },
}

impl std::fmt::Display for Exemption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exemption::NotTargetScript => write!(f, "not in target script"),
            Exemption::Content(reason) => write!(f, "content: {}", reason),
            Exemption::LocalizationCall { ancestor, name } => {
                write!(f, "wrapped in {}() at {}", name, ancestor)
            }
            Exemption::Structural { rule, ancestor } => write!(f, "{} at {}", rule, ancestor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    /// Set for exempt literals.
    pub reason: Option<Exemption>,
}

impl Classification {
    fn exempt(reason: Exemption) -> Self {
        Self {
            verdict: Verdict::Exempt,
            reason: Some(reason),
        }
    }

    fn flagged() -> Self {
        Self {
            verdict: Verdict::Flagged,
            reason: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not a string literal")]
    NotAStringLiteral(NodeId),
}

/// Faults in the parent chain that abandon the scan.
#[derive(Debug, Error, PartialEq, Eq)]
enum ScanError {
    #[error("node {node} points at missing parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },
    #[error("parent chain from {0} does not reach a root")]
    Unterminated(NodeId),
}

/// Decides whether a string literal needs a gettext wrapper it does not have.
///
/// Holds only configuration; every call is independent, so one classifier can
/// be shared across threads and files.
pub struct Classifier {
    field_constructors: HashSet<String>,
    script: Box<dyn ScriptPredicate>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            default_field_constructors(),
            Box::new(ScriptPattern::cyrillic()),
        )
    }
}

impl Classifier {
    /// `field_constructors` names the calls whose first positional argument is
    /// a field label (Django's model field classes by default).
    pub fn new(
        field_constructors: impl IntoIterator<Item = String>,
        script: Box<dyn ScriptPredicate>,
    ) -> Self {
        Self {
            field_constructors: field_constructors.into_iter().collect(),
            script,
        }
    }

    pub fn field_constructors(&self) -> &HashSet<String> {
        &self.field_constructors
    }

    /// Verdict for `literal`. Nodes that are not string literals are exempt.
    pub fn classify(&self, tree: &SyntaxTree, literal: NodeId) -> Verdict {
        self.explain(tree, literal)
            .map(|classification| classification.verdict)
            .unwrap_or(Verdict::Exempt)
    }

    /// Verdict for `literal` together with the reason it was exempted.
    pub fn explain(
        &self,
        tree: &SyntaxTree,
        literal: NodeId,
    ) -> Result<Classification, ClassifyError> {
        let node = tree.get(literal).ok_or(ClassifyError::UnknownNode(literal))?;
        let text = node
            .as_str_literal()
            .ok_or(ClassifyError::NotAStringLiteral(literal))?;

        if !self.script.matches(text) {
            return Ok(Classification::exempt(Exemption::NotTargetScript));
        }
        if let Some(reason) = content_exemption(text) {
            return Ok(Classification::exempt(Exemption::Content(reason)));
        }

        match self.scan(tree, literal) {
            Ok(Some(reason)) => Ok(Classification::exempt(reason)),
            Ok(None) => Ok(Classification::flagged()),
            Err(err) => {
                tracing::warn!(literal = %literal, text, error = %err, "ancestor scan failed, reporting literal");
                Ok(Classification::flagged())
            }
        }
    }

    fn scan(&self, tree: &SyntaxTree, literal: NodeId) -> Result<Option<Exemption>, ScanError> {
        let ctx = RuleContext {
            tree,
            field_constructors: &self.field_constructors,
        };

        let mut current = literal;
        let mut node = tree
            .get(current)
            .ok_or(ScanError::Unterminated(literal))?;

        // A well-formed chain visits every node at most once.
        for _ in 0..tree.len() {
            let Some(parent) = node.parent else {
                return Ok(None);
            };

            if let Some(name) = localization_call(tree, node) {
                return Ok(Some(Exemption::LocalizationCall {
                    ancestor: current,
                    name,
                }));
            }
            if let Some(rule) = matching_rule(&ctx, &node.kind, literal) {
                return Ok(Some(Exemption::Structural {
                    rule,
                    ancestor: current,
                }));
            }

            node = tree.get(parent).ok_or(ScanError::DanglingParent {
                node: current,
                parent,
            })?;
            current = parent;
        }

        Err(ScanError::Unterminated(literal))
    }
}

/// Name of the gettext function when `node` is a call to one by bare name.
fn localization_call(tree: &SyntaxTree, node: &Node) -> Option<&'static str> {
    let NodeKind::Call { func, .. } = &node.kind else {
        return None;
    };
    let name = tree.get(*func)?.as_name()?;
    GETTEXT_NAMES.iter().find(|candidate| **candidate == name).copied()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::{CmpOp, DictItem, TreeBuilder};

    /// Wraps `expr` in `Expr` statement and a module and returns the tree.
    fn finish_stmt(mut b: TreeBuilder, expr: NodeId) -> SyntaxTree {
        let stmt = b.other("Expr", vec![expr]).unwrap();
        let module = b.module(vec![stmt]).unwrap();
        b.finish(module).unwrap()
    }

    fn classify(tree: &SyntaxTree, literal: NodeId) -> Verdict {
        Classifier::default().classify(tree, literal)
    }

    #[test]
    fn test_bare_statement_is_flagged() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("Заказ");
        let tree = finish_stmt(b, lit);
        assert_eq!(classify(&tree, lit), Verdict::Flagged);
    }

    #[test]
    fn test_every_gettext_name_exempts() {
        for name in GETTEXT_NAMES {
            let mut b = TreeBuilder::new();
            let func = b.name(name);
            let lit = b.str_lit("Заказ");
            let call = b.call(func, vec![lit], vec![]).unwrap();
            let tree = finish_stmt(b, call);
            let classification = Classifier::default().explain(&tree, lit).unwrap();
            assert_eq!(classification.verdict, Verdict::Exempt, "{name}");
            assert_eq!(
                classification.reason,
                Some(Exemption::LocalizationCall {
                    ancestor: call,
                    name
                })
            );
        }
    }

    #[test]
    fn test_attribute_gettext_is_not_a_wrapper() {
        // translation.gettext("...") does not count: only bare names do.
        let mut b = TreeBuilder::new();
        let module_name = b.name("translation");
        let func = b.attribute(module_name, "gettext").unwrap();
        let lit = b.str_lit("Заказ");
        let call = b.call(func, vec![lit], vec![]).unwrap();
        let tree = finish_stmt(b, call);
        assert_eq!(classify(&tree, lit), Verdict::Flagged);
    }

    #[test]
    fn test_nested_wrapper_further_up() {
        // _(prefix + "Заказ")
        let mut b = TreeBuilder::new();
        let func = b.name("_");
        let prefix = b.name("prefix");
        let lit = b.str_lit("Заказ");
        let binop = b.other("BinOp", vec![prefix, lit]).unwrap();
        let call = b.call(func, vec![binop], vec![]).unwrap();
        let tree = finish_stmt(b, call);
        assert_eq!(classify(&tree, lit), Verdict::Exempt);
    }

    #[test]
    fn test_content_prefilter_skips_scan() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("^[^а-я]+$");
        let tree = finish_stmt(b, lit);
        let classification = Classifier::default().explain(&tree, lit).unwrap();
        assert_eq!(
            classification.reason,
            Some(Exemption::Content(ContentExemption::AnchoredRegex))
        );
    }

    #[test]
    fn test_non_target_script_is_exempt() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("Order");
        let tree = finish_stmt(b, lit);
        let classification = Classifier::default().explain(&tree, lit).unwrap();
        assert_eq!(classification.reason, Some(Exemption::NotTargetScript));
    }

    #[test]
    fn test_custom_script_predicate() {
        let classifier = Classifier::new(Vec::new(), Box::new(|text: &str| text.contains('!')));
        let mut b = TreeBuilder::new();
        let loud = b.str_lit("Order!");
        let quiet = b.str_lit("Заказ");
        let list = b.other("List", vec![loud, quiet]).unwrap();
        let tree = finish_stmt(b, list);
        assert_eq!(classifier.classify(&tree, loud), Verdict::Flagged);
        assert_eq!(classifier.classify(&tree, quiet), Verdict::Exempt);
    }

    #[test]
    fn test_db_table_assignment() {
        let mut b = TreeBuilder::new();
        let target = b.name("db_table");
        let lit = b.str_lit("Заказ");
        let assign = b
            .push(
                NodeKind::Assign {
                    targets: vec![target],
                    value: lit,
                },
                None,
            )
            .unwrap();
        let class_body = b.other("ClassDef", vec![assign]).unwrap();
        let module = b.module(vec![class_body]).unwrap();
        let tree = b.finish(module).unwrap();
        assert_eq!(classify(&tree, lit), Verdict::Exempt);
    }

    #[test]
    fn test_dict_value_falls_through() {
        let mut b = TreeBuilder::new();
        let key = b.str_lit("ключ");
        let value = b.str_lit("значение");
        let dict = b
            .push(
                NodeKind::Dict {
                    items: vec![DictItem {
                        key: Some(key),
                        value,
                    }],
                },
                None,
            )
            .unwrap();
        let tree = finish_stmt(b, dict);
        assert_eq!(classify(&tree, key), Verdict::Exempt);
        assert_eq!(classify(&tree, value), Verdict::Flagged);
    }

    #[test]
    fn test_dict_value_inside_gettext_is_exempt() {
        let mut b = TreeBuilder::new();
        let key = b.name("k");
        let value = b.str_lit("значение");
        let dict = b
            .push(
                NodeKind::Dict {
                    items: vec![DictItem {
                        key: Some(key),
                        value,
                    }],
                },
                None,
            )
            .unwrap();
        let func = b.name("gettext_lazy");
        let call = b.call(func, vec![dict], vec![]).unwrap();
        let tree = finish_stmt(b, call);
        assert_eq!(classify(&tree, value), Verdict::Exempt);
    }

    #[test]
    fn test_field_constructor_with_keyword_default() {
        // CharField("Дата создания", default="")
        let mut b = TreeBuilder::new();
        let func = b.name("CharField");
        let label = b.str_lit("Дата создания");
        let empty = b.str_lit("");
        let kw = b.keyword(Some("default"), empty).unwrap();
        let call = b.call(func, vec![label], vec![kw]).unwrap();
        let tree = finish_stmt(b, call);
        assert_eq!(classify(&tree, label), Verdict::Exempt);
    }

    #[test]
    fn test_models_expressions_are_exempt() {
        for attr in ["Value", "F", "Q", "Index", "Manager", "Case", "When", "Prefetch"] {
            let mut b = TreeBuilder::new();
            let models = b.name("models");
            let func = b.attribute(models, attr).unwrap();
            let text = b.str_lit("Текст");
            let call = b.call(func, vec![text], vec![]).unwrap();
            let tree = finish_stmt(b, call);
            assert_eq!(classify(&tree, text), Verdict::Exempt, "models.{attr}");
        }
    }

    #[test]
    fn test_second_positional_of_field_constructor_is_flagged() {
        let mut b = TreeBuilder::new();
        let models = b.name("models");
        let func = b.attribute(models, "ForeignKey").unwrap();
        let to = b.name("Order");
        let label = b.str_lit("Заказ");
        let call = b.call(func, vec![to, label], vec![]).unwrap();
        let tree = finish_stmt(b, call);
        assert_eq!(classify(&tree, label), Verdict::Flagged);
    }

    #[test]
    fn test_compare_rules() {
        let mut b = TreeBuilder::new();
        let status = b.name("status");
        let lit = b.str_lit("Новый");
        let cmp = b
            .push(
                NodeKind::Compare {
                    left: status,
                    ops: vec![(CmpOp::Eq, lit)],
                },
                None,
            )
            .unwrap();
        let tree = finish_stmt(b, cmp);
        assert_eq!(classify(&tree, lit), Verdict::Exempt);
    }

    #[test]
    fn test_literal_directly_under_root_is_flagged() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("Заказ");
        let module = b.module(vec![lit]).unwrap();
        let tree = b.finish(module).unwrap();
        assert_eq!(classify(&tree, lit), Verdict::Flagged);
    }

    #[test]
    fn test_root_literal_is_flagged() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("Заказ");
        let tree = b.finish(lit).unwrap();
        assert_eq!(classify(&tree, lit), Verdict::Flagged);
    }

    #[test]
    fn test_non_literal_node() {
        let mut b = TreeBuilder::new();
        let name = b.name("x");
        let tree = b.finish(name).unwrap();
        let classifier = Classifier::default();
        assert_eq!(
            classifier.explain(&tree, name),
            Err(ClassifyError::NotAStringLiteral(name))
        );
        assert_eq!(classifier.classify(&tree, name), Verdict::Exempt);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let mut b = TreeBuilder::new();
        let lit = b.str_lit("Заказ");
        let tree = finish_stmt(b, lit);
        let classifier = Classifier::default();
        assert_eq!(
            classifier.explain(&tree, lit),
            classifier.explain(&tree, lit)
        );
    }
}
