//! Structural exemption rules.
//!
//! Each rule is keyed by the kind of ancestor it inspects and looks at how the
//! classified literal sits inside that ancestor. A test returns `None` when the
//! ancestor lacks a field the rule needs (a call whose callee is not an
//! attribute, an assignment target without a plain name, ...), which counts
//! as "no match here".

use std::collections::HashSet;

use crate::core::{NodeId, NodeKind, NodeTag, SyntaxTree};

/// Assignment targets whose value is model metadata, not UI text.
pub const MODEL_META_NAMES: &[&str] = &["db_table", "verbose_name", "verbose_name_plural"];

/// Keyword arguments that Django already runs through its own translation.
pub const FIELD_KEYWORDS: &[&str] = &["verbose_name", "help_text"];

/// Mapping and queryset methods whose string arguments are lookups, not text.
pub const QUERY_METHODS: &[&str] = &[
    "has_key",
    "pop",
    "order_by",
    "strftime",
    "strptime",
    "get",
    "select_related",
    "values",
    "filter",
    "values_list",
];

/// Receivers of logging calls.
pub const LOGGER_NAMES: &[&str] = &["logging", "logger", "console_logger"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    DictKey,
    SubscriptIndex,
    ModelMetaAssign,
    DeletedValue,
    FieldKeyword,
    CompareRight,
    CompareLeft,
    QueryMethod,
    LoggingCall,
    FieldConstructor,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleId::DictKey => "dict-key",
            RuleId::SubscriptIndex => "subscript-index",
            RuleId::ModelMetaAssign => "model-meta-assign",
            RuleId::DeletedValue => "deleted-value",
            RuleId::FieldKeyword => "field-keyword",
            RuleId::CompareRight => "compare-right",
            RuleId::CompareLeft => "compare-left",
            RuleId::QueryMethod => "query-method",
            RuleId::LoggingCall => "logging-call",
            RuleId::FieldConstructor => "field-constructor",
        };
        write!(f, "{}", name)
    }
}

/// Read-only inputs shared by all rules during one scan.
pub struct RuleContext<'a> {
    pub tree: &'a SyntaxTree,
    pub field_constructors: &'a HashSet<String>,
}

type RuleTest = fn(&RuleContext<'_>, &NodeKind, NodeId) -> Option<bool>;

pub struct ExemptionRule {
    pub id: RuleId,
    pub applies_to: NodeTag,
    test: RuleTest,
}

impl ExemptionRule {
    /// Runs the rule against `ancestor` for `literal`. A missing field is a miss.
    pub fn matches(&self, ctx: &RuleContext<'_>, ancestor: &NodeKind, literal: NodeId) -> bool {
        ancestor.tag() == self.applies_to && (self.test)(ctx, ancestor, literal).unwrap_or(false)
    }
}

pub static RULES: &[ExemptionRule] = &[
    ExemptionRule {
        id: RuleId::DictKey,
        applies_to: NodeTag::Dict,
        test: dict_key,
    },
    ExemptionRule {
        id: RuleId::SubscriptIndex,
        applies_to: NodeTag::Subscript,
        test: subscript_index,
    },
    ExemptionRule {
        id: RuleId::ModelMetaAssign,
        applies_to: NodeTag::Assign,
        test: model_meta_assign,
    },
    ExemptionRule {
        id: RuleId::DeletedValue,
        applies_to: NodeTag::Delete,
        test: deleted_value,
    },
    ExemptionRule {
        id: RuleId::FieldKeyword,
        applies_to: NodeTag::Keyword,
        test: field_keyword,
    },
    ExemptionRule {
        id: RuleId::CompareRight,
        applies_to: NodeTag::Compare,
        test: compare_right,
    },
    ExemptionRule {
        id: RuleId::CompareLeft,
        applies_to: NodeTag::Compare,
        test: compare_left,
    },
    ExemptionRule {
        id: RuleId::QueryMethod,
        applies_to: NodeTag::Call,
        test: query_method,
    },
    ExemptionRule {
        id: RuleId::LoggingCall,
        applies_to: NodeTag::Call,
        test: logging_call,
    },
    ExemptionRule {
        id: RuleId::FieldConstructor,
        applies_to: NodeTag::Call,
        test: field_constructor,
    },
];

/// First rule that exempts `literal` because of `ancestor`.
pub fn matching_rule(
    ctx: &RuleContext<'_>,
    ancestor: &NodeKind,
    literal: NodeId,
) -> Option<RuleId> {
    RULES
        .iter()
        .find(|rule| rule.matches(ctx, ancestor, literal))
        .map(|rule| rule.id)
}

// {'shouldignore': 1}
fn dict_key(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Dict { items } = node else {
        return None;
    };
    Some(items.iter().any(|item| item.key == Some(literal)))
}

// d['shouldignore']
fn subscript_index(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Subscript { index, .. } = node else {
        return None;
    };
    Some(*index == literal)
}

// class Meta:
//     db_table = 'Заказ'
fn model_meta_assign(ctx: &RuleContext<'_>, node: &NodeKind, _: NodeId) -> Option<bool> {
    let NodeKind::Assign { targets, .. } = node else {
        return None;
    };
    let [target] = targets.as_slice() else {
        return Some(false);
    };
    let name = ctx.tree.get(*target)?.as_name()?;
    Some(MODEL_META_NAMES.contains(&name))
}

fn deleted_value(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Delete { targets } = node else {
        return None;
    };
    Some(targets.contains(&literal))
}

// CharField(verbose_name='...', help_text='...')
fn field_keyword(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Keyword { arg, value } = node else {
        return None;
    };
    let arg = arg.as_deref()?;
    Some(FIELD_KEYWORDS.contains(&arg) && *value == literal)
}

// something() == 'string'
fn compare_right(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Compare { ops, .. } = node else {
        return None;
    };
    let (_, first) = ops.first()?;
    Some(*first == literal)
}

// 'string' == something()
fn compare_left(_: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Compare { left, .. } = node else {
        return None;
    };
    Some(*left == literal)
}

/// Attribute name of the callee when it is `<expr>.<attr>`.
fn callee_attr<'a>(ctx: &RuleContext<'a>, node: &NodeKind) -> Option<(NodeId, &'a str)> {
    let NodeKind::Call { func, .. } = node else {
        return None;
    };
    match &ctx.tree.get(*func)?.kind {
        NodeKind::Attribute { value, attr } => Some((*value, attr.as_str())),
        _ => None,
    }
}

// queryset.order_by('shouldignore')
fn query_method(ctx: &RuleContext<'_>, node: &NodeKind, _: NodeId) -> Option<bool> {
    let (_, attr) = callee_attr(ctx, node)?;
    Some(QUERY_METHODS.contains(&attr))
}

// logger.info('shouldignore')
fn logging_call(ctx: &RuleContext<'_>, node: &NodeKind, _: NodeId) -> Option<bool> {
    let (receiver, _) = callee_attr(ctx, node)?;
    let name = ctx.tree.get(receiver)?.as_name()?;
    Some(LOGGER_NAMES.contains(&name))
}

// models.CharField('Дата создания', default='')
fn field_constructor(ctx: &RuleContext<'_>, node: &NodeKind, literal: NodeId) -> Option<bool> {
    let NodeKind::Call { func, args, .. } = node else {
        return None;
    };
    // `CharField(...)` imported directly is accepted as well as `models.CharField(...)`.
    let callee = match &ctx.tree.get(*func)?.kind {
        NodeKind::Attribute { attr, .. } => attr.as_str(),
        NodeKind::Name { id } => id.as_str(),
        _ => return None,
    };
    if !ctx.field_constructors.contains(callee) {
        return Some(false);
    }
    Some(args.first() == Some(&literal))
}
