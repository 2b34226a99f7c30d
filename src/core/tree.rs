//! Arena-backed syntax tree.
//!
//! Nodes live in a single `Vec` owned by [`SyntaxTree`] and refer to each
//! other through [`NodeId`] indices. Each node stores a non-owning link to its
//! parent; children are owned ids inside the node kind. The tree is read-only
//! once built, so any number of literals can be classified against it from
//! different threads.

use thiserror::Error;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a node in the original source (1-based line, 0-based column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// Value of a constant node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Str(String),
    Bytes,
    Number(String),
    Bool(bool),
    None,
}

/// A `key: value` pair of a dictionary display. `key` is `None` for `**spread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictItem {
    pub key: Option<NodeId>,
    pub value: NodeId,
}

/// Comparison operator of a [`NodeKind::Compare`] link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    /// Parses the operator name used by Python's `ast` module (`"Eq"`, `"NotIn"`, ...).
    pub fn from_ast_name(name: &str) -> Option<Self> {
        Some(match name {
            "Eq" => CmpOp::Eq,
            "NotEq" => CmpOp::NotEq,
            "Lt" => CmpOp::Lt,
            "LtE" => CmpOp::LtE,
            "Gt" => CmpOp::Gt,
            "GtE" => CmpOp::GtE,
            "Is" => CmpOp::Is,
            "IsNot" => CmpOp::IsNot,
            "In" => CmpOp::In,
            "NotIn" => CmpOp::NotIn,
            _ => return None,
        })
    }
}

/// Syntactic kind of a node together with its kind-specific fields.
///
/// Only the kinds the exemption rules look at get their own variant; everything
/// else is [`NodeKind::Other`] and keeps just its name and children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Module {
        body: Vec<NodeId>,
    },
    Const(ConstValue),
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
    },
    Assign {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    Dict {
        items: Vec<DictItem>,
    },
    Subscript {
        value: NodeId,
        index: NodeId,
    },
    Delete {
        targets: Vec<NodeId>,
    },
    Keyword {
        arg: Option<String>,
        value: NodeId,
    },
    Compare {
        left: NodeId,
        ops: Vec<(CmpOp, NodeId)>,
    },
    Attribute {
        value: NodeId,
        attr: String,
    },
    Name {
        id: String,
    },
    Other {
        kind: String,
        children: Vec<NodeId>,
    },
}

/// Field-less discriminant of [`NodeKind`], used to key exemption rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Module,
    Const,
    Call,
    Assign,
    Dict,
    Subscript,
    Delete,
    Keyword,
    Compare,
    Attribute,
    Name,
    Other,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Module { .. } => NodeTag::Module,
            NodeKind::Const(_) => NodeTag::Const,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::Dict { .. } => NodeTag::Dict,
            NodeKind::Subscript { .. } => NodeTag::Subscript,
            NodeKind::Delete { .. } => NodeTag::Delete,
            NodeKind::Keyword { .. } => NodeTag::Keyword,
            NodeKind::Compare { .. } => NodeTag::Compare,
            NodeKind::Attribute { .. } => NodeTag::Attribute,
            NodeKind::Name { .. } => NodeTag::Name,
            NodeKind::Other { .. } => NodeTag::Other,
        }
    }

    /// Child ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Module { body } => body.clone(),
            NodeKind::Const(_) | NodeKind::Name { .. } => Vec::new(),
            NodeKind::Call {
                func,
                args,
                keywords,
            } => std::iter::once(*func)
                .chain(args.iter().copied())
                .chain(keywords.iter().copied())
                .collect(),
            NodeKind::Assign { targets, value } => targets
                .iter()
                .copied()
                .chain(std::iter::once(*value))
                .collect(),
            NodeKind::Dict { items } => items
                .iter()
                .flat_map(|item| item.key.into_iter().chain(std::iter::once(item.value)))
                .collect(),
            NodeKind::Subscript { value, index } => vec![*value, *index],
            NodeKind::Delete { targets } => targets.clone(),
            NodeKind::Keyword { value, .. } => vec![*value],
            NodeKind::Compare { left, ops } => std::iter::once(*left)
                .chain(ops.iter().map(|(_, operand)| *operand))
                .collect(),
            NodeKind::Attribute { value, .. } => vec![*value],
            NodeKind::Other { children, .. } => children.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub span: Option<Span>,
}

impl Node {
    /// Text of a string constant, `None` for any other node.
    pub fn as_str_literal(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Const(ConstValue::Str(text)) => Some(text),
            _ => None,
        }
    }

    /// Identifier of a bare name reference.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Name { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),
}

/// Immutable syntax tree produced by [`TreeBuilder::finish`].
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|node| node.kind.children())
            .unwrap_or_default()
    }

    /// Iterates from `id` (inclusive) up to the root (inclusive).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// Ids of every string constant, in document (pre-order) order.
    pub fn string_literals(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if node.as_str_literal().is_some() {
                out.push(id);
            }
            let mut children = node.kind.children();
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Builds a [`SyntaxTree`] bottom-up.
///
/// Composite nodes take ownership of their children: creating a node sets the
/// parent link of every child, and a child can only be attached once.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node whose children (as listed by its kind) get it as parent.
    pub fn push(&mut self, kind: NodeKind, span: Option<Span>) -> Result<NodeId, TreeError> {
        let id = NodeId(self.nodes.len() as u32);
        let children = kind.children();
        for child in &children {
            let node = self
                .nodes
                .get(child.index())
                .ok_or(TreeError::UnknownNode(*child))?;
            if node.parent.is_some() {
                return Err(TreeError::AlreadyAttached(*child));
            }
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = children.iter().find(|child| !seen.insert(**child)) {
            return Err(TreeError::AlreadyAttached(*dup));
        }
        for child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            parent: None,
            span,
        });
        Ok(id)
    }

    pub fn str_lit(&mut self, text: impl Into<String>) -> NodeId {
        self.leaf(NodeKind::Const(ConstValue::Str(text.into())))
    }

    pub fn name(&mut self, id: impl Into<String>) -> NodeId {
        self.leaf(NodeKind::Name { id: id.into() })
    }

    fn leaf(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            span: None,
        });
        id
    }

    pub fn attribute(&mut self, value: NodeId, attr: impl Into<String>) -> Result<NodeId, TreeError> {
        self.push(
            NodeKind::Attribute {
                value,
                attr: attr.into(),
            },
            None,
        )
    }

    pub fn call(
        &mut self,
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
    ) -> Result<NodeId, TreeError> {
        self.push(
            NodeKind::Call {
                func,
                args,
                keywords,
            },
            None,
        )
    }

    pub fn keyword(&mut self, arg: Option<&str>, value: NodeId) -> Result<NodeId, TreeError> {
        self.push(
            NodeKind::Keyword {
                arg: arg.map(str::to_owned),
                value,
            },
            None,
        )
    }

    pub fn other(&mut self, kind: impl Into<String>, children: Vec<NodeId>) -> Result<NodeId, TreeError> {
        self.push(
            NodeKind::Other {
                kind: kind.into(),
                children,
            },
            None,
        )
    }

    pub fn module(&mut self, body: Vec<NodeId>) -> Result<NodeId, TreeError> {
        self.push(NodeKind::Module { body }, None)
    }

    /// Freezes the arena with `root` as the tree root.
    pub fn finish(self, root: NodeId) -> Result<SyntaxTree, TreeError> {
        let node = self
            .nodes
            .get(root.index())
            .ok_or(TreeError::UnknownNode(root))?;
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(root));
        }
        Ok(SyntaxTree {
            nodes: self.nodes,
            root,
        })
    }
}
