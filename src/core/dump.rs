//! Lowering of host tree dumps into a [`SyntaxTree`].
//!
//! The host serialises its parsed module as JSON, one object per node with a
//! `"type"` discriminator and the field names of Python's `ast` module:
//!
//! ```json
//! { "path": "shop/models.py",
//!   "source": "x = _('Заказ')\n",
//!   "tree": { "type": "Module", "body": [ ... ] } }
//! ```
//!
//! A bare node object is accepted as well. Node types this crate has no use for
//! become [`NodeKind::Other`]; their nested nodes are still lowered so every
//! string literal in the file ends up in the tree.

use serde_json::{Map, Value};
use thiserror::Error;

use super::tree::{
    CmpOp, ConstValue, DictItem, NodeId, NodeKind, Span, SyntaxTree, TreeBuilder, TreeError,
};

/// A lowered tree together with the metadata the host attached to it.
#[derive(Debug, Clone)]
pub struct TreeDocument {
    pub path: Option<String>,
    pub source: Option<String>,
    pub tree: SyntaxTree,
}

impl TreeDocument {
    /// Source line `line` (1-based), when the dump carried the source text.
    pub fn source_line(&self, line: usize) -> Option<&str> {
        let source = self.source.as_deref()?;
        source.lines().nth(line.checked_sub(1)?)
    }
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a node object with a \"type\" field")]
    NotANode,
    #[error("`path` and `source` must be strings")]
    BadMetadata,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Keys that never hold child nodes.
const LOCATION_KEYS: &[&str] = &[
    "type",
    "lineno",
    "col_offset",
    "end_lineno",
    "end_col_offset",
];

pub fn parse_document(content: &str) -> Result<TreeDocument, DumpError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Object(mut object) = value else {
        return Err(DumpError::NotANode);
    };

    let (path, source, root) = if let Some(tree) = object.remove("tree") {
        let path = optional_string(object.get("path"))?;
        let source = optional_string(object.get("source"))?;
        (path, source, tree)
    } else {
        (None, None, Value::Object(object))
    };

    let tree = lower_tree(&root)?;
    Ok(TreeDocument { path, source, tree })
}

/// Lowers a single node object (and everything below it) into a tree.
pub fn lower_tree(root: &Value) -> Result<SyntaxTree, DumpError> {
    let mut lowering = Lowering {
        builder: TreeBuilder::new(),
    };
    let root = lowering.lower(root)?;
    Ok(lowering.builder.finish(root)?)
}

fn optional_string(value: Option<&Value>) -> Result<Option<String>, DumpError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DumpError::BadMetadata),
    }
}

fn as_node(value: &Value) -> Option<&Map<String, Value>> {
    value
        .as_object()
        .filter(|obj| obj.get("type").is_some_and(Value::is_string))
}

fn node_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| as_node(v).is_some())
}

/// An array whose elements are all node objects. A missing key reads as empty.
fn node_list<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(&[]),
        Some(Value::Array(items)) if items.iter().all(|v| as_node(v).is_some()) => {
            Some(items.as_slice())
        }
        Some(_) => None,
    }
}

fn span_of(obj: &Map<String, Value>) -> Option<Span> {
    let line = obj.get("lineno")?.as_u64()? as usize;
    let col = obj.get("col_offset").and_then(Value::as_u64).unwrap_or(0) as usize;
    Some(Span { line, col })
}

fn const_value(value: &Value) -> Option<ConstValue> {
    Some(match value {
        Value::String(s) => ConstValue::Str(s.clone()),
        Value::Number(n) => ConstValue::Number(n.to_string()),
        Value::Bool(b) => ConstValue::Bool(*b),
        Value::Null => ConstValue::None,
        _ => return None,
    })
}

fn cmp_op(value: &Value) -> Option<CmpOp> {
    let name = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("type")?.as_str()?,
        _ => return None,
    };
    CmpOp::from_ast_name(name)
}

struct Lowering {
    builder: TreeBuilder,
}

impl Lowering {
    fn lower(&mut self, value: &Value) -> Result<NodeId, DumpError> {
        let obj = as_node(value).ok_or(DumpError::NotANode)?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DumpError::NotANode)?;

        // `Index` only wraps a subscript in old Python versions.
        if kind == "Index"
            && let Some(inner) = node_field(obj, "value")
        {
            return self.lower(inner);
        }

        let span = span_of(obj);
        match self.lower_known(kind, obj)? {
            Some(node) => Ok(self.builder.push(node, span)?),
            None => self.lower_other(kind, obj, span),
        }
    }

    fn lower_all(&mut self, values: &[Value]) -> Result<Vec<NodeId>, DumpError> {
        values.iter().map(|v| self.lower(v)).collect()
    }

    /// Lowers the node types the rules inspect. Returns `Ok(None)` when the
    /// type is not one of them or a required field is missing, in which case
    /// the caller falls back to [`NodeKind::Other`]. Fields are checked before
    /// anything is lowered so no child gets lowered twice.
    fn lower_known(
        &mut self,
        kind: &str,
        obj: &Map<String, Value>,
    ) -> Result<Option<NodeKind>, DumpError> {
        let node = match kind {
            "Module" => {
                let Some(body) = node_list(obj, "body") else {
                    return Ok(None);
                };
                NodeKind::Module {
                    body: self.lower_all(body)?,
                }
            }
            "Constant" | "NameConstant" => match obj.get("value").and_then(const_value) {
                Some(value) => NodeKind::Const(value),
                None => return Ok(None),
            },
            "Str" => match obj.get("s") {
                Some(Value::String(s)) => NodeKind::Const(ConstValue::Str(s.clone())),
                _ => return Ok(None),
            },
            "Num" => match obj.get("n") {
                Some(Value::Number(n)) => NodeKind::Const(ConstValue::Number(n.to_string())),
                _ => return Ok(None),
            },
            "Bytes" => NodeKind::Const(ConstValue::Bytes),
            "Call" => {
                let (Some(func), Some(args), Some(keywords)) = (
                    node_field(obj, "func"),
                    node_list(obj, "args"),
                    node_list(obj, "keywords"),
                ) else {
                    return Ok(None);
                };
                NodeKind::Call {
                    func: self.lower(func)?,
                    args: self.lower_all(args)?,
                    keywords: self.lower_all(keywords)?,
                }
            }
            "keyword" => {
                let arg = match obj.get("arg") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(_) => return Ok(None),
                };
                let Some(value) = node_field(obj, "value") else {
                    return Ok(None);
                };
                NodeKind::Keyword {
                    arg,
                    value: self.lower(value)?,
                }
            }
            "Assign" => {
                let (Some(targets), Some(value)) =
                    (node_list(obj, "targets"), node_field(obj, "value"))
                else {
                    return Ok(None);
                };
                NodeKind::Assign {
                    targets: self.lower_all(targets)?,
                    value: self.lower(value)?,
                }
            }
            "Dict" => {
                let (Some(Value::Array(keys)), Some(values)) =
                    (obj.get("keys"), node_list(obj, "values"))
                else {
                    return Ok(None);
                };
                let keys_ok = keys.iter().all(|k| k.is_null() || as_node(k).is_some());
                if !keys_ok || keys.len() != values.len() {
                    return Ok(None);
                }
                let mut items = Vec::with_capacity(values.len());
                for (key, value) in keys.iter().zip(values) {
                    let key = if key.is_null() {
                        None
                    } else {
                        Some(self.lower(key)?)
                    };
                    items.push(DictItem {
                        key,
                        value: self.lower(value)?,
                    });
                }
                NodeKind::Dict { items }
            }
            "Subscript" => {
                let (Some(value), Some(index)) = (node_field(obj, "value"), node_field(obj, "slice"))
                else {
                    return Ok(None);
                };
                NodeKind::Subscript {
                    value: self.lower(value)?,
                    index: self.lower(index)?,
                }
            }
            "Delete" => {
                let Some(targets) = node_list(obj, "targets") else {
                    return Ok(None);
                };
                NodeKind::Delete {
                    targets: self.lower_all(targets)?,
                }
            }
            "Compare" => {
                let (Some(left), Some(Value::Array(ops)), Some(comparators)) = (
                    node_field(obj, "left"),
                    obj.get("ops"),
                    node_list(obj, "comparators"),
                ) else {
                    return Ok(None);
                };
                let Some(ops) = ops.iter().map(cmp_op).collect::<Option<Vec<_>>>() else {
                    return Ok(None);
                };
                if ops.len() != comparators.len() {
                    return Ok(None);
                }
                let left = self.lower(left)?;
                let operands = self.lower_all(comparators)?;
                NodeKind::Compare {
                    left,
                    ops: ops.into_iter().zip(operands).collect(),
                }
            }
            "Attribute" => {
                let (Some(value), Some(Value::String(attr))) =
                    (node_field(obj, "value"), obj.get("attr"))
                else {
                    return Ok(None);
                };
                NodeKind::Attribute {
                    value: self.lower(value)?,
                    attr: attr.clone(),
                }
            }
            "Name" => match obj.get("id") {
                Some(Value::String(id)) => NodeKind::Name { id: id.clone() },
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn lower_other(
        &mut self,
        kind: &str,
        obj: &Map<String, Value>,
        span: Option<Span>,
    ) -> Result<NodeId, DumpError> {
        let mut children = Vec::new();
        for (key, value) in obj {
            if LOCATION_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.collect_nodes(value, &mut children)?;
        }
        Ok(self.builder.push(
            NodeKind::Other {
                kind: kind.to_string(),
                children,
            },
            span,
        )?)
    }

    fn collect_nodes(&mut self, value: &Value, out: &mut Vec<NodeId>) -> Result<(), DumpError> {
        match value {
            Value::Object(_) if as_node(value).is_some() => out.push(self.lower(value)?),
            Value::Array(items) => {
                for item in items {
                    self.collect_nodes(item, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
