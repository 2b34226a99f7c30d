//! Core data model and input handling.
//!
//! ## Module Structure
//!
//! - `tree`: Arena syntax tree with parent links (SyntaxTree, TreeBuilder)
//! - `dump`: Lowering of host JSON tree dumps into a SyntaxTree
//! - `script`: Target-script predicate (ScriptPredicate, ScriptPattern)
//! - `data`: Source location types (SourceContext, SourceLocation)
//! - `file_scanner`: Discovery of tree dumps on disk
//! - `context`: CheckContext, loading and checking every dump of a run

pub mod context;
pub mod data;
pub mod dump;
pub mod file_scanner;
pub mod script;
pub mod tree;

pub use context::CheckContext;
pub use data::{SourceContext, SourceLocation};
pub use dump::{DumpError, TreeDocument, lower_tree, parse_document};
pub use script::{DEFAULT_SCRIPT_PATTERN, ScriptPattern, ScriptPredicate};
pub use tree::{
    Ancestors, CmpOp, ConstValue, DictItem, Node, NodeId, NodeKind, NodeTag, Span, SyntaxTree,
    TreeBuilder, TreeError,
};
