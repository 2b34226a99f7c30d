//! Location types shared by rules, issues and the reporter.

pub mod source;

pub use source::{SourceContext, SourceLocation};
