//! missing-gettext - finds user-facing strings that skip gettext
//!
//! Checks the string literals of parsed Python modules (Django projects in
//! particular) and reports those written in the target script (Cyrillic by
//! default) that are not wrapped in a gettext call and do not sit in a
//! position that never needs translation, such as a dictionary key, a log
//! call or a query method argument.
//!
//! The host parses its sources and exports each module as a JSON dump of
//! Python's `ast`; this crate lowers the dumps into an arena tree and
//! classifies every literal in it.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and parsing
//! - `core`: Syntax tree, dump lowering, file scanning and the check context
//! - `issues`: Issue type definitions and reporting
//! - `rules`: Literal classification and issue detection
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
pub mod rules;
pub mod utils;
