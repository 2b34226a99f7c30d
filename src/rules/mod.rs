//! Detection rules for non-gettext-ed strings.
//!
//! ## Module Structure
//!
//! - `content`: Content pre-filter on the literal text alone
//! - `structural`: Exemption rule table keyed by ancestor kind
//! - `classify`: Classifier combining the script gate, pre-filter and ancestor scan
//! - `missing_gettext`: Tree walker turning flagged literals into issues

pub mod classify;
pub mod content;
pub mod missing_gettext;
pub mod structural;

pub use classify::{Classification, Classifier, ClassifyError, Exemption, GETTEXT_NAMES, Verdict};
pub use content::{ContentExemption, content_exemption};
pub use missing_gettext::{FlaggedLiteral, check_document, check_tree};
pub use structural::{RULES, RuleId};
