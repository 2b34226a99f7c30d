//! Content-based pre-filter.
//!
//! Cheap checks on the literal text alone that rule out strings which can
//! never need translation, before any tree walking happens.

/// Why a literal was exempted by its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentExemption {
    Empty,
    Number,
    AnchoredRegex,
    RegexMarker,
    PathFragment,
    SqlComment,
}

impl std::fmt::Display for ContentExemption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentExemption::Empty => write!(f, "empty string"),
            ContentExemption::Number => write!(f, "number"),
            ContentExemption::AnchoredRegex => write!(f, "anchored regex"),
            ContentExemption::RegexMarker => write!(f, "regex marker"),
            ContentExemption::PathFragment => write!(f, "url or path fragment"),
            ContentExemption::SqlComment => write!(f, "sql comment"),
        }
    }
}

/// Raw substrings that mark a literal as a regular expression.
///
/// Plain substring presence is all that is checked: a sentence that happens to
/// contain `а-я` counts as a regex too.
const REGEX_MARKERS: &[&str] = &["[^", "а-я", "А-Я"];

/// Returns the first content rule the text matches, in rule order.
pub fn content_exemption(text: &str) -> Option<ContentExemption> {
    if text.is_empty() {
        return Some(ContentExemption::Empty);
    }
    if is_number(text) {
        return Some(ContentExemption::Number);
    }
    if text.starts_with('^') && text.ends_with('$') {
        return Some(ContentExemption::AnchoredRegex);
    }
    if REGEX_MARKERS.iter().any(|marker| text.contains(marker)) {
        return Some(ContentExemption::RegexMarker);
    }
    if text.starts_with('/') || text.ends_with('/') {
        return Some(ContentExemption::PathFragment);
    }
    if is_sql_comment(text) {
        return Some(ContentExemption::SqlComment);
    }
    None
}

/// Whether the text reads as a float the way Python's `float()` accepts it:
/// surrounding whitespace, sign, decimals, exponent, `inf` and `nan`.
pub fn is_number(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.parse::<f64>().is_ok() {
        return true;
    }
    // Python also allows single underscores between digits ("1_000").
    trimmed.contains('_') && strip_digit_underscores(trimmed).is_some_and(|s| s.parse::<f64>().is_ok())
}

fn strip_digit_underscores(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '_' {
            let before = i.checked_sub(1).and_then(|j| chars.get(j));
            let after = chars.get(i + 1);
            let between_digits = before.is_some_and(char::is_ascii_digit)
                && after.is_some_and(char::is_ascii_digit);
            if !between_digits {
                return None;
            }
        } else {
            out.push(*c);
        }
    }
    Some(out)
}

/// Whether any line of the text, once trimmed, starts with a SQL `--` comment.
pub fn is_sql_comment(text: &str) -> bool {
    text.split('\n').any(|line| line.trim().starts_with("--"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(content_exemption(""), Some(ContentExemption::Empty));
    }

    #[test]
    fn test_numbers() {
        for text in ["1", "-2.5", "+3e10", " 4 ", ".5", "1E-3", "inf", "nan", "1_000"] {
            assert!(is_number(text), "{text:?} should be a number");
        }
        for text in ["", " ", "1a", "1__0", "_1", "1_", "один", "1.2.3"] {
            assert!(!is_number(text), "{text:?} should not be a number");
        }
        assert_eq!(content_exemption("42"), Some(ContentExemption::Number));
    }

    #[test]
    fn test_anchored_regex() {
        assert_eq!(
            content_exemption("^заказ$"),
            Some(ContentExemption::AnchoredRegex)
        );
        assert_eq!(content_exemption("^заказ"), None);
    }

    #[test]
    fn test_regex_markers() {
        assert_eq!(
            content_exemption("[^abc]"),
            Some(ContentExemption::RegexMarker)
        );
        assert_eq!(
            content_exemption("[а-я]+"),
            Some(ContentExemption::RegexMarker)
        );
        assert_eq!(
            content_exemption("[А-Я]+"),
            Some(ContentExemption::RegexMarker)
        );
        // Substring match only, no regex parsing.
        assert_eq!(
            content_exemption("буквы а-я"),
            Some(ContentExemption::RegexMarker)
        );
    }

    #[test]
    fn test_anchored_takes_precedence_over_markers() {
        assert_eq!(
            content_exemption("^[^а-я]+$"),
            Some(ContentExemption::AnchoredRegex)
        );
    }

    #[test]
    fn test_path_fragments() {
        assert_eq!(
            content_exemption("/заказы"),
            Some(ContentExemption::PathFragment)
        );
        assert_eq!(
            content_exemption("заказы/"),
            Some(ContentExemption::PathFragment)
        );
        assert_eq!(content_exemption("за/казы"), None);
    }

    #[test]
    fn test_sql_comment() {
        let sql = "SELECT 1\n    -- выборка заказов\nFROM orders";
        assert_eq!(content_exemption(sql), Some(ContentExemption::SqlComment));
        assert!(!is_sql_comment("цена - 5"));
    }

    #[test]
    fn test_plain_text_passes() {
        assert_eq!(content_exemption("Заказ"), None);
        assert_eq!(content_exemption("Дата создания"), None);
    }
}
