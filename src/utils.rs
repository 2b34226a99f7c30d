//! Common utility functions shared across the codebase.

/// Renders text the way Python's `repr()` renders a `str`.
///
/// Single quotes are used unless the text contains a single quote and no
/// double quote. Printable characters, Cyrillic included, are kept as they are.
///
/// # Examples
///
/// ```
/// use missing_gettext::utils::python_repr;
///
/// assert_eq!(python_repr("Заказ"), "'Заказ'");
/// assert_eq!(python_repr("it's"), "\"it's\"");
/// assert_eq!(python_repr("a\nb"), "'a\\nb'");
/// ```
pub fn python_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_printable(c) => out.push(c),
            c => push_escaped(&mut out, c),
        }
    }
    out.push(quote);
    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{00ad}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{feff}'
    )
}

fn push_escaped(out: &mut String, c: char) {
    let code = c as u32;
    let escaped = if code < 0x100 {
        format!("\\x{:02x}", code)
    } else if code < 0x10000 {
        format!("\\u{:04x}", code)
    } else {
        format!("\\U{:08x}", code)
    };
    out.push_str(&escaped);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::utils::*;

    #[test]
    fn test_python_repr_quotes() {
        assert_eq!(python_repr("Заказ"), "'Заказ'");
        assert_eq!(python_repr(""), "''");
        assert_eq!(python_repr("Д'Артаньян"), "\"Д'Артаньян\"");
        assert_eq!(python_repr("\"Ромашка\""), "'\"Ромашка\"'");
        // Both quote kinds: single quotes, with the single one escaped.
        assert_eq!(python_repr("'а' \"б\""), "'\\'а\\' \"б\"'");
    }

    #[test]
    fn test_python_repr_escapes() {
        assert_eq!(python_repr("строка\nвторая"), "'строка\\nвторая'");
        assert_eq!(python_repr("таб\tи\r"), "'таб\\tи\\r'");
        assert_eq!(python_repr("C:\\путь"), "'C:\\\\путь'");
        assert_eq!(python_repr("\u{0}\u{1b}"), "'\\x00\\x1b'");
        assert_eq!(python_repr("цена\u{a0}руб"), "'цена\\xa0руб'");
        assert_eq!(python_repr("a\u{200b}b"), "'a\\u200bb'");
    }
}
