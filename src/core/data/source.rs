/// Position of a flagged literal in a checked file.
///
/// `line` and `col` are both 1-based; `col` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: usize,
    pub col: usize,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            col,
        }
    }
}

/// Position plus the source line it points into, for display.
///
/// Tree dumps may omit the source text, in which case there is no line to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub location: SourceLocation,
    pub source_line: Option<String>,
}

impl SourceContext {
    pub fn new(location: SourceLocation, source_line: Option<String>) -> Self {
        Self {
            location,
            source_line,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.location.file_path
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn col(&self) -> usize {
        self.location.col
    }
}
