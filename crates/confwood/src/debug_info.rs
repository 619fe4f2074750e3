//! Source locations attached to expressions and errors

use std::fmt;

/// Where an expression came from in the configuration source.
///
/// The parser fills this in for every node it builds; the evaluator copies
/// it onto any error raised while evaluating that node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DebugInfo {
    /// Path of the source file (empty when unknown)
    pub path: String,
    /// First line (1-based)
    pub first_line: u32,
    /// First column (1-based)
    pub first_column: u32,
    /// Last line (1-based, inclusive)
    pub last_line: u32,
    /// Last column (1-based, inclusive)
    pub last_column: u32,
}

impl DebugInfo {
    /// Create a location spanning a range.
    pub fn new(
        path: impl Into<String>,
        first_line: u32,
        first_column: u32,
        last_line: u32,
        last_column: u32,
    ) -> Self {
        Self {
            path: path.into(),
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// Create a single-position location.
    pub fn at(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(path, line, column, line, column)
    }

    /// True if nothing is known about this location.
    pub fn is_unknown(&self) -> bool {
        self.path.is_empty() && self.first_line == 0
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "in <unknown>");
        }

        write!(
            f,
            "in {}: {}:{}-{}:{}",
            self.path, self.first_line, self.first_column, self.last_line, self.last_column
        )
    }
}
