//! Uniform diagnostic record shared by structured problems and log parsing

use serde::{Deserialize, Serialize};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Location of a diagnostic in source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Source file as reported by the compiler
    #[serde(default)]
    pub source_path: Option<String>,
    /// Line number (1-indexed)
    #[serde(default)]
    pub line: Option<u32>,
    /// Column of the problem (0-indexed)
    #[serde(default)]
    pub pointer_column: Option<u32>,
}

/// A single compiler problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub position: Position,
}

impl Diagnostic {
    /// Create an error diagnostic without position
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            position: Position::default(),
        }
    }

    /// Set the source location
    pub fn at(mut self, source_path: impl Into<String>, line: u32) -> Self {
        self.position.source_path = Some(source_path.into());
        self.position.line = Some(line);
        self
    }

    /// Set the pointer column
    pub fn with_pointer(mut self, column: u32) -> Self {
        self.position.pointer_column = Some(column);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.severity)?;
        if let Some(path) = &self.position.source_path {
            write!(f, " {}", path)?;
            if let Some(line) = self.position.line {
                write!(f, ":{}", line)?;
            }
            if let Some(column) = self.position.pointer_column {
                write!(f, ":{}", column)?;
            }
            write!(f, ":")?;
        }
        write!(f, " {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let diag = Diagnostic::error("not found: value x")
            .at("app/Home.scala", 12)
            .with_pointer(4);
        assert_eq!(diag.to_string(), "[error] app/Home.scala:12:4: not found: value x");
    }

    #[test]
    fn test_display_without_position() {
        let diag = Diagnostic {
            message: "deprecated".into(),
            severity: Severity::Warn,
            position: Position::default(),
        };
        assert_eq!(diag.to_string(), "[warn] deprecated");
        assert!(!diag.is_error());
    }

    #[test]
    fn test_deserialize_problem() {
        let json = r#"{"message": "type mismatch", "severity": "error",
            "position": {"source_path": "a/B.scala", "line": 3}}"#;
        let diag: Diagnostic = serde_json::from_str(json).unwrap();
        assert!(diag.is_error());
        assert_eq!(diag.position.line, Some(3));
        assert_eq!(diag.position.pointer_column, None);
    }
}
