//! Diagnostic recovery from textual build output
//!
//! When a compile task fails without a structured problem list, the only
//! trace of the error is the console log, e.g.:
//!
//! ```text
//! [error] /a/Foo.java:10: incompatible types
//! [error] found   : String
//! [error] required: Int
//! [error]     ^
//! ```
//!
//! Three line shapes are recognized (error start, error info, caret
//! pointer). State is folded line by line through [`LogParseState::step`];
//! the first error that reaches its caret line is the result.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::feedback::diagnostic::{Diagnostic, Position, Severity};

const ANSI_RESET: &str = "\u{1b}[0m";
const ANSI_RED: &str = "\u{1b}[31m";

static ERROR_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[error\]\s*(.*[.](?:java|scala)):(\d+):\s*(.*)$").unwrap());

static ERROR_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[error\]\s*([a-z ]+):(.*)$").unwrap());

static ERROR_POINTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[error\](\s*)\^\s*$").unwrap());

/// A recognized log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// `[error] <file>:<line>: <message>`
    ErrorStart {
        file: String,
        line: u32,
        message: String,
    },
    /// `[error] <key>: <text>`, e.g. `found   : String`
    ErrorInfo { key: String, text: String },
    /// `[error]    ^`, with the width of the whitespace before the caret
    Pointer { column: usize },
}

impl LogLine {
    /// Strip colour codes and match against the three shapes, in priority order
    pub fn recognize(raw: &str) -> Option<Self> {
        let line = raw.replace(ANSI_RESET, "").replace(ANSI_RED, "");

        if let Some(caps) = ERROR_START.captures(&line) {
            // Line numbers that overflow are treated as noise.
            let number = caps[2].parse().ok()?;
            return Some(Self::ErrorStart {
                file: caps[1].to_string(),
                line: number,
                message: caps[3].to_string(),
            });
        }
        if let Some(caps) = ERROR_INFO.captures(&line) {
            return Some(Self::ErrorInfo {
                key: caps[1].trim().to_string(),
                text: caps[2].trim().to_string(),
            });
        }
        if let Some(caps) = ERROR_POINTER.captures(&line) {
            return Some(Self::Pointer {
                column: caps[1].len(),
            });
        }
        None
    }
}

/// Diagnostic under assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDiagnostic {
    pub file: String,
    pub line: u32,
    pub message: String,
    /// Width of the whitespace run before the caret
    pub pointer: Option<usize>,
}

impl PartialDiagnostic {
    fn into_diagnostic(self) -> Diagnostic {
        let pointer_column = self
            .pointer
            .and_then(|p| p.checked_sub(1))
            .and_then(|p| u32::try_from(p).ok());

        Diagnostic {
            message: self.message,
            severity: Severity::Error,
            position: Position {
                source_path: Some(self.file),
                line: Some(self.line),
                pointer_column,
            },
        }
    }
}

/// Running state of the log grammar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogParseState {
    /// Diagnostic currently being assembled
    pub pending: Option<PartialDiagnostic>,
    /// First diagnostic that reached its pointer line; never replaced
    pub first: Option<PartialDiagnostic>,
}

impl LogParseState {
    /// Fold one raw log line into the state
    pub fn step(mut self, raw: &str) -> Self {
        match LogLine::recognize(raw) {
            Some(LogLine::ErrorStart {
                file,
                line,
                message,
            }) => {
                self.pending = Some(PartialDiagnostic {
                    file,
                    line,
                    message,
                    pointer: None,
                });
            }
            Some(LogLine::ErrorInfo { key, text }) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.message = format!("{} [{}: {}]", pending.message, key, text);
                }
            }
            Some(LogLine::Pointer { column }) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.pointer = Some(column);
                    if self.first.is_none() {
                        self.first = Some(pending.clone());
                    }
                }
            }
            None => {}
        }
        self
    }

    /// The first completed diagnostic, if any
    pub fn finish(self) -> Option<Diagnostic> {
        self.first.map(PartialDiagnostic::into_diagnostic)
    }
}

/// Recovers at most one positioned diagnostic from a task's console output
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticLogParser {
    /// Only scan this many trailing lines
    tail_lines: Option<usize>,
}

impl DiagnosticLogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the scan to the last `lines` lines of each log
    pub fn with_tail_lines(mut self, lines: Option<usize>) -> Self {
        self.tail_lines = lines;
        self
    }

    /// Run the grammar over `lines` and return the first positioned error
    pub fn extract_first<I, S>(&self, lines: I) -> Option<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let state = match self.tail_lines {
            Some(tail) => {
                let lines: Vec<S> = lines.into_iter().collect();
                let skip = lines.len().saturating_sub(tail);
                Self::fold(lines.into_iter().skip(skip))
            }
            None => Self::fold(lines),
        };

        let found = state.finish();
        trace!(found = found.is_some(), "scanned build log for diagnostics");
        found
    }

    fn fold<I, S>(lines: I) -> LogParseState
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .fold(LogParseState::default(), |state, line| state.step(line.as_ref()))
    }
}
