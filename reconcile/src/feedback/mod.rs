//! Compile Failure Feedback Module
//!
//! Turns a failed reload compile into something the front-end can show:
//! - Structured compiler problems, when the build tool reports them
//! - Diagnostics recovered from `[error]` console output otherwise
//! - A generic unexpected-failure marker as the last resort
//!
//! # Architecture
//!
//! ```text
//! BuildFailure → FailureClassifier ─┬─ problems ──────────────→ ClassifiedFailure
//!                                   └─ logs → DiagnosticLogParser ─┘
//! ```

pub mod classifier;
pub mod diagnostic;
pub mod log_parser;

pub use classifier::{
    BuildFailure, ClassifiedFailure, FailureCause, FailureClassifier, ReloadException, TaskLog,
};
pub use diagnostic::{Diagnostic, Position, Severity};
pub use log_parser::{DiagnosticLogParser, LogLine, LogParseState, PartialDiagnostic};
