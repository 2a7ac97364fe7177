//! Build failure classification
//!
//! A failed compile can arrive as an application error that is already
//! well-formed, as a compiler failure with a structured problem list, or as
//! nothing more than console output. [`FailureClassifier::classify`] funnels
//! all of them into one [`ClassifiedFailure`] by trying, in order:
//!
//! ```text
//! already typed → other exception → structured problems → log fallback → unexpected
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feedback::diagnostic::Diagnostic;
use crate::feedback::log_parser::DiagnosticLogParser;

/// Reported when a compile failure carries no usable problem
pub const NO_PROBLEM_REPORTED: &str = "The compilation failed without reporting any problem!";

/// Reported when a failed task carries nothing at all
pub const NO_EXCEPTION: &str = "The compilation task failed without any exception!";

/// Application-level error that is already fit for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadException {
    pub title: String,
    pub description: String,
}

impl std::fmt::Display for ReloadException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl std::error::Error for ReloadException {}

/// Exception attached to a failed build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// Already an application-level error
    Reload(ReloadException),
    /// The compiler reported failure
    CompileFailed {
        #[serde(default)]
        message: Option<String>,
    },
    /// Any other exception raised while running the build
    Exception {
        #[serde(rename = "exception")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reload(e) => write!(f, "{}", e),
            Self::CompileFailed { message } => {
                write!(f, "compilation failed")?;
                if let Some(message) = message {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
            Self::Exception { kind, message } => {
                write!(f, "{}", kind)?;
                if let Some(message) = message {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
        }
    }
}

/// Console output captured from one upstream task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLog {
    pub task: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl TaskLog {
    pub fn new<I, S>(task: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task: task.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// A failed build step as handed over by the build tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFailure {
    #[serde(default)]
    pub cause: Option<FailureCause>,
    /// Structured problem list, when the compiler produced one
    #[serde(default)]
    pub problems: Option<Vec<Diagnostic>>,
    #[serde(default)]
    pub logs: Vec<TaskLog>,
}

/// Canonical error value for the reload front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedFailure {
    AlreadyTyped {
        cause: ReloadException,
    },
    StructuredCompileFailure {
        diagnostics: Vec<Diagnostic>,
    },
    UnexpectedFailure {
        message: Option<String>,
        cause: Option<FailureCause>,
    },
}

impl ClassifiedFailure {
    fn compile_error(diagnostic: Diagnostic) -> Self {
        Self::StructuredCompileFailure {
            diagnostics: vec![diagnostic],
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyTyped { .. } => "already_typed",
            Self::StructuredCompileFailure { .. } => "structured_compile_failure",
            Self::UnexpectedFailure { .. } => "unexpected_failure",
        }
    }
}

/// Result of one classification step
enum Step {
    Done(ClassifiedFailure),
    /// Skip to the unexpected-failure fallback with this note
    GiveUp(&'static str),
    Next,
}

/// Turns any failed build into a [`ClassifiedFailure`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier {
    parser: DiagnosticLogParser,
}

impl FailureClassifier {
    pub fn new(parser: DiagnosticLogParser) -> Self {
        Self { parser }
    }

    pub fn classify(&self, failure: &BuildFailure) -> ClassifiedFailure {
        let steps: [fn(&Self, &BuildFailure) -> Step; 4] = [
            Self::try_already_typed,
            Self::try_non_compile_exception,
            Self::try_structured_problems,
            Self::try_log_output,
        ];

        let mut note = None;
        for step in steps {
            match step(self, failure) {
                Step::Done(classified) => {
                    debug!(kind = classified.kind(), "classified build failure");
                    return classified;
                }
                Step::GiveUp(reason) => {
                    note = Some(reason);
                    break;
                }
                Step::Next => {}
            }
        }

        let unexpected = Self::unexpected(failure, note);
        debug!(kind = unexpected.kind(), "classified build failure");
        unexpected
    }

    fn try_already_typed(&self, failure: &BuildFailure) -> Step {
        match &failure.cause {
            Some(FailureCause::Reload(e)) => Step::Done(ClassifiedFailure::AlreadyTyped {
                cause: e.clone(),
            }),
            _ => Step::Next,
        }
    }

    /// Problems and logs only describe compile failures; other exceptions
    /// are reported as they are, whatever output came with them.
    fn try_non_compile_exception(&self, failure: &BuildFailure) -> Step {
        match &failure.cause {
            Some(FailureCause::Exception { .. }) => Step::Done(Self::unexpected(failure, None)),
            _ => Step::Next,
        }
    }

    fn try_structured_problems(&self, failure: &BuildFailure) -> Step {
        let Some(problems) = &failure.problems else {
            return Step::Next;
        };
        match problems.iter().find(|p| p.is_error()) {
            Some(problem) => Step::Done(ClassifiedFailure::compile_error(problem.clone())),
            None => Step::GiveUp(NO_PROBLEM_REPORTED),
        }
    }

    fn try_log_output(&self, failure: &BuildFailure) -> Step {
        // One parser run per task; positions never carry across logs.
        failure
            .logs
            .iter()
            .find_map(|log| {
                let found = self.parser.extract_first(&log.lines);
                if found.is_some() {
                    debug!(task = %log.task, "recovered diagnostic from task log");
                }
                found
            })
            .map(|diagnostic| Step::Done(ClassifiedFailure::compile_error(diagnostic)))
            .unwrap_or(Step::Next)
    }

    fn unexpected(failure: &BuildFailure, note: Option<&'static str>) -> ClassifiedFailure {
        let message = match (&failure.cause, note) {
            (_, Some(note)) => Some(note.to_string()),
            (Some(FailureCause::CompileFailed { .. }), None) => Some(NO_PROBLEM_REPORTED.to_string()),
            (Some(_), None) => None,
            (None, None) if failure.logs.is_empty() => Some(NO_EXCEPTION.to_string()),
            (None, None) => Some(NO_PROBLEM_REPORTED.to_string()),
        };

        ClassifiedFailure::UnexpectedFailure {
            message,
            cause: failure.cause.clone(),
        }
    }
}
