//! Build Output Reconciliation for Live Reload
//!
//! After an incremental recompile, a reload front-end needs two things from
//! the build:
//! - For every compiled unit, the file the developer should edit
//! - For a failed compile, one displayable error with file, line and column
//!
//! Build tools report both in inconsistent shapes. This library normalizes
//! them:
//!
//! ```text
//! CompilationAnalysis → AnalysisSourceMapper ─┬─ VirtualFileResolver
//!                                             └─ GeneratedSourceMapper → SourceMap
//!
//! BuildFailure → FailureClassifier ─┬─ structured problems
//!                                   └─ DiagnosticLogParser  → ClassifiedFailure
//! ```
//!
//! [`ReloadCycle`] ties both together for one compile.

#![allow(clippy::uninlined_format_args)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod feedback;
pub mod generated;
pub mod origin;
pub mod reload;

pub use analysis::{AnalysisSourceMapper, CompilationAnalysis, SourceMap, SourceReference};
pub use config::ReloadConfig;
pub use error::{ReconcileError, ReconcileResult};
pub use feedback::{
    BuildFailure, ClassifiedFailure, Diagnostic, DiagnosticLogParser, FailureCause,
    FailureClassifier, Position, ReloadException, Severity, TaskLog,
};
pub use generated::{FsSourceReader, GeneratedSource, GeneratedSourceMapper, SourceReader};
pub use origin::{ArtifactOrigin, OriginDescriptor, VirtualFileResolver};
pub use reload::{CompileOutcome, ReloadCycle};
