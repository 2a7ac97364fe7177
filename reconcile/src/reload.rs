//! Reload cycle entry points
//!
//! One call per incremental compile: a success yields the source map plus
//! the classpath, a failure yields a classified error whose positions point
//! at author-written files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{AnalysisSourceMapper, CompilationAnalysis, SourceMap};
use crate::config::ReloadConfig;
use crate::error::ReconcileResult;
use crate::feedback::{
    BuildFailure, ClassifiedFailure, Diagnostic, DiagnosticLogParser, FailureClassifier,
};
use crate::generated::{FsSourceReader, SourceReader};

/// Result of one reload compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompileOutcome {
    Success {
        sources: SourceMap,
        /// Passed through unchanged
        classpath: Vec<PathBuf>,
    },
    Failure {
        failure: ClassifiedFailure,
    },
}

/// Wires source mapping and failure classification for a reload front-end
#[derive(Debug, Clone)]
pub struct ReloadCycle<R = FsSourceReader> {
    config: ReloadConfig,
    mapper: AnalysisSourceMapper<R>,
    classifier: FailureClassifier,
}

impl ReloadCycle<FsSourceReader> {
    /// Reload cycle reading generated sources from disk
    pub fn from_config(config: ReloadConfig) -> Self {
        Self::new(config, FsSourceReader)
    }
}

impl<R: SourceReader> ReloadCycle<R> {
    pub fn new(config: ReloadConfig, reader: R) -> Self {
        let parser = DiagnosticLogParser::new().with_tail_lines(config.log_tail_lines);
        Self {
            config,
            mapper: AnalysisSourceMapper::new(reader),
            classifier: FailureClassifier::new(parser),
        }
    }

    pub fn config(&self) -> &ReloadConfig {
        &self.config
    }

    /// Compile succeeded: build the source map
    pub fn on_success(
        &self,
        analysis: &CompilationAnalysis,
        classpath: Vec<PathBuf>,
    ) -> ReconcileResult<CompileOutcome> {
        let sources = self.mapper.build_source_map(analysis)?;
        info!(
            sources = sources.len(),
            classpath = classpath.len(),
            "reload compile succeeded"
        );
        Ok(CompileOutcome::Success { sources, classpath })
    }

    /// Compile failed: classify and point diagnostics at author files
    pub fn on_failure(&self, failure: &BuildFailure) -> CompileOutcome {
        let mut classified = self.classifier.classify(failure);

        if self.config.remap_generated {
            if let ClassifiedFailure::StructuredCompileFailure { diagnostics } = &mut classified {
                for diagnostic in diagnostics.iter_mut() {
                    self.remap(diagnostic);
                }
            }
        }

        info!(kind = classified.kind(), "reload compile failed");
        CompileOutcome::Failure {
            failure: classified,
        }
    }

    fn remap(&self, diagnostic: &mut Diagnostic) {
        let Some(path) = diagnostic.position.source_path.clone() else {
            return;
        };
        let Some(generated) = self.mapper.generated().inspect(Path::new(&path)) else {
            return;
        };

        let position = &mut diagnostic.position;
        let line = position.line.and_then(|l| generated.map_line(l));
        debug!(
            generated = %path,
            source = %generated.source().display(),
            ?line,
            "remapped diagnostic onto author source"
        );

        position.source_path = Some(generated.source().display().to_string());
        position.line = line;
        // Columns of the generated file mean nothing in the author file.
        position.pointer_column = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FailureCause, Severity, TaskLog};
    use crate::origin::OriginDescriptor;
    use std::collections::HashMap;

    const GENERATED: &str = "/p/target/twirl/views/html/index.template.scala";

    fn reader() -> HashMap<PathBuf, String> {
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from(GENERATED),
            "object index\n/*\n -- GENERATED --\n SOURCE: /p/app/views/index.scala.html\n \
             MATRIX: 10->1\n LINES: 1->1|30->7\n -- GENERATED --\n*/\n"
                .to_string(),
        );
        files
    }

    fn config(remap_generated: bool) -> ReloadConfig {
        ReloadConfig {
            remap_generated,
            log_tail_lines: None,
        }
    }

    fn failure_in_generated() -> BuildFailure {
        BuildFailure {
            cause: Some(FailureCause::CompileFailed { message: None }),
            problems: Some(vec![Diagnostic::error("not found: value titel")
                .at(GENERATED, 31)
                .with_pointer(12)]),
            logs: vec![],
        }
    }

    #[test]
    fn test_success_passes_classpath_through() {
        let cycle = ReloadCycle::new(config(true), reader());
        let analysis = CompilationAnalysis::new()
            .with_class("views.html.index", [OriginDescriptor::file(GENERATED)]);
        let classpath = vec![PathBuf::from("/p/target/classes"), PathBuf::from("/lib/a.jar")];

        match cycle.on_success(&analysis, classpath.clone()).unwrap() {
            CompileOutcome::Success {
                sources,
                classpath: passed,
            } => {
                assert_eq!(passed, classpath);
                assert_eq!(
                    sources["views.html.index"].original_source,
                    Some(PathBuf::from("/p/app/views/index.scala.html"))
                );
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_in_generated_unit_remapped() {
        let cycle = ReloadCycle::new(config(true), reader());
        let CompileOutcome::Failure { failure } = cycle.on_failure(&failure_in_generated()) else {
            panic!("expected failure outcome");
        };
        let ClassifiedFailure::StructuredCompileFailure { diagnostics } = failure else {
            panic!("expected structured failure");
        };

        let position = &diagnostics[0].position;
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(
            position.source_path.as_deref(),
            Some("/p/app/views/index.scala.html")
        );
        assert_eq!(position.line, Some(7));
        assert_eq!(position.pointer_column, None);
    }

    #[test]
    fn test_remap_disabled_keeps_generated_position() {
        let cycle = ReloadCycle::new(config(false), reader());
        let CompileOutcome::Failure { failure } = cycle.on_failure(&failure_in_generated()) else {
            panic!("expected failure outcome");
        };
        let ClassifiedFailure::StructuredCompileFailure { diagnostics } = failure else {
            panic!("expected structured failure");
        };
        assert_eq!(diagnostics[0].position.source_path.as_deref(), Some(GENERATED));
        assert_eq!(diagnostics[0].position.line, Some(31));
        assert_eq!(diagnostics[0].position.pointer_column, Some(12));
    }

    #[test]
    fn test_tail_limit_applies_to_log_fallback() {
        let cycle = ReloadCycle::new(
            ReloadConfig {
                remap_generated: true,
                log_tail_lines: Some(1),
            },
            reader(),
        );
        let failure = BuildFailure {
            cause: Some(FailureCause::CompileFailed { message: None }),
            problems: None,
            logs: vec![TaskLog::new(
                "compile",
                ["[error] /a/Foo.java:3: boom", "[error]  ^"],
            )],
        };

        let CompileOutcome::Failure { failure } = cycle.on_failure(&failure) else {
            panic!("expected failure outcome");
        };
        assert_eq!(failure.kind(), "unexpected_failure");
    }
}
