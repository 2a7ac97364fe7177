//! Source map construction from a compilation analysis
//!
//! The analysis lists, for every compiled output unit, the file(s) the build
//! tool says it came from. The resulting [`SourceMap`] lets the reload
//! front-end link any compiled class back to the file to edit.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReconcileResult;
use crate::generated::{FsSourceReader, GeneratedSourceMapper, SourceReader};
use crate::origin::{OriginDescriptor, VirtualFileResolver};

/// Where a compiled unit came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Nearest known file on disk
    pub resolved_path: PathBuf,
    /// Author-written file when `resolved_path` is a generated intermediate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_source: Option<PathBuf>,
}

impl SourceReference {
    /// File a developer should edit for this unit
    pub fn editable_path(&self) -> &PathBuf {
        self.original_source.as_ref().unwrap_or(&self.resolved_path)
    }
}

/// Output-unit name to source reference
pub type SourceMap = BTreeMap<String, SourceReference>;

/// Output-unit name to candidate origins, as reported by the build tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationAnalysis {
    #[serde(default)]
    pub classes: BTreeMap<String, Vec<OriginDescriptor>>,
}

impl CompilationAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit with its candidate origins
    pub fn with_class(
        mut self,
        name: impl Into<String>,
        origins: impl IntoIterator<Item = OriginDescriptor>,
    ) -> Self {
        self.classes
            .insert(name.into(), origins.into_iter().collect());
        self
    }
}

/// Builds [`SourceMap`]s from compilation analyses
#[derive(Debug, Clone, Default)]
pub struct AnalysisSourceMapper<R = FsSourceReader> {
    resolver: VirtualFileResolver,
    generated: GeneratedSourceMapper<R>,
}

impl<R: SourceReader> AnalysisSourceMapper<R> {
    pub fn new(reader: R) -> Self {
        Self {
            resolver: VirtualFileResolver,
            generated: GeneratedSourceMapper::new(reader),
        }
    }

    pub fn generated(&self) -> &GeneratedSourceMapper<R> {
        &self.generated
    }

    /// Map every unit in `analysis` to its source reference.
    ///
    /// Units without candidates or with a `none` origin are left out. Any
    /// candidate the resolver cannot handle aborts the whole map.
    pub fn build_source_map(&self, analysis: &CompilationAnalysis) -> ReconcileResult<SourceMap> {
        let mut sources = SourceMap::new();

        for (name, candidates) in &analysis.classes {
            // Further candidates are aliases of the first.
            let Some(first) = candidates.first() else {
                continue;
            };
            let Some(resolved_path) = self.resolver.resolve_descriptor(first)? else {
                continue;
            };
            let original_source = self.generated.unwrap(&resolved_path);

            sources.insert(
                name.clone(),
                SourceReference {
                    resolved_path,
                    original_source,
                },
            );
        }

        debug!(
            units = analysis.classes.len(),
            mapped = sources.len(),
            "built source map"
        );
        Ok(sources)
    }
}
