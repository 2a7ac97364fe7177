//! Artifact origins and virtual file resolution
//!
//! Build tools state where a compiled unit came from in several shapes
//! depending on version and configuration: a plain path, or a virtual file
//! handle that is either a list of segments under a base marker or an
//! absolute tool-native id. [`OriginDescriptor`] is the raw form handed over
//! by the adapter; it is converted exactly once into [`ArtifactOrigin`], and
//! [`VirtualFileResolver`] turns that into a path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use url::Url;

use crate::error::{ReconcileError, ReconcileResult};

/// Prefix of the synthetic base marker that opens a relative segment list
pub const BASE_MARKER_PREFIX: &str = "${";

/// Normalized statement of where an output unit came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// The build tool reported no origin
    None,
    /// Plain filesystem path
    PlainFile { path: PathBuf },
    /// Virtual file identified by a base marker followed by path segments
    VirtualFileRelative { segments: Vec<String> },
    /// Virtual file identified by an absolute tool-native id
    VirtualFileAbsolute { id: String },
}

/// Raw origin descriptor as emitted by the build-tool adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginDescriptor {
    /// Shape tag: `none`, `file`, `virtual_relative` or `virtual_absolute`
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl OriginDescriptor {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: "file".into(),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn virtual_relative<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: "virtual_relative".into(),
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn virtual_absolute(id: impl Into<String>) -> Self {
        Self {
            kind: "virtual_absolute".into(),
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl TryFrom<&OriginDescriptor> for ArtifactOrigin {
    type Error = ReconcileError;

    fn try_from(desc: &OriginDescriptor) -> ReconcileResult<Self> {
        let origin = match (desc.kind.as_str(), &desc.path, &desc.names, &desc.id) {
            ("none", _, _, _) => ArtifactOrigin::None,
            ("file", Some(path), _, _) => ArtifactOrigin::PlainFile { path: path.clone() },
            ("virtual_relative", _, Some(names), _) => ArtifactOrigin::VirtualFileRelative {
                segments: names.clone(),
            },
            ("virtual_absolute", _, _, Some(id)) => {
                ArtifactOrigin::VirtualFileAbsolute { id: id.clone() }
            }
            ("file", None, _, _) => return Err(ReconcileError::unrecognized("file without path")),
            ("virtual_relative", _, None, _) => {
                return Err(ReconcileError::unrecognized("virtual_relative without names"))
            }
            ("virtual_absolute", _, _, None) => {
                return Err(ReconcileError::unrecognized("virtual_absolute without id"))
            }
            (other, _, _, _) => return Err(ReconcileError::unrecognized(other)),
        };
        Ok(origin)
    }
}

/// Resolves artifact origins to filesystem paths
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualFileResolver;

impl VirtualFileResolver {
    /// Resolve an origin to a path. `Ok(None)` means there is nothing to resolve.
    pub fn resolve(&self, origin: &ArtifactOrigin) -> ReconcileResult<Option<PathBuf>> {
        match origin {
            ArtifactOrigin::None => Ok(None),
            ArtifactOrigin::PlainFile { path } => Ok(Some(path.clone())),
            ArtifactOrigin::VirtualFileRelative { segments } => {
                Self::resolve_relative(segments).map(Some)
            }
            ArtifactOrigin::VirtualFileAbsolute { id } => Self::resolve_absolute(id).map(Some),
        }
    }

    /// Convert a raw descriptor and resolve it
    pub fn resolve_descriptor(&self, desc: &OriginDescriptor) -> ReconcileResult<Option<PathBuf>> {
        let origin = ArtifactOrigin::try_from(desc)?;
        self.resolve(&origin)
    }

    fn resolve_relative(segments: &[String]) -> ReconcileResult<PathBuf> {
        match segments.split_first() {
            Some((marker, rest)) if marker.starts_with(BASE_MARKER_PREFIX) => {
                let path: PathBuf = rest.iter().collect();
                trace!(%marker, path = %path.display(), "resolved relative virtual file");
                Ok(path)
            }
            _ => {
                warn!(?segments, "virtual file segments lack a base marker");
                Err(ReconcileError::MissingBaseMarker {
                    segments: segments.to_vec(),
                })
            }
        }
    }

    fn resolve_absolute(id: &str) -> ReconcileResult<PathBuf> {
        // `%`, `#` and `?` are path characters here, not URI syntax.
        let escaped = id
            .replace('%', "%25")
            .replace('#', "%23")
            .replace('?', "%3F");

        // Windows ids come without the leading slash (`C:/...`).
        let uri = if escaped.starts_with('/') {
            format!("file://{escaped}")
        } else {
            format!("file:///{escaped}")
        };

        let url = Url::parse(&uri).map_err(|e| ReconcileError::InvalidFileUri {
            id: id.to_string(),
            message: e.to_string(),
        })?;

        url.to_file_path()
            .map_err(|()| ReconcileError::NotAFilePath { uri: url.to_string() })
    }
}
