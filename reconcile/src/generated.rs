//! Generated source detection
//!
//! Template and routes compilers emit intermediate source files that the
//! build tool compiles like any other. Each generator leaves a marker in the
//! generated file naming the author-written source and how its lines map
//! back. [`GeneratedSourceMapper`] reads those markers so reload errors and
//! "edit this file" links can point at what the developer actually wrote.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Delimiter of the template compiler's metadata block
pub const TEMPLATE_MARKER: &str = "-- GENERATED --";

static TEMPLATE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*SOURCE:[ \t]*(.+?)\s*$").unwrap());

static TEMPLATE_MATRIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*MATRIX:[ \t]*([^\r\n]*?)[ \t]*\r?$").unwrap());

static TEMPLATE_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*LINES:[ \t]*([^\r\n]*?)[ \t]*\r?$").unwrap());

static ROUTES_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*//[ \t]*@SOURCE:[ \t]*(.+?)\s*$").unwrap());

static ROUTES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*//\s*@LINE:\s*(\d+)\s*$").unwrap());

/// Access to file content for marker inspection
pub trait SourceReader {
    /// Read the file as text. `None` if it cannot be read.
    fn read_source(&self, path: &Path) -> Option<String>;
}

/// Reads sources from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_source(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

impl SourceReader for HashMap<PathBuf, String> {
    fn read_source(&self, path: &Path) -> Option<String> {
        self.get(path).cloned()
    }
}

impl<R: SourceReader + ?Sized> SourceReader for &R {
    fn read_source(&self, path: &Path) -> Option<String> {
        (**self).read_source(path)
    }
}

/// A generated intermediate and the author file it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "generator", rename_all = "snake_case")]
pub enum GeneratedSource {
    /// Template compiler output
    Template {
        source: PathBuf,
        /// (generated offset, source offset), sorted by generated offset
        matrix: Vec<(u32, u32)>,
        /// (generated line, source line), sorted by generated line
        lines: Vec<(u32, u32)>,
    },
    /// Routes compiler output
    Routes {
        source: PathBuf,
        /// (generated line, source line) for every `@LINE` marker
        line_markers: Vec<(u32, u32)>,
    },
}

impl GeneratedSource {
    /// Parse generator markers out of file content
    pub fn parse(content: &str) -> Option<Self> {
        match content.find(TEMPLATE_MARKER) {
            // Metadata lines only count inside the generated block.
            Some(start) => Self::parse_template(&content[start..]),
            None => Self::parse_routes(content),
        }
    }

    fn parse_template(block: &str) -> Option<Self> {
        let source = TEMPLATE_SOURCE.captures(block)?.get(1)?.as_str();
        let table = |re: &Regex| {
            re.captures(block)
                .and_then(|c| c.get(1))
                .map(|m| parse_mapping(m.as_str()))
                .unwrap_or_default()
        };

        Some(Self::Template {
            source: PathBuf::from(source),
            matrix: table(&*TEMPLATE_MATRIX),
            lines: table(&*TEMPLATE_LINES),
        })
    }

    fn parse_routes(content: &str) -> Option<Self> {
        let source = ROUTES_SOURCE.captures(content)?.get(1)?.as_str();
        let line_markers = content
            .lines()
            .zip(1u32..)
            .filter_map(|(line, number)| {
                let marker = ROUTES_LINE.captures(line)?.get(1)?.as_str().parse().ok()?;
                Some((number, marker))
            })
            .collect();

        Some(Self::Routes {
            source: PathBuf::from(source),
            line_markers,
        })
    }

    /// Author-written file this unit was generated from
    pub fn source(&self) -> &Path {
        match self {
            Self::Template { source, .. } | Self::Routes { source, .. } => source,
        }
    }

    /// Translate a 1-based line of the generated file to the author file
    pub fn map_line(&self, generated_line: u32) -> Option<u32> {
        match self {
            Self::Template { lines, .. } => lookup(lines, generated_line),
            Self::Routes { line_markers, .. } => lookup(line_markers, generated_line),
        }
    }

    /// Translate a character offset of the generated file to the author file
    pub fn map_offset(&self, generated_offset: u32) -> Option<u32> {
        match self {
            Self::Template { matrix, .. } => lookup(matrix, generated_offset),
            Self::Routes { .. } => None,
        }
    }
}

/// Parse `12->1|40->3` tables, skipping malformed entries
fn parse_mapping(raw: &str) -> Vec<(u32, u32)> {
    let mut pairs: Vec<(u32, u32)> = raw
        .split('|')
        .filter_map(|pair| {
            let (generated, source) = pair.split_once("->")?;
            Some((generated.trim().parse().ok()?, source.trim().parse().ok()?))
        })
        .collect();
    pairs.sort_by_key(|&(generated, _)| generated);
    pairs
}

/// Value of the last entry whose key is at or before `key`
fn lookup(table: &[(u32, u32)], key: u32) -> Option<u32> {
    table
        .iter()
        .take_while(|&&(generated, _)| generated <= key)
        .last()
        .map(|&(_, source)| source)
}

/// Recovers author-written files from generated intermediates
#[derive(Debug, Clone, Default)]
pub struct GeneratedSourceMapper<R = FsSourceReader> {
    reader: R,
}

impl<R: SourceReader> GeneratedSourceMapper<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read generator metadata for `path`, if it is a generated unit
    pub fn inspect(&self, path: &Path) -> Option<GeneratedSource> {
        let content = self.reader.read_source(path)?;
        let generated = GeneratedSource::parse(&content)?;
        trace!(
            generated = %path.display(),
            source = %generated.source().display(),
            "found generated source marker"
        );
        Some(generated)
    }

    /// Author-written file for `path`, or `None` if `path` is not generated
    pub fn unwrap(&self, path: &Path) -> Option<PathBuf> {
        self.inspect(path).map(|g| g.source().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"
package views.html

object index extends BaseScalaTemplate {
  def apply(message: String) = {
    _display_(Seq(format.raw("<h1>"), _display_(message)))
  }
}

/*
                  -- GENERATED --
                  SOURCE: app/views/index.scala.html
                  HASH: 5d3a1b
                  MATRIX: 560->1|656->20|690->54
                  LINES: 14->1|19->2|20->4
                  -- GENERATED --
              */
"#;

    const ROUTES: &str = "// @GENERATOR:play-routes-compiler
// @SOURCE:conf/routes

package router

class Routes {
  // @LINE:6
  private lazy val home = Route(\"GET\", \"/\")

  // @LINE:9
  private lazy val assets = Route(\"GET\", \"/assets\")
}
";

    #[test]
    fn test_parse_template_metadata() {
        let generated = GeneratedSource::parse(TEMPLATE).unwrap();
        assert_eq!(generated.source(), Path::new("app/views/index.scala.html"));
        assert_eq!(generated.map_line(19), Some(2));
        assert_eq!(generated.map_line(25), Some(4));
        assert_eq!(generated.map_line(3), None);
        assert_eq!(generated.map_offset(660), Some(20));
    }

    #[test]
    fn test_parse_routes_metadata() {
        let generated = GeneratedSource::parse(ROUTES).unwrap();
        assert_eq!(generated.source(), Path::new("conf/routes"));
        // `// @LINE:6` is line 7 of the generated file
        assert_eq!(generated.map_line(8), Some(6));
        assert_eq!(generated.map_line(11), Some(9));
        assert_eq!(generated.map_line(2), None);
        assert_eq!(generated.map_offset(10), None);
    }

    #[test]
    fn test_template_metadata_read_from_generated_block() {
        let content = format!(
            "object index {{\n  val help = \"\"\"\nSOURCE: not/this.html\nLINES: 1->99\n\"\"\"\n}}\n{}",
            TEMPLATE
        );
        let generated = GeneratedSource::parse(&content).unwrap();
        assert_eq!(generated.source(), Path::new("app/views/index.scala.html"));
        assert_eq!(generated.map_line(19), Some(2));
    }

    #[test]
    fn test_plain_source_is_not_generated() {
        let content = "package controllers\n\nclass Home {}\n";
        assert!(GeneratedSource::parse(content).is_none());
    }

    #[test]
    fn test_malformed_mapping_entries_skipped() {
        assert_eq!(parse_mapping("5->1|x->2|9->|20->4"), vec![(5, 1), (20, 4)]);
        assert!(parse_mapping("").is_empty());
    }

    #[test]
    fn test_mapper_unwrap() {
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from("target/views/html/index.template.scala"),
            TEMPLATE.to_string(),
        );
        files.insert(PathBuf::from("app/Home.scala"), "class Home".to_string());

        let mapper = GeneratedSourceMapper::new(files);
        assert_eq!(
            mapper.unwrap(Path::new("target/views/html/index.template.scala")),
            Some(PathBuf::from("app/views/index.scala.html"))
        );
        assert_eq!(mapper.unwrap(Path::new("app/Home.scala")), None);
        assert_eq!(mapper.unwrap(Path::new("missing.scala")), None);
    }
}
