//! Reload cycle configuration

use serde::{Deserialize, Serialize};

/// Configuration for a reload cycle.
///
/// `Default` reads the environment:
/// - `RELOAD_REMAP_GENERATED` (default `true`)
/// - `RELOAD_LOG_TAIL_LINES` (default unset, scan whole logs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadConfig {
    /// Point diagnostics in generated units at the author-written file
    pub remap_generated: bool,
    /// Only scan the last N lines of each task log
    pub log_tail_lines: Option<usize>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            remap_generated: std::env::var("RELOAD_REMAP_GENERATED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            log_tail_lines: std::env::var("RELOAD_LOG_TAIL_LINES")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag("off"));
    }
}
