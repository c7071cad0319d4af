use crate::range::TextRange;
use crate::registry::Rule;
use crate::source_map::Location;

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hidden => "hidden",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

// Simplified version of:
// https://github.com/astral-sh/ruff/blob/main/crates/ruff_diagnostics/src/diagnostic.rs
//
// * kind is simply a Rule for our purposes.
// * the fix is computed on request from `range`, since it needs the
//   document's imports and not only the flagged text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Diagnostic {
    #[cfg_attr(feature = "serde", serde(rename = "id"))]
    pub kind: Rule,
    pub message: String,
    pub severity: Severity,
    /// Span of the flagged node. `None` when it does not map into source.
    pub range: Option<TextRange>,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub const fn is_fixable(&self) -> bool {
        self.kind.has_fix() && self.range.is_some()
    }
}
