//! Rewrites a flagged conversion to invariant formatting.
pub mod capabilities;
pub mod imports;
pub mod rewriter;
pub mod session;

pub use capabilities::CapabilityRegistry;
pub use imports::{
    ImportInserter, ImportOutcome, ImportRequest, NoopImportInserter, UsingDirectiveInserter,
    ensure_import, is_in_scope, resolve_import,
};
pub use rewriter::{ConversionFixer, GLOBALIZATION_NAMESPACE};
pub use session::EditSession;
