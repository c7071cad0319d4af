//! Process-wide, read-only registry of host capabilities.
use std::sync::{Arc, OnceLock};

use super::imports::{ImportInserter, UsingDirectiveInserter};

static REGISTRY: OnceLock<CapabilityRegistry> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    pub import_inserter: Arc<dyn ImportInserter>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self {
            import_inserter: Arc::new(UsingDirectiveInserter),
        }
    }
}

impl CapabilityRegistry {
    /// Install the process-wide registry. The first installation wins; a
    /// later one gets its registry back.
    pub fn install(registry: Self) -> Result<(), Self> {
        REGISTRY.set(registry)
    }

    /// The installed registry, or the default one on first use.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::default)
    }

    pub fn import_inserter() -> Arc<dyn ImportInserter> {
        Arc::clone(&Self::global().import_inserter)
    }
}
