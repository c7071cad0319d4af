use strum::IntoEnumIterator;

use crate::model::Reference;
use crate::registry::Rule;

/// What a check or fix run looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rules: Vec<Rule>,
    /// Also analyze generated documents.
    pub include_generated: bool,
    /// Reference libraries the project compiles against.
    pub references: Vec<Reference>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: Rule::iter()
                .filter(|rule| rule.descriptor().enabled_by_default)
                .collect(),
            include_generated: false,
            references: Reference::ALL.to_vec(),
        }
    }
}

impl Settings {
    pub fn is_enabled(&self, rule: Rule) -> bool {
        self.rules.contains(&rule)
    }
}
