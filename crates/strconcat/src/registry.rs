use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::diagnostic::Severity;

#[derive(EnumIter, IntoStaticStr, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rule {
    StringConcatConversion,
}

/// Static metadata a host shows for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Positional placeholders `{0}`, `{1}`, ...
    pub message_format: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
    pub description: &'static str,
}

impl Rule {
    pub const fn has_fix(&self) -> bool {
        matches!(self, Self::StringConcatConversion)
    }

    /// Title of the fix, which is also its equivalence key.
    pub const fn fix_title(&self) -> Option<&'static str> {
        match self {
            Self::StringConcatConversion => Some("Call ToString(CultureInfo.InvariantCulture)"),
        }
    }

    pub const fn descriptor(&self) -> RuleDescriptor {
        match self {
            Self::StringConcatConversion => RuleDescriptor {
                id: "StringConcatConversion",
                title: "Culture-sensitive conversion in string concatenation",
                message_format: "Call method '{0}' on type '{1}'.",
                category: "Globalization",
                default_severity: Severity::Warning,
                enabled_by_default: true,
                description: "Concatenating a value with a string converts it with the \
                              current culture. Call ToString with an explicit format \
                              provider instead.",
            },
        }
    }
}

/// Get the code from the name:
/// "StringConcatConversion" => "SCC"
fn name_to_code(name: &str) -> String {
    name.chars().filter(|c| c.is_uppercase()).collect()
}

/// Get the rule from the code:
/// "SCC" => `Rule::StringConcatConversion`
pub fn code_to_rule(code: &str) -> Option<Rule> {
    Rule::iter().find(|rule| {
        let name: &'static str = rule.into();
        name_to_code(name) == code
    })
}

/// Get the name from the rule:
/// `Rule::StringConcatConversion` => "StringConcatConversion"
pub fn rule_to_name(rule: Rule) -> &'static str {
    rule.into()
}

/// Get the code from the rule:
/// `Rule::StringConcatConversion` => "SCC"
pub fn rule_to_code(rule: Rule) -> String {
    name_to_code(rule_to_name(rule))
}

impl std::str::FromStr for Rule {
    type Err = String;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        code_to_rule(code).ok_or_else(|| format!("Unknown rule code: {code}"))
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", rule_to_code(*self))
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", rule_to_name(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converters() {
        let name = "StringConcatConversion";
        let code = "SCC";
        let rule = Rule::StringConcatConversion;

        assert_eq!(name_to_code(name), code);
        assert_eq!(code_to_rule(code), Some(rule));
        assert_eq!(rule_to_name(rule), name);
        assert_eq!(rule_to_code(rule), code);
        assert_eq!(code_to_rule("XYZ"), None);
    }

    #[test]
    fn descriptor_id_is_the_rule_name() {
        for rule in Rule::iter() {
            let descriptor = rule.descriptor();
            assert_eq!(descriptor.id, rule_to_name(rule));
            assert_eq!(descriptor.default_severity, Severity::Warning);
            assert_eq!(rule.has_fix(), rule.fix_title().is_some());
        }
    }
}
