//! Decides whether an implicit conversion is a culture-sensitive
//! concatenation operand, and which `ToString` overload replaces it.
use tracing::trace;

use crate::bind::{BoundUnit, OperationId, OperationKind};
use crate::model::{Compilation, Member, MemberRef, SpecialType, TypeId};
use crate::syntax::ast::BinaryOp;

pub const FORMAT_PROVIDER: &str = "System.IFormatProvider";
pub const CULTURE_INFO: &str = "System.Globalization.CultureInfo";
pub const OBSOLETE_ATTRIBUTE: &str = "System.ObsoleteAttribute";

/// The types the rule relies on, resolved once per compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: TypeId,
    pub string: TypeId,
    pub format_provider: TypeId,
    pub culture_info: TypeId,
    pub invariant_culture: MemberRef,
    /// Missing only in unusual core libraries; nothing is deprecated then.
    pub obsolete_attribute: Option<TypeId>,
}

impl WellKnownTypes {
    /// `None` when the format provider, the culture type or its invariant
    /// culture property is missing, which disables the rule.
    pub fn resolve(compilation: &Compilation) -> Option<Self> {
        let format_provider = compilation.type_by_metadata_name(FORMAT_PROVIDER)?;
        let culture_info = compilation.type_by_metadata_name(CULTURE_INFO)?;
        let (invariant_culture, _) = compilation
            .members_named(culture_info, "InvariantCulture")
            .find(|(_, member)| matches!(member, Member::Property(_)))?;
        Some(Self {
            object: compilation.special_type(SpecialType::Object)?,
            string: compilation.special_type(SpecialType::String)?,
            format_provider,
            culture_info,
            invariant_culture,
            obsolete_attribute: compilation.type_by_metadata_name(OBSOLETE_ATTRIBUTE),
        })
    }
}

/// A qualifying conversion and the overload that formats its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionMatch {
    pub method: MemberRef,
    /// Simple metadata name of the operand type, e.g. `Int32`.
    pub operand_type_name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionMatcher<'c> {
    compilation: &'c Compilation,
    types: WellKnownTypes,
}

impl<'c> ConversionMatcher<'c> {
    pub fn new(compilation: &'c Compilation) -> Option<Self> {
        WellKnownTypes::resolve(compilation).map(|types| Self { compilation, types })
    }

    pub const fn types(&self) -> &WellKnownTypes {
        &self.types
    }

    /// Match the conversion `node` of `unit`.
    pub fn matches(&self, unit: &BoundUnit, node: OperationId) -> Option<ConversionMatch> {
        let conversion = unit.get(node);
        let OperationKind::Conversion {
            operand,
            conversion: relation,
        } = &conversion.kind
        else {
            return None;
        };
        if !conversion.is_implicit || !relation.exists() {
            return None;
        }
        let target = conversion.ty?;
        if target != self.types.object && target != self.types.string {
            return None;
        }
        if !self.in_string_concatenation(unit, node) {
            return None;
        }

        let operand_type = unit.get(*operand).ty?;
        let method = self.explicit_conversion_method(operand_type)?;
        Some(ConversionMatch {
            method,
            operand_type_name: self.compilation.type_symbol(operand_type).name.clone(),
        })
    }

    /// The parent is a string-typed `+` or `+=`.
    fn in_string_concatenation(&self, unit: &BoundUnit, node: OperationId) -> bool {
        let Some(parent) = unit.parent(node) else {
            return false;
        };
        let is_add = match parent.kind {
            OperationKind::Binary { operator, .. }
            | OperationKind::CompoundAssignment { operator, .. } => operator == BinaryOp::Add,
            _ => return false,
        };
        is_add && parent.ty == Some(self.types.string)
    }

    fn is_obsolete(&self, member: &Member) -> bool {
        let Some(obsolete) = self.types.obsolete_attribute else {
            return false;
        };
        member.as_method().is_some_and(|method| {
            method
                .attributes
                .iter()
                .any(|attribute| attribute.class == Some(obsolete))
        })
    }

    /// First non-deprecated `ToString(IFormatProvider)` in member lookup
    /// order.
    pub fn explicit_conversion_method(&self, operand_type: TypeId) -> Option<MemberRef> {
        let found = self
            .compilation
            .members_named(operand_type, "ToString")
            .filter(|(_, member)| !self.is_obsolete(member))
            .find_map(|(member_ref, member)| {
                let method = member.as_method()?;
                let [parameter] = method.parameters.as_slice() else {
                    return None;
                };
                (parameter.ty == Some(self.types.format_provider)).then_some(member_ref)
            });
        if found.is_none() {
            trace!(
                ty = %self.compilation.display_type(operand_type),
                "no ToString(IFormatProvider) overload"
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;
    use crate::project::{Document, Snapshot};

    fn snapshot(text: &str) -> Snapshot {
        Snapshot::standalone(&Reference::ALL, Document::parse("Test0.cs", text).unwrap())
    }

    fn matches(text: &str) -> Vec<String> {
        let snapshot = snapshot(text);
        let matcher = ConversionMatcher::new(&snapshot.compilation).unwrap();
        snapshot
            .unit
            .conversions()
            .filter_map(|node| matcher.matches(&snapshot.unit, node))
            .map(|found| {
                let method = snapshot.compilation.member(found.method);
                format!(
                    "{} {}",
                    snapshot.compilation.display_method(method.as_method().unwrap()),
                    found.operand_type_name
                )
            })
            .collect()
    }

    #[test]
    fn concatenated_int_matches() {
        let found = matches(r#"class P { string M(int val) { return "hi: " + val; } }"#);
        assert_eq!(found, ["int.ToString(System.IFormatProvider) Int32"]);
    }

    #[test]
    fn both_sides_and_compound_assignment() {
        let found = matches(
            r#"class P { void M(double d, long n) { string s = d + "x"; s += n; } }"#,
        );
        assert_eq!(
            found,
            [
                "double.ToString(System.IFormatProvider) Double",
                "long.ToString(System.IFormatProvider) Int64",
            ]
        );
    }

    #[test]
    fn other_parents_do_not_match() {
        let text = r#"
using System;
class P {
    void M(int val) {
        object o = val;
        Console.WriteLine(val);
        string s = string.Format("{0}", val);
        int sum = val + 1;
    }
}"#;
        assert!(matches(text).is_empty());
    }

    #[test]
    fn types_without_format_provider_overload() {
        let text = r#"
using System;
class P {
    string M(Guid id, object o, P p) { return "a" + id + o + p; }
}"#;
        assert!(matches(text).is_empty());
    }

    #[test]
    fn deprecated_overloads_are_skipped() {
        let text = r#"
using System;
struct Money {
    [Obsolete("use Format")]
    public string ToString(IFormatProvider provider) { return ""; }
}
struct Weight {
    [Obsolete]
    public string ToString(IFormatProvider provider) { return ""; }
    public string ToString(string format) { return format; }
}
class P {
    string M(Money m, Weight w) { return "a" + m + w; }
}"#;
        assert!(matches(text).is_empty());
    }

    #[test]
    fn source_types_with_format_provider_overload() {
        let text = r#"
using System;
namespace Shop {
    struct Money {
        public string ToString(string format, IFormatProvider provider) { return format; }
        public string ToString(IFormatProvider provider) { return ""; }
    }
    class P {
        string M(Money m) { return "total: " + m; }
    }
}"#;
        assert_eq!(
            matches(text),
            ["Shop.Money.ToString(System.IFormatProvider) Money"]
        );
    }

    #[test]
    fn inherited_overloads_are_found() {
        let text = r#"
using System;
class Base { public string ToString(IFormatProvider provider) { return ""; } }
class Derived : Base { }
class P { string M(Derived d) { return "d" + d; } }"#;
        assert_eq!(
            matches(text),
            ["Base.ToString(System.IFormatProvider) Derived"]
        );
    }

    #[test]
    fn derived_overload_is_chosen_over_the_base_one() {
        let text = r#"
using System;
class Base { public string ToString(IFormatProvider provider) { return "base"; } }
class Derived : Base { public string ToString(IFormatProvider provider) { return "derived"; } }
class P { string M(Derived d, Base b) { return "d" + d + b; } }"#;
        assert_eq!(
            matches(text),
            [
                "Derived.ToString(System.IFormatProvider) Derived",
                "Base.ToString(System.IFormatProvider) Base",
            ]
        );
    }

    #[test]
    fn missing_culture_type_disables_the_rule() {
        let document = Document::parse("Test0.cs", "class P { }").unwrap();
        let snapshot = Snapshot::standalone(&[Reference::Core], document);
        assert!(ConversionMatcher::new(&snapshot.compilation).is_none());
    }
}
