//! Binding: from syntax trees to a typed [`Compilation`] and one
//! [`BoundUnit`] of operations per document.
mod body;
mod declare;
pub mod operation;
mod scope;

use tracing::debug;

use crate::model::{Compilation, Reference};
use crate::syntax::SyntaxTree;

pub use operation::{BoundUnit, Operation, OperationId, OperationKind, SyntaxRef};

/// Bind the documents of a project, given as `(text, tree)` pairs, against
/// `references`. Units are returned in document order.
pub fn bind_project(
    references: &[Reference],
    documents: &[(&str, &SyntaxTree)],
) -> (Compilation, Vec<BoundUnit>) {
    let mut compilation = Compilation::new(references);
    let trees: Vec<&SyntaxTree> = documents.iter().map(|(_, tree)| *tree).collect();
    let declared = declare::declare_types(&mut compilation, &trees);
    debug!(
        documents = documents.len(),
        types = declared.len(),
        "declared source types"
    );

    let mut units = vec![BoundUnit::default(); documents.len()];
    for declaration in &declared {
        let (text, _) = documents[declaration.document];
        body::bind_bodies(
            &mut compilation,
            &mut units[declaration.document],
            text,
            declaration,
        );
    }
    (compilation, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversionKind, SpecialType};
    use crate::syntax::ast::BinaryOp;
    use crate::syntax::parse;

    fn bind_one(text: &str) -> (Compilation, BoundUnit) {
        let tree = parse(text).unwrap();
        let (compilation, mut units) = bind_project(&Reference::ALL, &[(text, &tree)]);
        (compilation, units.remove(0))
    }

    fn implicit_conversions(unit: &BoundUnit) -> Vec<OperationId> {
        unit.conversions()
            .filter(|id| unit.get(*id).is_implicit)
            .collect()
    }

    fn kind_of(unit: &BoundUnit, id: OperationId) -> ConversionKind {
        match &unit.get(id).kind {
            OperationKind::Conversion { conversion, .. } => conversion.kind,
            other => panic!("not a conversion: {other:?}"),
        }
    }

    #[test]
    fn concatenation_boxes_value_operands() {
        let text = r#"class C { string M(int val) { return "hi: " + val; } }"#;
        let (compilation, unit) = bind_one(text);
        let conversions = implicit_conversions(&unit);
        assert_eq!(conversions.len(), 1);

        let conversion = unit.get(conversions[0]);
        assert_eq!(kind_of(&unit, conversions[0]), ConversionKind::Boxing);
        assert_eq!(&text[conversion.syntax.range], "val");
        assert_eq!(conversion.ty, compilation.special_type(SpecialType::Object));

        let parent = unit.parent(conversions[0]).unwrap();
        assert!(matches!(
            parent.kind,
            OperationKind::Binary {
                operator: BinaryOp::Add,
                ..
            }
        ));
        assert_eq!(parent.ty, compilation.special_type(SpecialType::String));
    }

    #[test]
    fn compound_concatenation_converts_the_value() {
        let text = r#"class C { void M(int val) { string s = "a"; s += val; } }"#;
        let (_, unit) = bind_one(text);
        let conversions = implicit_conversions(&unit);
        assert_eq!(conversions.len(), 1);
        assert!(matches!(
            unit.parent(conversions[0]).unwrap().kind,
            OperationKind::CompoundAssignment {
                operator: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn explicit_casts_and_strings_need_no_implicit_conversion() {
        let text = r#"class C { string M(int val) { return "a" + (object)val + val.ToString(); } }"#;
        let (_, unit) = bind_one(text);
        assert!(implicit_conversions(&unit).is_empty());
        assert_eq!(unit.conversions().count(), 1);
    }

    #[test]
    fn parenthesized_operands_keep_their_parentheses() {
        let text = r#"class C { string M(int val) { return "a" + (val + 1); } }"#;
        let (_, unit) = bind_one(text);
        let conversions = implicit_conversions(&unit);
        assert_eq!(conversions.len(), 1);
        assert_eq!(&text[unit.get(conversions[0]).syntax.range], "(val + 1)");
    }

    #[test]
    fn null_and_numeric_operands() {
        let text = r#"class C { void M(int val) { string s = "a" + null; long n = val + 1L; } }"#;
        let (_, unit) = bind_one(text);
        let kinds: Vec<_> = implicit_conversions(&unit)
            .into_iter()
            .map(|id| kind_of(&unit, id))
            .collect();
        assert_eq!(
            kinds,
            [ConversionKind::NullLiteral, ConversionKind::ImplicitNumeric]
        );
    }

    #[test]
    fn partial_types_span_documents() {
        let first = "partial class C { int count; }";
        let second = r#"partial class C { string M() { return "n" + count; } }"#;
        let (a, b) = (parse(first).unwrap(), parse(second).unwrap());
        let (_, units) = bind_project(&Reference::ALL, &[(first, &a), (second, &b)]);
        assert!(implicit_conversions(&units[0]).is_empty());
        let conversions = implicit_conversions(&units[1]);
        assert_eq!(conversions.len(), 1);
        let OperationKind::Conversion { operand, .. } = unit_kind(&units[1], conversions[0]) else {
            unreachable!();
        };
        assert!(matches!(
            units[1].get(operand).kind,
            OperationKind::FieldReference { .. }
        ));
    }

    fn unit_kind(unit: &BoundUnit, id: OperationId) -> OperationKind {
        unit.get(id).kind.clone()
    }

    #[test]
    fn unresolved_operands_have_no_conversion() {
        let text = r#"class C { string M() { return "a" + missing; } }"#;
        let (_, unit) = bind_one(text);
        let conversions = implicit_conversions(&unit);
        assert_eq!(conversions.len(), 1);
        assert_eq!(kind_of(&unit, conversions[0]), ConversionKind::NoConversion);
    }
}
