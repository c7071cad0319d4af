use super::{Compilation, SpecialType, TypeId, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Identity,
    ImplicitNumeric,
    ImplicitNullable,
    NullLiteral,
    Boxing,
    ImplicitReference,
    ExplicitNumeric,
    Unboxing,
    ExplicitReference,
    /// No conversion between the types exists.
    NoConversion,
}

/// The conversion relation between an operand and a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    pub kind: ConversionKind,
}

impl Conversion {
    pub const fn new(kind: ConversionKind) -> Self {
        Self { kind }
    }

    pub const fn none() -> Self {
        Self::new(ConversionKind::NoConversion)
    }

    /// Whether the relation is a real, resolvable conversion.
    pub const fn exists(self) -> bool {
        !matches!(self.kind, ConversionKind::NoConversion)
    }

    pub const fn is_identity(self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }
}

// Implicit numeric conversions, by source type.
fn implicit_numeric_targets(from: SpecialType) -> &'static [SpecialType] {
    use SpecialType::{
        Byte, Char, Decimal, Double, Int16, Int32, Int64, SByte, Single, UInt16, UInt32, UInt64,
    };
    match from {
        SByte => &[Int16, Int32, Int64, Single, Double, Decimal],
        Byte => &[Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Int16 => &[Int32, Int64, Single, Double, Decimal],
        UInt16 => &[Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Int32 => &[Int64, Single, Double, Decimal],
        UInt32 => &[Int64, UInt64, Single, Double, Decimal],
        Int64 | UInt64 => &[Single, Double, Decimal],
        Char => &[UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Single => &[Double],
        _ => &[],
    }
}

impl Compilation {
    /// Classify the implicit conversion from `from` to `to`.
    ///
    /// `from == None` stands for the typeless `null` literal when
    /// `is_null_literal` is set, and for an unresolved operand otherwise.
    pub fn classify_implicit(
        &self,
        from: Option<TypeId>,
        is_null_literal: bool,
        to: TypeId,
    ) -> Conversion {
        let Some(from) = from else {
            let accepts_null = !self.is_value_type(to)
                || matches!(self.type_symbol(to).kind, TypeKind::Nullable(_));
            return if is_null_literal && accepts_null {
                Conversion::new(ConversionKind::NullLiteral)
            } else {
                Conversion::none()
            };
        };

        if from == to {
            return Conversion::new(ConversionKind::Identity);
        }

        let source = self.type_symbol(from);
        let target = self.type_symbol(to);

        if let (Some(s), Some(t)) = (source.special, target.special) {
            if implicit_numeric_targets(s).contains(&t) {
                return Conversion::new(ConversionKind::ImplicitNumeric);
            }
        }

        if let TypeKind::Nullable(underlying) = target.kind {
            let inner = self.classify_implicit(Some(from), false, underlying);
            if inner.exists() {
                return Conversion::new(ConversionKind::ImplicitNullable);
            }
        }

        let reaches_target = self.base_chain(from).any(|base| base == to)
            || self.all_interfaces(from).contains(&to)
            || (target.special == Some(SpecialType::Object)
                && source.kind == TypeKind::Interface);
        if reaches_target {
            return if self.is_value_type(from) {
                Conversion::new(ConversionKind::Boxing)
            } else {
                Conversion::new(ConversionKind::ImplicitReference)
            };
        }

        Conversion::none()
    }

    /// Classify a cast `(to)expr`: implicit conversions first, then the
    /// explicit ones.
    pub fn classify_explicit(
        &self,
        from: Option<TypeId>,
        is_null_literal: bool,
        to: TypeId,
    ) -> Conversion {
        let implicit = self.classify_implicit(from, is_null_literal, to);
        if implicit.exists() {
            return implicit;
        }
        let Some(from) = from else {
            return Conversion::none();
        };
        if self.is_numeric(from) && self.is_numeric(to) {
            return Conversion::new(ConversionKind::ExplicitNumeric);
        }
        // The reverse of an implicit reference or boxing conversion.
        match self.classify_implicit(Some(to), false, from).kind {
            ConversionKind::Boxing => Conversion::new(ConversionKind::Unboxing),
            ConversionKind::ImplicitReference => Conversion::new(ConversionKind::ExplicitReference),
            _ => Conversion::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;

    #[test]
    fn classifies_common_conversions() {
        let c = Compilation::new(&Reference::ALL);
        let ty = |s| c.special_type(s).unwrap();
        let int32 = ty(SpecialType::Int32);
        let object = ty(SpecialType::Object);
        let string = ty(SpecialType::String);
        let format_provider = c.type_by_metadata_name("System.IFormatProvider").unwrap();
        let culture = c
            .type_by_metadata_name("System.Globalization.CultureInfo")
            .unwrap();

        let kind = |from, to| c.classify_implicit(Some(from), false, to).kind;
        assert_eq!(kind(int32, int32), ConversionKind::Identity);
        assert_eq!(kind(int32, object), ConversionKind::Boxing);
        assert_eq!(kind(string, object), ConversionKind::ImplicitReference);
        assert_eq!(kind(int32, ty(SpecialType::Int64)), ConversionKind::ImplicitNumeric);
        assert_eq!(kind(culture, format_provider), ConversionKind::ImplicitReference);
        assert_eq!(kind(int32, string), ConversionKind::NoConversion);
        assert_eq!(
            c.classify_implicit(None, true, string).kind,
            ConversionKind::NullLiteral
        );
        assert!(!c.classify_implicit(None, false, object).exists());
        assert_eq!(
            c.classify_explicit(Some(object), false, int32).kind,
            ConversionKind::Unboxing
        );
    }
}
