//! Display strings for symbols, in the style of compiler error messages:
//! keyword types by keyword, other types namespace-qualified.
use super::{Compilation, MethodSymbol, TypeId, TypeKind};

impl Compilation {
    pub fn display_type(&self, ty: TypeId) -> String {
        let symbol = self.type_symbol(ty);
        match symbol.kind {
            TypeKind::Array(element) => format!("{}[]", self.display_type(element)),
            TypeKind::Nullable(underlying) => format!("{}?", self.display_type(underlying)),
            TypeKind::Class | TypeKind::Struct | TypeKind::Interface => symbol
                .special
                .and_then(|special| special.keyword())
                .map_or_else(|| symbol.metadata_name(), str::to_string),
        }
    }

    /// `int.ToString(System.IFormatProvider)`
    pub fn display_method(&self, method: &MethodSymbol) -> String {
        let parameters = method
            .parameters
            .iter()
            .map(|param| param.ty.map_or_else(|| "?".to_string(), |ty| self.display_type(ty)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}.{}({parameters})",
            self.display_type(method.containing),
            method.name
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Compilation, Reference, SpecialType};

    #[test]
    fn displays_like_error_messages() {
        let mut c = Compilation::new(&Reference::ALL);
        let int32 = c.special_type(SpecialType::Int32).unwrap();
        let date_time = c.special_type(SpecialType::DateTime).unwrap();

        let to_string = c
            .members_named(int32, "ToString")
            .filter_map(|(_, member)| member.as_method())
            .nth(2)
            .unwrap()
            .clone();
        assert_eq!(
            c.display_method(&to_string),
            "int.ToString(System.IFormatProvider)"
        );
        assert_eq!(c.display_type(date_time), "System.DateTime");

        let array = c.array_of(int32);
        let nullable = c.nullable_of(int32);
        assert_eq!(c.display_type(array), "int[]");
        assert_eq!(c.display_type(nullable), "int?");
    }
}
