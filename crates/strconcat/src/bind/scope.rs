//! Name lookup: namespaces, using directives and type syntax.
use crate::model::{Compilation, SpecialType, TypeId};
use crate::syntax::ast::{Ident, PredefinedType, QualifiedName, TypeSyntax, UsingDirective};

/// What a (possibly qualified) name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NameTarget {
    Type(TypeId),
    Namespace(String),
}

/// Names visible at some point of a document.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    /// Enclosing namespaces, innermost first, ending with the global one.
    namespaces: Vec<String>,
    usings: Vec<String>,
    aliases: Vec<(String, String)>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            namespaces: vec![String::new()],
            usings: Vec::new(),
            aliases: Vec::new(),
        }
    }
}

pub(crate) const fn special_for(predefined: PredefinedType) -> SpecialType {
    match predefined {
        PredefinedType::Object => SpecialType::Object,
        PredefinedType::String => SpecialType::String,
        PredefinedType::Bool => SpecialType::Boolean,
        PredefinedType::Char => SpecialType::Char,
        PredefinedType::SByte => SpecialType::SByte,
        PredefinedType::Byte => SpecialType::Byte,
        PredefinedType::Short => SpecialType::Int16,
        PredefinedType::UShort => SpecialType::UInt16,
        PredefinedType::Int => SpecialType::Int32,
        PredefinedType::UInt => SpecialType::UInt32,
        PredefinedType::Long => SpecialType::Int64,
        PredefinedType::ULong => SpecialType::UInt64,
        PredefinedType::Float => SpecialType::Single,
        PredefinedType::Double => SpecialType::Double,
        PredefinedType::Decimal => SpecialType::Decimal,
        PredefinedType::Void => SpecialType::Void,
    }
}

fn join(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

impl Scope {
    /// Add the effect of `usings` to this scope.
    pub(crate) fn with_usings<'u>(&self, usings: impl IntoIterator<Item = &'u UsingDirective>) -> Self {
        let mut scope = self.clone();
        for using in usings {
            match &using.alias {
                Some(alias) => scope.aliases.push((alias.name.clone(), using.name.dotted())),
                None if !using.is_static => scope.usings.push(using.name.dotted()),
                None => {}
            }
        }
        scope
    }

    /// The scope inside `namespace name { ... }` declared here.
    pub(crate) fn enter_namespace(&self, name: &QualifiedName) -> Self {
        let qualified = join(self.current_namespace(), &name.dotted());
        let mut namespaces: Vec<String> = std::iter::successors(Some(qualified.as_str()), |ns| {
            ns.rsplit_once('.').map(|(parent, _)| parent)
        })
        .map(str::to_string)
        .collect();
        namespaces.push(String::new());
        Self {
            namespaces,
            usings: self.usings.clone(),
            aliases: self.aliases.clone(),
        }
    }

    pub(crate) fn current_namespace(&self) -> &str {
        self.namespaces.first().map_or("", String::as_str)
    }

    fn lookup_dotted(compilation: &Compilation, dotted: &str) -> Option<NameTarget> {
        if let Some(ty) = compilation.type_by_metadata_name(dotted) {
            Some(NameTarget::Type(ty))
        } else if compilation.is_namespace(dotted) {
            Some(NameTarget::Namespace(dotted.to_string()))
        } else {
            None
        }
    }

    /// Resolve a simple name: enclosing namespaces, then aliases, then the
    /// namespaces brought in by usings.
    pub(crate) fn resolve_name(&self, compilation: &Compilation, name: &str) -> Option<NameTarget> {
        let in_enclosing = self
            .namespaces
            .iter()
            .find_map(|ns| compilation.type_by_metadata_name(&join(ns, name)));
        if let Some(ty) = in_enclosing {
            return Some(NameTarget::Type(ty));
        }
        if let Some((_, target)) = self.aliases.iter().find(|(alias, _)| alias == name) {
            return Self::lookup_dotted(compilation, target);
        }
        let imported = self
            .usings
            .iter()
            .find_map(|ns| compilation.type_by_metadata_name(&join(ns, name)));
        if let Some(ty) = imported {
            return Some(NameTarget::Type(ty));
        }
        self.namespaces
            .iter()
            .map(|ns| join(ns, name))
            .find(|full| compilation.is_namespace(full))
            .map(NameTarget::Namespace)
    }

    /// `target.name`, where `target` is a namespace.
    pub(crate) fn resolve_member(
        compilation: &Compilation,
        target: &NameTarget,
        name: &str,
    ) -> Option<NameTarget> {
        match target {
            NameTarget::Namespace(ns) => Self::lookup_dotted(compilation, &join(ns, name)),
            NameTarget::Type(_) => None,
        }
    }

    pub(crate) fn resolve_qualified(
        &self,
        compilation: &Compilation,
        name: &QualifiedName,
    ) -> Option<NameTarget> {
        let (first, rest) = name.parts.split_first()?;
        let mut target = if name.global {
            Self::lookup_dotted(compilation, &first.name)?
        } else {
            self.resolve_name(compilation, &first.name)?
        };
        for part in rest {
            target = Self::resolve_member(compilation, &target, &part.name)?;
        }
        Some(target)
    }

    pub(crate) fn resolve_type(
        &self,
        compilation: &mut Compilation,
        syntax: &TypeSyntax,
    ) -> Option<TypeId> {
        match syntax {
            TypeSyntax::Predefined(predefined, _) => {
                compilation.special_type(special_for(*predefined))
            }
            TypeSyntax::Named(name) => match self.resolve_qualified(compilation, name)? {
                NameTarget::Type(ty) => Some(ty),
                NameTarget::Namespace(_) => None,
            },
            TypeSyntax::Nullable(inner, _) => {
                let underlying = self.resolve_type(compilation, inner)?;
                // `T?` on a reference type is only an annotation.
                Some(if compilation.is_value_type(underlying) {
                    compilation.nullable_of(underlying)
                } else {
                    underlying
                })
            }
            TypeSyntax::Array(element, _) => {
                let element = self.resolve_type(compilation, element)?;
                Some(compilation.array_of(element))
            }
            TypeSyntax::Implicit(_) => None,
        }
    }

    /// Resolve an attribute name, trying `Name` and then `NameAttribute`.
    pub(crate) fn resolve_attribute(
        &self,
        compilation: &Compilation,
        name: &QualifiedName,
    ) -> Option<TypeId> {
        let as_type = |name: &QualifiedName| match self.resolve_qualified(compilation, name) {
            Some(NameTarget::Type(ty)) => Some(ty),
            _ => None,
        };
        as_type(name).or_else(|| {
            let mut suffixed = name.clone();
            let last = suffixed.parts.last_mut()?;
            *last = Ident {
                name: format!("{}Attribute", last.name),
                range: last.range,
            };
            as_type(&suffixed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;
    use crate::syntax::parse;

    fn scope_of(text: &str) -> Scope {
        let tree = parse(text).unwrap();
        Scope::default().with_usings(&tree.unit().usings)
    }

    #[test]
    fn resolves_through_usings_and_aliases() {
        let compilation = Compilation::new(&Reference::ALL);
        let culture = compilation
            .type_by_metadata_name("System.Globalization.CultureInfo")
            .unwrap();

        let scope = scope_of("using System.Globalization;");
        assert_eq!(
            scope.resolve_name(&compilation, "CultureInfo"),
            Some(NameTarget::Type(culture))
        );

        let scope = scope_of("using G = System.Globalization;");
        let target = scope.resolve_name(&compilation, "G").unwrap();
        assert_eq!(target, NameTarget::Namespace("System.Globalization".into()));
        assert_eq!(
            Scope::resolve_member(&compilation, &target, "CultureInfo"),
            Some(NameTarget::Type(culture))
        );

        assert_eq!(scope_of("").resolve_name(&compilation, "CultureInfo"), None);
    }

    #[test]
    fn enclosing_namespaces_are_searched() {
        let compilation = Compilation::new(&Reference::ALL);
        let tree = parse("namespace System.Globalization.Extra { }").unwrap();
        let crate::syntax::ast::NamespaceMember::Namespace(ns) = &tree.unit().members[0] else {
            panic!("expected namespace");
        };
        let scope = Scope::default().enter_namespace(&ns.name);
        assert_eq!(scope.current_namespace(), "System.Globalization.Extra");
        assert!(matches!(
            scope.resolve_name(&compilation, "CultureInfo"),
            Some(NameTarget::Type(_))
        ));
        assert!(matches!(
            scope.resolve_name(&compilation, "IFormatProvider"),
            Some(NameTarget::Type(_))
        ));
    }
}
