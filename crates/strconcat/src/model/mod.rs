//! Typed program model: type symbols, their members and the compilation
//! that owns them.
//!
//! A [`Compilation`] is built once per analysis pass (reference libraries
//! first, then source declarations) and is read-only afterwards, so it can be
//! shared across threads.
mod conversions;
pub mod corlib;
pub mod display;

use std::collections::{HashMap, HashSet};

pub use conversions::{Conversion, ConversionKind};
pub use corlib::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Types the language treats specially. Keyword types display by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialType {
    Object,
    ValueType,
    Array,
    Void,
    String,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
}

impl SpecialType {
    pub const fn metadata_name(self) -> &'static str {
        match self {
            Self::Object => "System.Object",
            Self::ValueType => "System.ValueType",
            Self::Array => "System.Array",
            Self::Void => "System.Void",
            Self::String => "System.String",
            Self::Boolean => "System.Boolean",
            Self::Char => "System.Char",
            Self::SByte => "System.SByte",
            Self::Byte => "System.Byte",
            Self::Int16 => "System.Int16",
            Self::UInt16 => "System.UInt16",
            Self::Int32 => "System.Int32",
            Self::UInt32 => "System.UInt32",
            Self::Int64 => "System.Int64",
            Self::UInt64 => "System.UInt64",
            Self::Single => "System.Single",
            Self::Double => "System.Double",
            Self::Decimal => "System.Decimal",
            Self::DateTime => "System.DateTime",
        }
    }

    /// The language keyword naming this type, if there is one.
    pub const fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Self::Object => "object",
            Self::Void => "void",
            Self::String => "string",
            Self::Boolean => "bool",
            Self::Char => "char",
            Self::SByte => "sbyte",
            Self::Byte => "byte",
            Self::Int16 => "short",
            Self::UInt16 => "ushort",
            Self::Int32 => "int",
            Self::UInt32 => "uint",
            Self::Int64 => "long",
            Self::UInt64 => "ulong",
            Self::Single => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::ValueType | Self::Array | Self::DateTime => return None,
        })
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
                | Self::Single
                | Self::Double
                | Self::Decimal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Array(TypeId),
    Nullable(TypeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// `None` when the declared type did not resolve.
    pub ty: Option<TypeId>,
}

/// An applied attribute; `class` is `None` when its name did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeData {
    pub class: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbol {
    pub name: String,
    pub containing: TypeId,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeId>,
    pub is_static: bool,
    pub attributes: Vec<AttributeData>,
}

/// Properties and fields: named, typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSymbol {
    pub name: String,
    pub containing: TypeId,
    pub ty: Option<TypeId>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Method(MethodSymbol),
    Property(ValueSymbol),
    Field(ValueSymbol),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Self::Method(m) => &m.name,
            Self::Property(v) | Self::Field(v) => &v.name,
        }
    }

    pub const fn as_method(&self) -> Option<&MethodSymbol> {
        match self {
            Self::Method(m) => Some(m),
            _ => None,
        }
    }

    pub const fn as_value(&self) -> Option<&ValueSymbol> {
        match self {
            Self::Property(v) | Self::Field(v) => Some(v),
            Self::Method(_) => None,
        }
    }
}

/// Identifies a member by declaring type and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub ty: TypeId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    /// Metadata name without namespace, e.g. `Int32`.
    pub name: String,
    /// Dotted namespace; empty for the global namespace.
    pub namespace: String,
    pub kind: TypeKind,
    pub special: Option<SpecialType>,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Members in declaration order.
    pub members: Vec<Member>,
    pub from_source: bool,
}

impl TypeSymbol {
    pub(crate) fn new(namespace: &str, name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind,
            special: None,
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            from_source: false,
        }
    }

    pub fn metadata_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compilation {
    types: Vec<TypeSymbol>,
    by_metadata_name: HashMap<String, TypeId>,
    special: HashMap<SpecialType, TypeId>,
    constructed: HashMap<TypeKind, TypeId>,
    namespaces: HashSet<String>,
}

impl Compilation {
    /// A compilation holding only the given reference libraries.
    pub fn new(references: &[Reference]) -> Self {
        let mut compilation = Self::default();
        corlib::load(&mut compilation, references);
        compilation
    }

    pub(crate) fn add_type(&mut self, symbol: TypeSymbol) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        if !matches!(symbol.kind, TypeKind::Array(_) | TypeKind::Nullable(_)) {
            self.by_metadata_name
                .entry(symbol.metadata_name())
                .or_insert(id);
            let mut namespace = symbol.namespace.as_str();
            while !namespace.is_empty() {
                self.namespaces.insert(namespace.to_string());
                namespace = namespace.rsplit_once('.').map_or("", |(parent, _)| parent);
            }
        }
        if let Some(special) = symbol.special {
            self.special.insert(special, id);
        }
        self.types.push(symbol);
        id
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.0 as usize]
    }

    pub(crate) fn type_symbol_mut(&mut self, id: TypeId) -> &mut TypeSymbol {
        &mut self.types[id.0 as usize]
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeSymbol)> {
        self.types
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (TypeId(idx as u32), symbol))
    }

    pub fn special_type(&self, special: SpecialType) -> Option<TypeId> {
        self.special.get(&special).copied()
    }

    pub fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        self.by_metadata_name.get(name).copied()
    }

    pub fn is_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(name)
    }

    pub fn is_special(&self, id: TypeId, special: SpecialType) -> bool {
        self.type_symbol(id).special == Some(special)
    }

    pub fn member(&self, member: MemberRef) -> &Member {
        &self.type_symbol(member.ty).members[member.index]
    }

    /// Members named `name` on `ty` and its base types: declared members
    /// first, in declaration order, then each base type's in turn.
    pub fn members_named<'c>(
        &'c self,
        ty: TypeId,
        name: &'c str,
    ) -> impl Iterator<Item = (MemberRef, &'c Member)> + 'c {
        self.base_chain(ty).flat_map(move |owner| {
            self.type_symbol(owner)
                .members
                .iter()
                .enumerate()
                .filter(move |(_, member)| member.name() == name)
                .map(move |(index, member)| (MemberRef { ty: owner, index }, member))
        })
    }

    /// `ty` followed by its base types, stopping at a cycle.
    pub fn base_chain(&self, ty: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        let mut seen = HashSet::new();
        std::iter::successors(Some(ty), move |current| {
            seen.insert(*current);
            self.type_symbol(*current)
                .base
                .filter(|base| !seen.contains(base))
        })
    }

    /// All interfaces implemented by `ty` or any of its base types.
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut found = Vec::new();
        let mut pending = self
            .base_chain(ty)
            .flat_map(|owner| self.type_symbol(owner).interfaces.clone())
            .collect::<Vec<_>>();
        while let Some(iface) = pending.pop() {
            if !found.contains(&iface) {
                found.push(iface);
                pending.extend(self.type_symbol(iface).interfaces.iter().copied());
            }
        }
        found
    }

    pub fn is_value_type(&self, ty: TypeId) -> bool {
        matches!(
            self.type_symbol(ty).kind,
            TypeKind::Struct | TypeKind::Nullable(_)
        )
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        self.type_symbol(ty).special.is_some_and(SpecialType::is_numeric)
    }

    /// `T[]`, created on first use.
    pub(crate) fn array_of(&mut self, element: TypeId) -> TypeId {
        let kind = TypeKind::Array(element);
        if let Some(id) = self.constructed.get(&kind) {
            return *id;
        }
        let mut symbol = TypeSymbol::new("", "", kind);
        symbol.base = self.special_type(SpecialType::Array);
        let id = self.add_type(symbol);
        self.constructed.insert(kind, id);
        id
    }

    /// `T?` for a value type `T`, created on first use.
    pub(crate) fn nullable_of(&mut self, underlying: TypeId) -> TypeId {
        let kind = TypeKind::Nullable(underlying);
        if let Some(id) = self.constructed.get(&kind) {
            return *id;
        }
        let id = corlib::declare_nullable(self, underlying);
        self.constructed.insert(kind, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_lookup_walks_base_types_in_order() {
        let compilation = Compilation::new(&Reference::ALL);
        let int32 = compilation.special_type(SpecialType::Int32).unwrap();
        let owners: Vec<_> = compilation
            .members_named(int32, "ToString")
            .map(|(member, _)| compilation.type_symbol(member.ty).name.as_str())
            .collect();
        assert_eq!(
            owners,
            ["Int32", "Int32", "Int32", "Int32", "ValueType", "Object"]
        );
    }

    #[test]
    fn namespaces_are_registered() {
        let compilation = Compilation::new(&Reference::ALL);
        assert!(compilation.is_namespace("System"));
        assert!(compilation.is_namespace("System.Globalization"));
        let core_only = Compilation::new(&[Reference::Core]);
        assert!(!core_only.is_namespace("System.Globalization"));
        assert!(
            core_only
                .type_by_metadata_name("System.Globalization.CultureInfo")
                .is_none()
        );
    }
}
