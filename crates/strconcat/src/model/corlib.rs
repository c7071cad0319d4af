//! Reference libraries: the framework types user code compiles against.
use strum_macros::{EnumIter, IntoStaticStr};

use super::{
    AttributeData, Compilation, Member, MethodSymbol, Parameter, SpecialType, TypeId, TypeKind,
    TypeSymbol, ValueSymbol,
};

/// A referenced framework library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum Reference {
    /// `System`: special types, `IFormatProvider`, `ObsoleteAttribute`, ...
    Core,
    /// `System.Globalization`: `CultureInfo`, `NumberFormatInfo`.
    Globalization,
}

impl Reference {
    pub const ALL: [Self; 2] = [Self::Core, Self::Globalization];
}

const INTEGERS: [(SpecialType, &str); 8] = [
    (SpecialType::SByte, "SByte"),
    (SpecialType::Byte, "Byte"),
    (SpecialType::Int16, "Int16"),
    (SpecialType::UInt16, "UInt16"),
    (SpecialType::Int32, "Int32"),
    (SpecialType::UInt32, "UInt32"),
    (SpecialType::Int64, "Int64"),
    (SpecialType::UInt64, "UInt64"),
];

const FLOATING: [(SpecialType, &str); 3] = [
    (SpecialType::Single, "Single"),
    (SpecialType::Double, "Double"),
    (SpecialType::Decimal, "Decimal"),
];

struct Builder<'c> {
    compilation: &'c mut Compilation,
}

impl Builder<'_> {
    fn declare(&mut self, namespace: &str, name: &str, kind: TypeKind) -> TypeId {
        self.compilation.add_type(TypeSymbol::new(namespace, name, kind))
    }

    fn special(&mut self, special: SpecialType, kind: TypeKind) -> TypeId {
        let (namespace, name) = special
            .metadata_name()
            .rsplit_once('.')
            .unwrap_or(("", special.metadata_name()));
        let mut symbol = TypeSymbol::new(namespace, name, kind);
        symbol.special = Some(special);
        self.compilation.add_type(symbol)
    }

    fn set_base(&mut self, ty: TypeId, base: TypeId) {
        self.compilation.type_symbol_mut(ty).base = Some(base);
    }

    fn implement(&mut self, ty: TypeId, iface: TypeId) {
        self.compilation.type_symbol_mut(ty).interfaces.push(iface);
    }

    fn method(&mut self, ty: TypeId, name: &str, params: &[TypeId], returns: TypeId) {
        self.push_method(ty, name, params, returns, false);
    }

    fn static_method(&mut self, ty: TypeId, name: &str, params: &[TypeId], returns: TypeId) {
        self.push_method(ty, name, params, returns, true);
    }

    fn push_method(
        &mut self,
        ty: TypeId,
        name: &str,
        params: &[TypeId],
        returns: TypeId,
        is_static: bool,
    ) {
        let parameters = params
            .iter()
            .enumerate()
            .map(|(idx, param)| Parameter {
                name: format!("arg{idx}"),
                ty: Some(*param),
            })
            .collect();
        self.compilation
            .type_symbol_mut(ty)
            .members
            .push(Member::Method(MethodSymbol {
                name: name.to_string(),
                containing: ty,
                parameters,
                return_type: Some(returns),
                is_static,
                attributes: Vec::<AttributeData>::new(),
            }));
    }

    fn property(&mut self, ty: TypeId, name: &str, value: TypeId, is_static: bool) {
        self.compilation
            .type_symbol_mut(ty)
            .members
            .push(Member::Property(ValueSymbol {
                name: name.to_string(),
                containing: ty,
                ty: Some(value),
                is_static,
            }));
    }

    fn field(&mut self, ty: TypeId, name: &str, value: TypeId) {
        self.compilation
            .type_symbol_mut(ty)
            .members
            .push(Member::Field(ValueSymbol {
                name: name.to_string(),
                containing: ty,
                ty: Some(value),
                is_static: true,
            }));
    }
}

pub(crate) fn load(compilation: &mut Compilation, references: &[Reference]) {
    let mut b = Builder { compilation };
    if references.contains(&Reference::Core) {
        load_core(&mut b);
    }
    if references.contains(&Reference::Globalization) {
        load_globalization(&mut b);
    }
}

fn load_core(b: &mut Builder) {
    let object = b.special(SpecialType::Object, TypeKind::Class);
    let value_type = b.special(SpecialType::ValueType, TypeKind::Class);
    b.set_base(value_type, object);
    let void = b.special(SpecialType::Void, TypeKind::Struct);
    b.set_base(void, value_type);
    let string = b.special(SpecialType::String, TypeKind::Class);
    b.set_base(string, object);
    let boolean = b.special(SpecialType::Boolean, TypeKind::Struct);
    let character = b.special(SpecialType::Char, TypeKind::Struct);
    let int32 = b.special(SpecialType::Int32, TypeKind::Struct);

    let format_provider = b.declare("System", "IFormatProvider", TypeKind::Interface);
    let formattable = b.declare("System", "IFormattable", TypeKind::Interface);
    b.method(formattable, "ToString", &[string, format_provider], string);

    b.method(object, "ToString", &[], string);
    b.method(object, "Equals", &[object], boolean);
    b.method(object, "GetHashCode", &[], int32);
    b.method(value_type, "ToString", &[], string);

    let attribute = b.declare("System", "Attribute", TypeKind::Class);
    b.set_base(attribute, object);
    let obsolete = b.declare("System", "ObsoleteAttribute", TypeKind::Class);
    b.set_base(obsolete, attribute);

    b.method(string, "ToString", &[], string);
    b.method(string, "ToString", &[format_provider], string);
    b.method(string, "ToUpper", &[], string);
    b.method(string, "ToLower", &[], string);
    b.method(string, "Trim", &[], string);
    b.method(string, "Substring", &[int32], string);
    b.method(string, "Contains", &[string], boolean);
    b.property(string, "Length", int32, false);
    b.field(string, "Empty", string);
    b.static_method(string, "IsNullOrEmpty", &[string], boolean);
    b.static_method(string, "Concat", &[object, object], string);
    b.static_method(string, "Format", &[string, object], string);
    b.static_method(string, "Format", &[format_provider, string, object], string);

    for ty in [boolean, character] {
        b.set_base(ty, value_type);
        b.method(ty, "ToString", &[], string);
        b.method(ty, "ToString", &[format_provider], string);
    }
    b.static_method(boolean, "Parse", &[string], boolean);
    b.static_method(character, "IsDigit", &[character], boolean);
    b.static_method(character, "IsLetter", &[character], boolean);

    // Numbers
    let mut numbers = Vec::new();
    for (special, _) in INTEGERS.iter().chain(FLOATING.iter()) {
        let ty = if *special == SpecialType::Int32 {
            int32
        } else {
            b.special(*special, TypeKind::Struct)
        };
        numbers.push(ty);
    }
    for ty in numbers.iter().copied() {
        b.set_base(ty, value_type);
        b.implement(ty, formattable);
        b.method(ty, "ToString", &[], string);
        b.method(ty, "ToString", &[string], string);
        b.method(ty, "ToString", &[format_provider], string);
        b.method(ty, "ToString", &[string, format_provider], string);
        b.field(ty, "MaxValue", ty);
        b.field(ty, "MinValue", ty);
        b.static_method(ty, "Parse", &[string], ty);
        b.static_method(ty, "Parse", &[string, format_provider], ty);
    }
    let double = b
        .compilation
        .special_type(SpecialType::Double)
        .unwrap_or(int32);
    b.field(double, "NaN", double);

    let date_time = b.special(SpecialType::DateTime, TypeKind::Struct);
    b.set_base(date_time, value_type);
    b.implement(date_time, formattable);
    b.method(date_time, "ToString", &[], string);
    b.method(date_time, "ToString", &[string], string);
    b.method(date_time, "ToString", &[format_provider], string);
    b.method(date_time, "ToString", &[string, format_provider], string);
    b.property(date_time, "Now", date_time, true);
    b.property(date_time, "Today", date_time, true);
    b.property(date_time, "UtcNow", date_time, true);
    b.property(date_time, "Year", int32, false);
    b.method(date_time, "AddDays", &[double], date_time);

    // Guid is formattable, but has no `ToString(IFormatProvider)` overload.
    let guid = b.declare("System", "Guid", TypeKind::Struct);
    b.set_base(guid, value_type);
    b.implement(guid, formattable);
    b.method(guid, "ToString", &[], string);
    b.method(guid, "ToString", &[string], string);
    b.method(guid, "ToString", &[string, format_provider], string);
    b.static_method(guid, "NewGuid", &[], guid);
    b.field(guid, "Empty", guid);

    let array = b.special(SpecialType::Array, TypeKind::Class);
    b.set_base(array, object);
    b.property(array, "Length", int32, false);

    let math = b.declare("System", "Math", TypeKind::Class);
    b.set_base(math, object);
    b.field(math, "PI", double);
    b.static_method(math, "Abs", &[int32], int32);
    b.static_method(math, "Abs", &[double], double);
    b.static_method(math, "Max", &[int32, int32], int32);
    b.static_method(math, "Max", &[double, double], double);
    b.static_method(math, "Round", &[double], double);
    b.static_method(math, "Sqrt", &[double], double);

    let console = b.declare("System", "Console", TypeKind::Class);
    b.set_base(console, object);
    b.static_method(console, "WriteLine", &[], void);
    b.static_method(console, "WriteLine", &[string], void);
    b.static_method(console, "WriteLine", &[object], void);
    b.static_method(console, "Write", &[string], void);
    b.static_method(console, "Write", &[object], void);

    let string_builder = b.declare("System.Text", "StringBuilder", TypeKind::Class);
    b.set_base(string_builder, object);
    b.method(string_builder, "Append", &[string], string_builder);
    b.method(string_builder, "Append", &[object], string_builder);
    b.method(string_builder, "AppendLine", &[string], string_builder);
    b.method(string_builder, "ToString", &[], string);
    b.property(string_builder, "Length", int32, false);
}

fn load_globalization(b: &mut Builder) {
    let (Some(object), Some(string), Some(format_provider)) = (
        b.compilation.special_type(SpecialType::Object),
        b.compilation.special_type(SpecialType::String),
        b.compilation.type_by_metadata_name("System.IFormatProvider"),
    ) else {
        // Globalization depends on the core library.
        return;
    };

    let culture_info = b.declare("System.Globalization", "CultureInfo", TypeKind::Class);
    b.set_base(culture_info, object);
    b.implement(culture_info, format_provider);
    b.property(culture_info, "InvariantCulture", culture_info, true);
    b.property(culture_info, "CurrentCulture", culture_info, true);
    b.property(culture_info, "Name", string, false);
    b.method(culture_info, "ToString", &[], string);

    let number_format = b.declare("System.Globalization", "NumberFormatInfo", TypeKind::Class);
    b.set_base(number_format, object);
    b.implement(number_format, format_provider);
    b.property(number_format, "InvariantInfo", number_format, true);
    b.property(number_format, "CurrentInfo", number_format, true);
}

/// Declare `Nullable<T>` for `underlying`.
pub(crate) fn declare_nullable(compilation: &mut Compilation, underlying: TypeId) -> TypeId {
    let mut symbol = TypeSymbol::new("System", "Nullable", TypeKind::Nullable(underlying));
    symbol.base = compilation.special_type(SpecialType::ValueType);
    let id = compilation.add_type(symbol);

    let mut b = Builder { compilation };
    if let (Some(string), Some(boolean)) = (
        b.compilation.special_type(SpecialType::String),
        b.compilation.special_type(SpecialType::Boolean),
    ) {
        b.method(id, "ToString", &[], string);
        b.property(id, "HasValue", boolean, false);
    }
    b.property(id, "Value", underlying, false);
    b.method(id, "GetValueOrDefault", &[], underlying);
    id
}
