//! Source declarations: the types and member signatures user code declares.
use tracing::trace;

use super::scope::Scope;
use crate::model::{
    AttributeData, Compilation, Member, MethodSymbol, Parameter, SpecialType, TypeId, TypeKind,
    TypeSymbol, ValueSymbol,
};
use crate::syntax::SyntaxTree;
use crate::syntax::ast::{self, MemberDecl, NamespaceMember, TypeDecl, TypeDeclKind, is_static};

/// A source type declaration together with the names visible to it.
pub(crate) struct DeclaredType<'t> {
    pub(crate) document: usize,
    pub(crate) ty: TypeId,
    pub(crate) scope: Scope,
    pub(crate) decl: &'t TypeDecl,
}

/// Declare every type of `trees`, then their bases and members.
///
/// Types are all declared before any signature is resolved, so members may
/// mention types declared later or in another document.
pub(crate) fn declare_types<'t>(
    compilation: &mut Compilation,
    trees: &[&'t SyntaxTree],
) -> Vec<DeclaredType<'t>> {
    // Global usings apply to every document of the project.
    let root = Scope::default().with_usings(
        trees
            .iter()
            .flat_map(|tree| tree.unit().usings.iter())
            .filter(|using| using.is_global),
    );

    let mut declared = Vec::new();
    for (document, tree) in trees.iter().enumerate() {
        let unit = tree.unit();
        let scope = root.with_usings(unit.usings.iter().filter(|using| !using.is_global));
        collect(compilation, document, &scope, &unit.members, &mut declared);
    }

    for declaration in &declared {
        declare_signatures(compilation, declaration);
    }
    declared
}

fn collect<'t>(
    compilation: &mut Compilation,
    document: usize,
    scope: &Scope,
    members: &'t [NamespaceMember],
    out: &mut Vec<DeclaredType<'t>>,
) {
    for member in members {
        match member {
            NamespaceMember::Namespace(ns) => {
                let inner = scope.enter_namespace(&ns.name).with_usings(&ns.usings);
                collect(compilation, document, &inner, &ns.members, out);
            }
            NamespaceMember::Type(decl) => {
                let ty = declare_type(compilation, scope.current_namespace(), decl);
                out.push(DeclaredType {
                    document,
                    ty,
                    scope: scope.clone(),
                    decl,
                });
            }
        }
    }
}

fn declare_type(compilation: &mut Compilation, namespace: &str, decl: &TypeDecl) -> TypeId {
    let mut symbol = TypeSymbol::new(
        namespace,
        &decl.name.name,
        match decl.kind {
            TypeDeclKind::Class => TypeKind::Class,
            TypeDeclKind::Struct => TypeKind::Struct,
            TypeDeclKind::Interface => TypeKind::Interface,
        },
    );
    symbol.from_source = true;

    if decl.modifiers.iter().any(|m| m == "partial") {
        let existing = compilation
            .type_by_metadata_name(&symbol.metadata_name())
            .filter(|id| compilation.type_symbol(*id).from_source);
        if let Some(existing) = existing {
            return existing;
        }
    }
    trace!(name = %symbol.metadata_name(), "declaring source type");
    compilation.add_type(symbol)
}

fn declare_signatures(compilation: &mut Compilation, declaration: &DeclaredType<'_>) {
    let DeclaredType {
        ty, scope, decl, ..
    } = declaration;

    let mut base = None;
    let mut interfaces = Vec::new();
    for syntax in &decl.bases {
        let Some(resolved) = scope.resolve_type(compilation, syntax) else {
            continue;
        };
        if compilation.type_symbol(resolved).kind == TypeKind::Interface {
            interfaces.push(resolved);
        } else if decl.kind == TypeDeclKind::Class && base.is_none() {
            base = Some(resolved);
        }
    }
    let base = base.or_else(|| match decl.kind {
        TypeDeclKind::Class => compilation.special_type(SpecialType::Object),
        TypeDeclKind::Struct => compilation.special_type(SpecialType::ValueType),
        TypeDeclKind::Interface => None,
    });

    let mut members = Vec::new();
    for member in &decl.members {
        declare_member(compilation, scope, *ty, member, &mut members);
    }

    let symbol = compilation.type_symbol_mut(*ty);
    // A later part of a partial type only overrides the default base.
    if symbol.base.is_none() || !decl.bases.is_empty() {
        symbol.base = base;
    }
    symbol.interfaces.extend(interfaces);
    symbol.members.extend(members);
}

fn declare_member(
    compilation: &mut Compilation,
    scope: &Scope,
    containing: TypeId,
    member: &MemberDecl,
    out: &mut Vec<Member>,
) {
    match member {
        MemberDecl::Field {
            modifiers,
            ty,
            declarators,
            ..
        } => {
            let ty = scope.resolve_type(compilation, ty);
            out.extend(declarators.iter().map(|declarator| {
                Member::Field(ValueSymbol {
                    name: declarator.name.name.clone(),
                    containing,
                    ty,
                    is_static: is_static(modifiers),
                })
            }));
        }
        MemberDecl::Property {
            modifiers, ty, name, ..
        } => {
            let ty = scope.resolve_type(compilation, ty);
            out.push(Member::Property(ValueSymbol {
                name: name.name.clone(),
                containing,
                ty,
                is_static: is_static(modifiers),
            }));
        }
        MemberDecl::Method {
            return_type: None, ..
        } => {}
        MemberDecl::Method {
            attributes,
            modifiers,
            return_type: Some(return_type),
            name,
            parameters,
            ..
        } => {
            let parameters = parameters
                .iter()
                .map(|param: &ast::Parameter| Parameter {
                    name: param.name.name.clone(),
                    ty: scope.resolve_type(compilation, &param.ty),
                })
                .collect();
            let attributes = attributes
                .iter()
                .map(|attribute| AttributeData {
                    class: scope.resolve_attribute(compilation, &attribute.name),
                })
                .collect();
            out.push(Member::Method(MethodSymbol {
                name: name.name.clone(),
                containing,
                parameters,
                return_type: scope.resolve_type(compilation, return_type),
                is_static: is_static(modifiers),
                attributes,
            }));
        }
    }
}
