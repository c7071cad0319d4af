//! Binding of member bodies and initializers into operations.
use super::declare::DeclaredType;
use super::operation::{BoundUnit, OperationId, OperationKind, SyntaxRef};
use super::scope::{NameTarget, Scope, special_for};
use crate::model::{Compilation, Member, MemberRef, SpecialType, TypeId, TypeKind};
use crate::range::TextRange;
use crate::syntax::ast::{
    AssignOp, BinaryOp, Block, Body, Expr, ExprKind, Ident, LiteralKind, MemberDecl,
    PropertyBody, Stmt, TypeSyntax, UnaryOp, is_static,
};

/// The result of binding an expression that may not denote a value.
enum Bound {
    Value(OperationId),
    Type(TypeId),
    Namespace(String),
    MethodGroup {
        owner: TypeId,
        name: String,
        receiver: Receiver,
    },
}

#[derive(Clone, Copy)]
enum Receiver {
    Instance(OperationId),
    /// Accessed through a type name.
    Type,
    /// Unqualified use inside the containing type.
    Implicit,
}

type Locals = Vec<(String, Option<TypeId>)>;

struct BodyBinder<'b> {
    compilation: &'b mut Compilation,
    unit: &'b mut BoundUnit,
    text: &'b str,
    scope: &'b Scope,
    containing: TypeId,
    in_static: bool,
    return_type: Option<TypeId>,
    parameters: Locals,
    locals: Vec<Locals>,
}

/// Bind every body and initializer of `declared` into `unit`.
pub(crate) fn bind_bodies(
    compilation: &mut Compilation,
    unit: &mut BoundUnit,
    text: &str,
    declared: &DeclaredType<'_>,
) {
    for member in &declared.decl.members {
        match member {
            MemberDecl::Field {
                modifiers,
                ty,
                declarators,
                ..
            } => {
                let field_ty = declared.scope.resolve_type(compilation, ty);
                for declarator in declarators {
                    let Some(init) = &declarator.initializer else {
                        continue;
                    };
                    let mut binder =
                        BodyBinder::new(compilation, unit, text, declared, is_static(modifiers));
                    binder.bind_initializer(&declarator.name, init, field_ty);
                }
            }
            MemberDecl::Property {
                modifiers,
                ty,
                name,
                body,
                initializer,
                ..
            } => {
                let value_ty = declared.scope.resolve_type(compilation, ty);
                let in_static = is_static(modifiers);
                match body {
                    PropertyBody::Expression(expr) => {
                        let mut binder =
                            BodyBinder::new(compilation, unit, text, declared, in_static);
                        binder.return_type = value_ty;
                        let root = binder.bind_expression_body(expr);
                        binder.unit.push_root(root);
                    }
                    PropertyBody::Accessors(accessors) => {
                        for accessor in accessors {
                            let Some(body) = &accessor.body else {
                                continue;
                            };
                            let mut binder =
                                BodyBinder::new(compilation, unit, text, declared, in_static);
                            if accessor.keyword == "get" {
                                binder.return_type = value_ty;
                            } else {
                                binder.return_type = binder.special(SpecialType::Void);
                                binder.parameters.push(("value".to_string(), value_ty));
                            }
                            let root = binder.bind_body(body);
                            binder.unit.push_root(root);
                        }
                    }
                }
                if let Some(init) = initializer {
                    let mut binder = BodyBinder::new(compilation, unit, text, declared, in_static);
                    binder.bind_initializer(name, init, value_ty);
                }
            }
            MemberDecl::Method {
                modifiers,
                return_type,
                parameters,
                body: Some(body),
                ..
            } => {
                let return_type = match return_type {
                    Some(syntax) => declared.scope.resolve_type(compilation, syntax),
                    None => compilation.special_type(SpecialType::Void),
                };
                let parameters: Locals = parameters
                    .iter()
                    .map(|param| {
                        let ty = declared.scope.resolve_type(compilation, &param.ty);
                        (param.name.name.clone(), ty)
                    })
                    .collect();
                let mut binder =
                    BodyBinder::new(compilation, unit, text, declared, is_static(modifiers));
                binder.return_type = return_type;
                binder.parameters = parameters;
                let root = binder.bind_body(body);
                binder.unit.push_root(root);
            }
            MemberDecl::Method { body: None, .. } => {}
        }
    }
}

const fn unary_promotion(ty: SpecialType) -> SpecialType {
    match ty {
        SpecialType::SByte
        | SpecialType::Byte
        | SpecialType::Int16
        | SpecialType::UInt16
        | SpecialType::Char => SpecialType::Int32,
        other => other,
    }
}

/// The operand type of a predefined binary numeric operator.
fn binary_promotion(a: SpecialType, b: SpecialType) -> Option<SpecialType> {
    use SpecialType::{Decimal, Double, Int16, Int32, Int64, SByte, Single, UInt32, UInt64};
    let either = |t| a == t || b == t;
    Some(if either(Decimal) {
        if either(Single) || either(Double) {
            return None;
        }
        Decimal
    } else if either(Double) {
        Double
    } else if either(Single) {
        Single
    } else if either(UInt64) {
        if either(SByte) || either(Int16) || either(Int32) || either(Int64) {
            return None;
        }
        UInt64
    } else if either(Int64) {
        Int64
    } else if either(UInt32) {
        if either(SByte) || either(Int16) || either(Int32) {
            Int64
        } else {
            UInt32
        }
    } else {
        Int32
    })
}

fn integer_literal_type(text: &str) -> SpecialType {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let suffix = text[digits.len()..].to_ascii_lowercase();
    let digits = digits.replace('_', "");
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2)
    } else {
        digits.parse::<u64>()
    }
    .unwrap_or(u64::MAX);

    match suffix.as_str() {
        "u" if value <= u64::from(u32::MAX) => SpecialType::UInt32,
        "u" | "ul" | "lu" => SpecialType::UInt64,
        "l" if value <= i64::MAX as u64 => SpecialType::Int64,
        "l" => SpecialType::UInt64,
        _ if value <= i32::MAX as u64 => SpecialType::Int32,
        _ if value <= u64::from(u32::MAX) => SpecialType::UInt32,
        _ if value <= i64::MAX as u64 => SpecialType::Int64,
        _ => SpecialType::UInt64,
    }
}

fn real_literal_type(text: &str) -> SpecialType {
    match text.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('f') => SpecialType::Single,
        Some('m') => SpecialType::Decimal,
        _ => SpecialType::Double,
    }
}

impl<'b> BodyBinder<'b> {
    fn new(
        compilation: &'b mut Compilation,
        unit: &'b mut BoundUnit,
        text: &'b str,
        declared: &'b DeclaredType<'_>,
        in_static: bool,
    ) -> Self {
        Self {
            compilation,
            unit,
            text,
            scope: &declared.scope,
            containing: declared.ty,
            in_static,
            return_type: None,
            parameters: Vec::new(),
            locals: Vec::new(),
        }
    }

    fn special(&self, special: SpecialType) -> Option<TypeId> {
        self.compilation.special_type(special)
    }

    fn special_of(&self, ty: Option<TypeId>) -> Option<SpecialType> {
        ty.and_then(|ty| self.compilation.type_symbol(ty).special)
    }

    fn numeric_of(&self, ty: Option<TypeId>) -> Option<SpecialType> {
        self.special_of(ty).filter(|special| special.is_numeric())
    }

    fn type_of(&self, op: OperationId) -> Option<TypeId> {
        self.unit.get(op).ty
    }

    fn is_string(&self, ty: Option<TypeId>) -> bool {
        self.special_of(ty) == Some(SpecialType::String)
    }

    fn is_null_literal(&self, op: OperationId) -> bool {
        matches!(
            self.unit.get(op).kind,
            OperationKind::Literal(LiteralKind::Null)
        )
    }

    fn alloc(
        &mut self,
        kind: OperationKind,
        ty: Option<TypeId>,
        syntax: SyntaxRef,
        is_implicit: bool,
    ) -> OperationId {
        self.unit.alloc(kind, ty, syntax, is_implicit)
    }

    fn syntax(expr: &Expr) -> SyntaxRef {
        SyntaxRef {
            node: Some(expr.id),
            range: expr.range,
        }
    }

    fn statement(range: TextRange) -> SyntaxRef {
        SyntaxRef { node: None, range }
    }

    fn invalid(&mut self, expr: &Expr, children: Vec<OperationId>) -> OperationId {
        self.alloc(OperationKind::Invalid(children), None, Self::syntax(expr), false)
    }

    /// Convert `op`, written as `written`, to `target` with an implicit
    /// conversion. Identity conversions are not materialized.
    fn convert(&mut self, op: OperationId, written: &Expr, target: Option<TypeId>) -> OperationId {
        let Some(target) = target else {
            return op;
        };
        let conversion =
            self.compilation
                .classify_implicit(self.type_of(op), self.is_null_literal(op), target);
        if conversion.is_identity() {
            return op;
        }
        self.alloc(
            OperationKind::Conversion {
                operand: op,
                conversion,
            },
            Some(target),
            Self::syntax(written),
            true,
        )
    }

    fn convert_special(&mut self, op: OperationId, written: &Expr, target: SpecialType) -> OperationId {
        let target = self.special(target);
        self.convert(op, written, target)
    }

    fn bind_converted(&mut self, expr: &Expr, target: Option<TypeId>) -> OperationId {
        let op = self.bind_value(expr);
        self.convert(op, expr, target)
    }

    fn bind_initializer(&mut self, name: &Ident, init: &Expr, ty: Option<TypeId>) {
        let value = self.bind_converted(init, ty);
        let root = self.alloc(
            OperationKind::VariableDeclaration {
                name: name.name.clone(),
                initializer: Some(value),
            },
            ty,
            Self::statement(name.range.cover(init.range)),
            false,
        );
        self.unit.push_root(root);
    }

    fn returns_void(&self) -> bool {
        self.return_type
            .is_none_or(|ty| self.compilation.is_special(ty, SpecialType::Void))
    }

    fn bind_body(&mut self, body: &Body) -> OperationId {
        match body {
            Body::Block(block) => self.bind_block(block),
            Body::Expression(expr) => self.bind_expression_body(expr),
        }
    }

    /// `=> expr`: an implicit return, or a statement for `void` members.
    fn bind_expression_body(&mut self, expr: &Expr) -> OperationId {
        if self.returns_void() {
            let value = self.bind_value(expr);
            return self.alloc(
                OperationKind::ExpressionStatement(value),
                None,
                Self::statement(expr.range),
                true,
            );
        }
        let value = self.bind_converted(expr, self.return_type);
        self.alloc(
            OperationKind::Return(Some(value)),
            None,
            Self::statement(expr.range),
            true,
        )
    }

    fn bind_block(&mut self, block: &Block) -> OperationId {
        self.locals.push(Vec::new());
        let items = block
            .statements
            .iter()
            .map(|stmt| self.bind_stmt(stmt))
            .collect();
        self.locals.pop();
        self.alloc(
            OperationKind::Block(items),
            None,
            Self::statement(block.range),
            false,
        )
    }

    fn declare_local(&mut self, name: &str, ty: Option<TypeId>) {
        if self.locals.is_empty() {
            self.locals.push(Vec::new());
        }
        if let Some(innermost) = self.locals.last_mut() {
            innermost.push((name.to_string(), ty));
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt) -> OperationId {
        match stmt {
            Stmt::Block(block) => self.bind_block(block),
            Stmt::Local {
                ty,
                declarators,
                range,
            } => {
                let declared = self.scope.resolve_type(self.compilation, ty);
                let is_var = matches!(ty, TypeSyntax::Implicit(_));
                let mut ops = Vec::new();
                for declarator in declarators {
                    let (initializer, ty, syntax_range) = match &declarator.initializer {
                        Some(init) if is_var => {
                            let value = self.bind_value(init);
                            let ty = self.type_of(value);
                            (Some(value), ty, declarator.name.range.cover(init.range))
                        }
                        Some(init) => (
                            Some(self.bind_converted(init, declared)),
                            declared,
                            declarator.name.range.cover(init.range),
                        ),
                        None => (None, declared, declarator.name.range),
                    };
                    self.declare_local(&declarator.name.name, ty);
                    ops.push(self.alloc(
                        OperationKind::VariableDeclaration {
                            name: declarator.name.name.clone(),
                            initializer,
                        },
                        ty,
                        Self::statement(syntax_range),
                        false,
                    ));
                }
                if ops.len() == 1 {
                    ops[0]
                } else {
                    self.alloc(OperationKind::Block(ops), None, Self::statement(*range), true)
                }
            }
            Stmt::Expression(expr) => {
                let value = self.bind_value(expr);
                self.alloc(
                    OperationKind::ExpressionStatement(value),
                    None,
                    Self::statement(expr.range),
                    false,
                )
            }
            Stmt::Return { value, range } => {
                let target = if self.returns_void() {
                    None
                } else {
                    self.return_type
                };
                let value = value
                    .as_ref()
                    .map(|value| self.bind_converted(value, target));
                self.alloc(
                    OperationKind::Return(value),
                    None,
                    Self::statement(*range),
                    false,
                )
            }
            Stmt::If {
                condition,
                then,
                otherwise,
                range,
            } => {
                let boolean = self.special(SpecialType::Boolean);
                let condition = self.bind_converted(condition, boolean);
                let when_true = self.bind_stmt(then);
                let when_false = otherwise.as_ref().map(|stmt| self.bind_stmt(stmt));
                self.alloc(
                    OperationKind::If {
                        condition,
                        when_true,
                        when_false,
                    },
                    None,
                    Self::statement(*range),
                    false,
                )
            }
            Stmt::While {
                condition,
                body,
                range,
            } => {
                let boolean = self.special(SpecialType::Boolean);
                let condition = self.bind_converted(condition, boolean);
                let body = self.bind_stmt(body);
                self.alloc(
                    OperationKind::Loop {
                        initializer: None,
                        condition: Some(condition),
                        iterators: Vec::new(),
                        body,
                    },
                    None,
                    Self::statement(*range),
                    false,
                )
            }
            Stmt::For {
                initializer,
                condition,
                iterators,
                body,
                range,
            } => {
                self.locals.push(Vec::new());
                let initializer = initializer.as_ref().map(|stmt| self.bind_stmt(stmt));
                let boolean = self.special(SpecialType::Boolean);
                let condition = condition
                    .as_ref()
                    .map(|condition| self.bind_converted(condition, boolean));
                let iterators = iterators.iter().map(|expr| self.bind_value(expr)).collect();
                let body = self.bind_stmt(body);
                self.locals.pop();
                self.alloc(
                    OperationKind::Loop {
                        initializer,
                        condition,
                        iterators,
                        body,
                    },
                    None,
                    Self::statement(*range),
                    false,
                )
            }
            Stmt::Empty(range) => {
                self.alloc(OperationKind::Empty, None, Self::statement(*range), false)
            }
        }
    }

    /// Bind `expr`, which must denote a value.
    fn bind_value(&mut self, expr: &Expr) -> OperationId {
        match self.bind_expr(expr) {
            Bound::Value(op) => op,
            Bound::MethodGroup {
                receiver: Receiver::Instance(instance),
                ..
            } => self.invalid(expr, vec![instance]),
            Bound::Type(_) | Bound::Namespace(_) | Bound::MethodGroup { .. } => {
                self.invalid(expr, vec![])
            }
        }
    }

    fn bind_expr(&mut self, expr: &Expr) -> Bound {
        let op = match &expr.kind {
            ExprKind::Literal(kind) => {
                let ty = self.literal_type(*kind, expr.range);
                self.alloc(OperationKind::Literal(*kind), ty, Self::syntax(expr), false)
            }
            ExprKind::Name(ident) => return self.bind_name(expr, ident),
            ExprKind::PredefinedType(predefined) => {
                return match self.special(special_for(*predefined)) {
                    Some(ty) => Bound::Type(ty),
                    None => Bound::Value(self.invalid(expr, vec![])),
                };
            }
            ExprKind::This => self.alloc(
                OperationKind::InstanceReference,
                Some(self.containing),
                Self::syntax(expr),
                false,
            ),
            // Parentheses do not produce an operation of their own.
            ExprKind::Parenthesized(inner) => return self.bind_expr(inner),
            ExprKind::MemberAccess { receiver, name } => {
                return self.bind_member_access(expr, receiver, name);
            }
            ExprKind::Invocation { callee, arguments } => {
                self.bind_invocation(expr, callee, arguments)
            }
            ExprKind::ElementAccess {
                receiver,
                arguments,
            } => {
                let instance = self.bind_value(receiver);
                let arguments = arguments.iter().map(|arg| self.bind_value(arg)).collect();
                let ty = self.type_of(instance).and_then(|ty| {
                    match self.compilation.type_symbol(ty).kind {
                        TypeKind::Array(element) => Some(element),
                        _ if self.compilation.is_special(ty, SpecialType::String) => {
                            self.special(SpecialType::Char)
                        }
                        _ => None,
                    }
                });
                self.alloc(
                    OperationKind::ElementAccess {
                        instance,
                        arguments,
                    },
                    ty,
                    Self::syntax(expr),
                    false,
                )
            }
            ExprKind::ObjectCreation { ty, arguments } => {
                let ty = self.scope.resolve_type(self.compilation, ty);
                let arguments = arguments.iter().map(|arg| self.bind_value(arg)).collect();
                self.alloc(
                    OperationKind::ObjectCreation { arguments },
                    ty,
                    Self::syntax(expr),
                    false,
                )
            }
            ExprKind::Unary { op, operand } => self.bind_unary(expr, *op, operand),
            ExprKind::Postfix { increment, operand } => {
                let operand = self.bind_value(operand);
                self.alloc(
                    OperationKind::Increment {
                        operand,
                        is_increment: *increment,
                        is_postfix: true,
                    },
                    self.type_of(operand),
                    Self::syntax(expr),
                    false,
                )
            }
            ExprKind::Cast { ty, operand } => {
                let target = self.scope.resolve_type(self.compilation, ty);
                let operand = self.bind_value(operand);
                match target {
                    Some(target) => {
                        let conversion = self.compilation.classify_explicit(
                            self.type_of(operand),
                            self.is_null_literal(operand),
                            target,
                        );
                        self.alloc(
                            OperationKind::Conversion {
                                operand,
                                conversion,
                            },
                            Some(target),
                            Self::syntax(expr),
                            false,
                        )
                    }
                    None => self.invalid(expr, vec![operand]),
                }
            }
            ExprKind::Binary { op, left, right } => self.bind_binary(expr, *op, left, right),
            ExprKind::Assignment { op, target, value } => {
                self.bind_assignment(expr, *op, target, value)
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => self.bind_conditional(expr, condition, when_true, when_false),
        };
        Bound::Value(op)
    }

    fn literal_type(&self, kind: LiteralKind, range: TextRange) -> Option<TypeId> {
        let special = match kind {
            LiteralKind::String | LiteralKind::InterpolatedString => SpecialType::String,
            LiteralKind::Char => SpecialType::Char,
            LiteralKind::True | LiteralKind::False => SpecialType::Boolean,
            LiteralKind::Integer => integer_literal_type(&self.text[range]),
            LiteralKind::Real => real_literal_type(&self.text[range]),
            LiteralKind::Null => return None,
        };
        self.special(special)
    }

    fn lookup_local(&self, name: &str) -> Option<Option<TypeId>> {
        self.locals
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(local, _)| local == name)
            .map(|(_, ty)| *ty)
    }

    fn bind_name(&mut self, expr: &Expr, ident: &Ident) -> Bound {
        let name = ident.name.as_str();
        if let Some(ty) = self.lookup_local(name) {
            let op = self.alloc(
                OperationKind::LocalReference(name.to_string()),
                ty,
                Self::syntax(expr),
                false,
            );
            return Bound::Value(op);
        }
        if let Some((_, ty)) = self.parameters.iter().find(|(param, _)| param == name) {
            let ty = *ty;
            let op = self.alloc(
                OperationKind::ParameterReference(name.to_string()),
                ty,
                Self::syntax(expr),
                false,
            );
            return Bound::Value(op);
        }
        if let Some(bound) = self.bind_member(expr, self.containing, name, Receiver::Implicit) {
            return bound;
        }
        match self.scope.resolve_name(self.compilation, name) {
            Some(NameTarget::Type(ty)) => Bound::Type(ty),
            Some(NameTarget::Namespace(ns)) => Bound::Namespace(ns),
            None => Bound::Value(self.invalid(expr, vec![])),
        }
    }

    fn implicit_this(&mut self, expr: &Expr) -> OperationId {
        self.alloc(
            OperationKind::InstanceReference,
            Some(self.containing),
            Self::statement(TextRange::empty(expr.range.start())),
            true,
        )
    }

    /// Look `name` up as a member of `owner`.
    fn bind_member(
        &mut self,
        expr: &Expr,
        owner: TypeId,
        name: &str,
        receiver: Receiver,
    ) -> Option<Bound> {
        let (member_ref, member) = self.compilation.members_named(owner, name).next()?;
        let (ty, member_is_static, is_field) = match member {
            Member::Method(_) => {
                return Some(Bound::MethodGroup {
                    owner,
                    name: name.to_string(),
                    receiver,
                });
            }
            Member::Field(value) => (value.ty, value.is_static, true),
            Member::Property(value) => (value.ty, value.is_static, false),
        };
        let instance = match receiver {
            Receiver::Instance(op) => Some(op),
            Receiver::Implicit if !member_is_static && !self.in_static => {
                Some(self.implicit_this(expr))
            }
            Receiver::Implicit | Receiver::Type => None,
        };
        let kind = if is_field {
            OperationKind::FieldReference {
                field: member_ref,
                instance,
            }
        } else {
            OperationKind::PropertyReference {
                property: member_ref,
                instance,
            }
        };
        Some(Bound::Value(self.alloc(kind, ty, Self::syntax(expr), false)))
    }

    fn bind_member_access(&mut self, expr: &Expr, receiver: &Expr, name: &Ident) -> Bound {
        match self.bind_expr(receiver) {
            Bound::Namespace(ns) => {
                match Scope::resolve_member(self.compilation, &NameTarget::Namespace(ns), &name.name)
                {
                    Some(NameTarget::Type(ty)) => Bound::Type(ty),
                    Some(NameTarget::Namespace(ns)) => Bound::Namespace(ns),
                    None => Bound::Value(self.invalid(expr, vec![])),
                }
            }
            Bound::Type(ty) => self
                .bind_member(expr, ty, &name.name, Receiver::Type)
                .unwrap_or_else(|| Bound::Value(self.invalid(expr, vec![]))),
            Bound::Value(op) => match self.type_of(op) {
                Some(ty) => self
                    .bind_member(expr, ty, &name.name, Receiver::Instance(op))
                    .unwrap_or_else(|| Bound::Value(self.invalid(expr, vec![op]))),
                None => Bound::Value(self.invalid(expr, vec![op])),
            },
            Bound::MethodGroup { receiver, .. } => {
                let children = match receiver {
                    Receiver::Instance(op) => vec![op],
                    Receiver::Type | Receiver::Implicit => vec![],
                };
                Bound::Value(self.invalid(expr, children))
            }
        }
    }

    fn bind_invocation(&mut self, expr: &Expr, callee: &Expr, arguments: &[Expr]) -> OperationId {
        let callee = self.bind_expr(callee);
        let args: Vec<OperationId> = arguments.iter().map(|arg| self.bind_value(arg)).collect();
        let (owner, name, receiver) = match callee {
            Bound::MethodGroup {
                owner,
                name,
                receiver,
            } => (owner, name, receiver),
            Bound::Value(op) => {
                let children = std::iter::once(op).chain(args).collect();
                return self.invalid(expr, children);
            }
            Bound::Type(_) | Bound::Namespace(_) => return self.invalid(expr, args),
        };

        let chosen = self.resolve_overload(owner, &name, &args);
        let is_static_call = chosen.is_some_and(|(_, _, is_static)| is_static);
        let instance = match receiver {
            Receiver::Instance(op) => Some(op),
            Receiver::Implicit if chosen.is_some() && !is_static_call && !self.in_static => {
                Some(self.implicit_this(expr))
            }
            Receiver::Implicit | Receiver::Type => None,
        };
        let Some((method, return_type, _)) = chosen else {
            return self.alloc(
                OperationKind::Invocation {
                    method: None,
                    instance,
                    arguments: args,
                },
                None,
                Self::syntax(expr),
                false,
            );
        };

        let parameter_types: Vec<Option<TypeId>> = self
            .compilation
            .member(method)
            .as_method()
            .map(|m| m.parameters.iter().map(|p| p.ty).collect())
            .unwrap_or_default();
        let arguments = args
            .into_iter()
            .zip(arguments)
            .zip(parameter_types)
            .map(|((arg, written), ty)| self.convert(arg, written, ty))
            .collect();
        self.alloc(
            OperationKind::Invocation {
                method: Some(method),
                instance,
                arguments,
            },
            return_type,
            Self::syntax(expr),
            false,
        )
    }

    /// Pick the applicable overload with the most exact argument matches,
    /// preferring earlier candidates on ties.
    fn resolve_overload(
        &self,
        owner: TypeId,
        name: &str,
        args: &[OperationId],
    ) -> Option<(MemberRef, Option<TypeId>, bool)> {
        let mut best: Option<(usize, MemberRef, Option<TypeId>, bool)> = None;
        for (member_ref, member) in self.compilation.members_named(owner, name) {
            let Some(method) = member.as_method() else {
                continue;
            };
            if method.parameters.len() != args.len() {
                continue;
            }
            let mut exact = 0;
            let applicable = method.parameters.iter().zip(args).all(|(param, arg)| {
                let Some(param_ty) = param.ty else {
                    return false;
                };
                let conversion = self.compilation.classify_implicit(
                    self.type_of(*arg),
                    self.is_null_literal(*arg),
                    param_ty,
                );
                if conversion.is_identity() {
                    exact += 1;
                }
                conversion.exists()
            });
            if applicable && best.is_none_or(|(score, ..)| exact > score) {
                best = Some((exact, member_ref, method.return_type, method.is_static));
            }
        }
        best.map(|(_, member_ref, return_type, is_static)| (member_ref, return_type, is_static))
    }

    fn bind_unary(&mut self, expr: &Expr, op: UnaryOp, operand: &Expr) -> OperationId {
        let value = self.bind_value(operand);
        match op {
            UnaryOp::PreIncrement | UnaryOp::PreDecrement => self.alloc(
                OperationKind::Increment {
                    operand: value,
                    is_increment: op == UnaryOp::PreIncrement,
                    is_postfix: false,
                },
                self.type_of(value),
                Self::syntax(expr),
                false,
            ),
            UnaryOp::Not => {
                let boolean = self.special(SpecialType::Boolean);
                let value = self.convert(value, operand, boolean);
                self.alloc(
                    OperationKind::Unary { operator: op, operand: value },
                    boolean,
                    Self::syntax(expr),
                    false,
                )
            }
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => {
                let promoted = self.numeric_of(self.type_of(value)).map(|special| {
                    match (op, unary_promotion(special)) {
                        (UnaryOp::Minus, SpecialType::UInt32) => SpecialType::Int64,
                        (_, promoted) => promoted,
                    }
                });
                let (value, ty) = match promoted {
                    Some(promoted) => {
                        let value = self.convert_special(value, operand, promoted);
                        (value, self.special(promoted))
                    }
                    None => (value, None),
                };
                self.alloc(
                    OperationKind::Unary { operator: op, operand: value },
                    ty,
                    Self::syntax(expr),
                    false,
                )
            }
        }
    }

    /// An operand of string concatenation: `null` becomes a string and other
    /// non-string values are converted to `object`.
    fn concat_operand(&mut self, op: OperationId, written: &Expr) -> OperationId {
        if self.is_string(self.type_of(op)) {
            op
        } else if self.is_null_literal(op) {
            self.convert_special(op, written, SpecialType::String)
        } else {
            self.convert_special(op, written, SpecialType::Object)
        }
    }

    /// Left-nested chains such as `"x" + a + b + ...` are walked down their
    /// left spine and bound bottom-up, so chain length costs no stack.
    fn bind_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> OperationId {
        let mut spine = vec![(expr, op, right)];
        let mut bottom = left;
        while let ExprKind::Binary { op, left, right } = &bottom.kind {
            spine.push((bottom, *op, right.as_ref()));
            bottom = left.as_ref();
        }

        let mut l = self.bind_value(bottom);
        let mut written = bottom;
        for (expr, op, right) in spine.into_iter().rev() {
            let r = self.bind_value(right);
            l = self.combine_binary(expr, op, (l, written), (r, right));
            written = expr;
        }
        l
    }

    fn combine_binary(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        (l, left): (OperationId, &Expr),
        (r, right): (OperationId, &Expr),
    ) -> OperationId {
        let (lt, rt) = (self.type_of(l), self.type_of(r));
        let boolean = self.special(SpecialType::Boolean);
        let numeric = self
            .numeric_of(lt)
            .zip(self.numeric_of(rt))
            .and_then(|(a, b)| binary_promotion(a, b));

        let (l, r, ty) = match op {
            BinaryOp::Add if self.is_string(lt) || self.is_string(rt) => {
                let l = self.concat_operand(l, left);
                let r = self.concat_operand(r, right);
                (l, r, self.special(SpecialType::String))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
                if numeric.is_some() =>
            {
                let promoted = numeric.and_then(|special| self.special(special));
                let l = self.convert(l, left, promoted);
                let r = self.convert(r, right, promoted);
                (l, r, promoted)
            }
            BinaryOp::Shl => {
                let promoted = self
                    .numeric_of(lt)
                    .map(unary_promotion)
                    .and_then(|special| self.special(special));
                let l = self.convert(l, left, promoted);
                let r = self.convert_special(r, right, SpecialType::Int32);
                (l, r, promoted)
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
                if boolean.is_some() && lt == boolean && rt == boolean =>
            {
                (l, r, boolean)
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor if numeric.is_some() => {
                let promoted = numeric.and_then(|special| self.special(special));
                let l = self.convert(l, left, promoted);
                let r = self.convert(r, right, promoted);
                (l, r, promoted)
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => {
                let promoted = numeric.and_then(|special| self.special(special));
                let l = self.convert(l, left, promoted);
                let r = self.convert(r, right, promoted);
                (l, r, boolean)
            }
            BinaryOp::And | BinaryOp::Or => {
                let l = self.convert(l, left, boolean);
                let r = self.convert(r, right, boolean);
                (l, r, boolean)
            }
            BinaryOp::Coalesce => (l, r, lt.or(rt)),
            _ => (l, r, None),
        };
        self.alloc(
            OperationKind::Binary {
                operator: op,
                left: l,
                right: r,
            },
            ty,
            Self::syntax(expr),
            false,
        )
    }

    fn bind_assignment(
        &mut self,
        expr: &Expr,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
    ) -> OperationId {
        let target_op = self.bind_value(target);
        let value_op = self.bind_value(value);
        let target_ty = self.type_of(target_op);
        let kind = match op {
            AssignOp::Assign => OperationKind::SimpleAssignment {
                target: target_op,
                value: self.convert(value_op, value, target_ty),
            },
            AssignOp::Compound(operator) => {
                let value_op = if operator == BinaryOp::Add && self.is_string(target_ty) {
                    self.concat_operand(value_op, value)
                } else {
                    let promoted = self
                        .numeric_of(target_ty)
                        .zip(self.numeric_of(self.type_of(value_op)))
                        .and_then(|(a, b)| binary_promotion(a, b))
                        .and_then(|special| self.special(special));
                    self.convert(value_op, value, promoted)
                };
                OperationKind::CompoundAssignment {
                    operator,
                    target: target_op,
                    value: value_op,
                }
            }
        };
        self.alloc(kind, target_ty, Self::syntax(expr), false)
    }

    fn bind_conditional(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        when_true: &Expr,
        when_false: &Expr,
    ) -> OperationId {
        let boolean = self.special(SpecialType::Boolean);
        let condition = self.bind_converted(condition, boolean);
        let a = self.bind_value(when_true);
        let b = self.bind_value(when_false);
        let ty = match (self.type_of(a), self.type_of(b)) {
            (Some(ta), Some(tb)) if ta == tb => Some(ta),
            (Some(ta), None) if self.is_null_literal(b) => Some(ta),
            (None, Some(tb)) if self.is_null_literal(a) => Some(tb),
            (Some(ta), Some(tb)) => {
                if self.compilation.classify_implicit(Some(ta), false, tb).exists() {
                    Some(tb)
                } else if self.compilation.classify_implicit(Some(tb), false, ta).exists() {
                    Some(ta)
                } else {
                    None
                }
            }
            _ => None,
        };
        let when_true = self.convert(a, when_true, ty);
        let when_false = self.convert(b, when_false, ty);
        self.alloc(
            OperationKind::Conditional {
                condition,
                when_true,
                when_false,
            },
            ty,
            Self::syntax(expr),
            false,
        )
    }
}
