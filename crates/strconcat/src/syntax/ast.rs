//! Syntax tree for the checked C# subset.
//!
//! Nodes own their data and carry the byte range they cover in the text they
//! were parsed from. Expressions additionally carry a [`NodeId`] unique within
//! one tree.
use crate::range::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub range: TextRange,
}

/// `A.B.C`, optionally prefixed with `global::`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub global: bool,
    pub parts: Vec<Ident>,
    pub range: TextRange,
}

impl QualifiedName {
    /// Dotted form without the `global::` prefix.
    pub fn dotted(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn last(&self) -> &Ident {
        // Invariant: the parser never builds an empty name.
        &self.parts[self.parts.len() - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedType {
    Object,
    String,
    Bool,
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
    Void,
}

impl PredefinedType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "object" => Self::Object,
            "string" => Self::String,
            "bool" => Self::Bool,
            "char" => Self::Char,
            "sbyte" => Self::SByte,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "ushort" => Self::UShort,
            "int" => Self::Int,
            "uint" => Self::UInt,
            "long" => Self::Long,
            "ulong" => Self::ULong,
            "float" => Self::Float,
            "double" => Self::Double,
            "decimal" => Self::Decimal,
            "void" => Self::Void,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    Predefined(PredefinedType, TextRange),
    Named(QualifiedName),
    Nullable(Box<TypeSyntax>, TextRange),
    Array(Box<TypeSyntax>, TextRange),
    /// `var` in a local declaration.
    Implicit(TextRange),
}

impl TypeSyntax {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Predefined(_, range)
            | Self::Nullable(_, range)
            | Self::Array(_, range)
            | Self::Implicit(range) => *range,
            Self::Named(name) => name.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    pub is_global: bool,
    pub is_static: bool,
    pub alias: Option<Ident>,
    pub name: QualifiedName,
    pub range: TextRange,
}

impl UsingDirective {
    /// A plain `using N;` that brings a namespace's types into scope.
    pub const fn imports_namespace(&self) -> bool {
        !self.is_static && self.alias.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceMember {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub name: QualifiedName,
    pub file_scoped: bool,
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    pub range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<String>,
    pub name: Ident,
    pub bases: Vec<TypeSyntax>,
    pub members: Vec<MemberDecl>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: TypeSyntax,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarator {
    pub name: Ident,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Block(Block),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// `get`, `set` or `init`.
    pub keyword: String,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyBody {
    Accessors(Vec<Accessor>),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field {
        attributes: Vec<Attribute>,
        modifiers: Vec<String>,
        ty: TypeSyntax,
        declarators: Vec<VariableDeclarator>,
        range: TextRange,
    },
    Property {
        attributes: Vec<Attribute>,
        modifiers: Vec<String>,
        ty: TypeSyntax,
        name: Ident,
        body: PropertyBody,
        initializer: Option<Expr>,
        range: TextRange,
    },
    /// Methods and constructors; constructors have no return type.
    Method {
        attributes: Vec<Attribute>,
        modifiers: Vec<String>,
        return_type: Option<TypeSyntax>,
        name: Ident,
        parameters: Vec<Parameter>,
        body: Option<Body>,
        range: TextRange,
    },
}

pub fn is_static(modifiers: &[String]) -> bool {
    modifiers.iter().any(|m| m == "static" || m == "const")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(Block),
    Local {
        ty: TypeSyntax,
        declarators: Vec<VariableDeclarator>,
        range: TextRange,
    },
    Expression(Expr),
    Return {
        value: Option<Expr>,
        range: TextRange,
    },
    If {
        condition: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
        range: TextRange,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        range: TextRange,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        iterators: Vec<Expr>,
        body: Box<Stmt>,
        range: TextRange,
    },
    Empty(TextRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    InterpolatedString,
    Char,
    Integer,
    Real,
    True,
    False,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn from_token(text: &str) -> Option<Self> {
        Some(match text {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "<<" => Self::Shl,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "&&" => Self::And,
            "||" => Self::Or,
            "??" => Self::Coalesce,
            _ => return None,
        })
    }

    /// Binding power; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Coalesce => 1,
            Self::Or => 2,
            Self::And => 3,
            Self::BitOr => 4,
            Self::BitXor => 5,
            Self::BitAnd => 6,
            Self::Eq | Self::Ne => 7,
            Self::Lt | Self::Gt | Self::Le | Self::Ge => 8,
            Self::Shl => 9,
            Self::Add | Self::Sub => 10,
            Self::Mul | Self::Div | Self::Rem => 11,
        }
    }
}

/// `=` or a compound assignment such as `+=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

impl AssignOp {
    pub fn from_token(text: &str) -> Option<Self> {
        Some(match text {
            "=" => Self::Assign,
            "+=" => Self::Compound(BinaryOp::Add),
            "-=" => Self::Compound(BinaryOp::Sub),
            "*=" => Self::Compound(BinaryOp::Mul),
            "/=" => Self::Compound(BinaryOp::Div),
            "%=" => Self::Compound(BinaryOp::Rem),
            "&=" => Self::Compound(BinaryOp::BitAnd),
            "|=" => Self::Compound(BinaryOp::BitOr),
            "^=" => Self::Compound(BinaryOp::BitXor),
            "<<=" => Self::Compound(BinaryOp::Shl),
            "??=" => Self::Compound(BinaryOp::Coalesce),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub id: NodeId,
    pub range: TextRange,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(LiteralKind),
    Name(Ident),
    /// A keyword type used as a receiver, as in `int.MaxValue`.
    PredefinedType(PredefinedType),
    This,
    Parenthesized(Box<Expr>),
    MemberAccess {
        receiver: Box<Expr>,
        name: Ident,
    },
    Invocation {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    ElementAccess {
        receiver: Box<Expr>,
        arguments: Vec<Expr>,
    },
    ObjectCreation {
        ty: TypeSyntax,
        arguments: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `x++` (`increment == true`) or `x--`.
    Postfix {
        increment: bool,
        operand: Box<Expr>,
    },
    Cast {
        ty: TypeSyntax,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
}

impl Expr {
    /// Whether the expression can be the receiver of a member access without
    /// parentheses.
    pub const fn is_primary(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Literal(_)
                | ExprKind::Name(_)
                | ExprKind::PredefinedType(_)
                | ExprKind::This
                | ExprKind::Parenthesized(_)
                | ExprKind::MemberAccess { .. }
                | ExprKind::Invocation { .. }
                | ExprKind::ElementAccess { .. }
                | ExprKind::ObjectCreation { .. }
                | ExprKind::Postfix { .. }
        )
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::PredefinedType(_)
            | ExprKind::This => vec![],
            ExprKind::Parenthesized(inner) => vec![inner.as_ref()],
            ExprKind::MemberAccess { receiver, .. } => vec![receiver.as_ref()],
            ExprKind::Invocation {
                callee: receiver,
                arguments,
            }
            | ExprKind::ElementAccess {
                receiver,
                arguments,
            } => std::iter::once(receiver.as_ref())
                .chain(arguments.iter())
                .collect(),
            ExprKind::ObjectCreation { arguments, .. } => arguments.iter().collect(),
            ExprKind::Unary { operand, .. }
            | ExprKind::Postfix { operand, .. }
            | ExprKind::Cast { operand, .. } => vec![operand.as_ref()],
            ExprKind::Binary { left, right, .. }
            | ExprKind::Assignment {
                target: left,
                value: right,
                ..
            } => vec![left.as_ref(), right.as_ref()],
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => vec![condition.as_ref(), when_true.as_ref(), when_false.as_ref()],
        }
    }
}

/// Pre-order walk over every expression of the unit, with nesting depth.
pub fn walk_expressions<'t>(unit: &'t CompilationUnit, f: &mut impl FnMut(&'t Expr, usize)) {
    for member in &unit.members {
        walk_namespace_member(member, f);
    }
}

fn walk_namespace_member<'t>(member: &'t NamespaceMember, f: &mut impl FnMut(&'t Expr, usize)) {
    match member {
        NamespaceMember::Namespace(ns) => {
            for member in &ns.members {
                walk_namespace_member(member, f);
            }
        }
        NamespaceMember::Type(ty) => {
            for member in &ty.members {
                walk_member(member, f);
            }
        }
    }
}

fn walk_member<'t>(member: &'t MemberDecl, f: &mut impl FnMut(&'t Expr, usize)) {
    match member {
        MemberDecl::Field { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &declarator.initializer {
                    walk_expr(init, 0, f);
                }
            }
        }
        MemberDecl::Property {
            body, initializer, ..
        } => {
            match body {
                PropertyBody::Expression(expr) => walk_expr(expr, 0, f),
                PropertyBody::Accessors(accessors) => {
                    for body in accessors.iter().filter_map(|a| a.body.as_ref()) {
                        walk_body(body, f);
                    }
                }
            }
            if let Some(init) = initializer {
                walk_expr(init, 0, f);
            }
        }
        MemberDecl::Method { body, .. } => {
            if let Some(body) = body {
                walk_body(body, f);
            }
        }
    }
}

fn walk_body<'t>(body: &'t Body, f: &mut impl FnMut(&'t Expr, usize)) {
    match body {
        Body::Block(block) => walk_block(block, f),
        Body::Expression(expr) => walk_expr(expr, 0, f),
    }
}

fn walk_block<'t>(block: &'t Block, f: &mut impl FnMut(&'t Expr, usize)) {
    for stmt in &block.statements {
        walk_stmt(stmt, f);
    }
}

fn walk_stmt<'t>(stmt: &'t Stmt, f: &mut impl FnMut(&'t Expr, usize)) {
    match stmt {
        Stmt::Block(block) => walk_block(block, f),
        Stmt::Local { declarators, .. } => {
            for init in declarators.iter().filter_map(|d| d.initializer.as_ref()) {
                walk_expr(init, 0, f);
            }
        }
        Stmt::Expression(expr) => walk_expr(expr, 0, f),
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                walk_expr(value, 0, f);
            }
        }
        Stmt::If {
            condition,
            then,
            otherwise,
            ..
        } => {
            walk_expr(condition, 0, f);
            walk_stmt(then, f);
            if let Some(otherwise) = otherwise {
                walk_stmt(otherwise, f);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            walk_expr(condition, 0, f);
            walk_stmt(body, f);
        }
        Stmt::For {
            initializer,
            condition,
            iterators,
            body,
            ..
        } => {
            if let Some(init) = initializer {
                walk_stmt(init, f);
            }
            if let Some(condition) = condition {
                walk_expr(condition, 0, f);
            }
            for iterator in iterators {
                walk_expr(iterator, 0, f);
            }
            walk_stmt(body, f);
        }
        Stmt::Empty(_) => {}
    }
}

fn walk_expr<'t>(expr: &'t Expr, depth: usize, f: &mut impl FnMut(&'t Expr, usize)) {
    // Explicit stack: operator chains nest as deep as they are long.
    let mut stack = vec![(expr, depth)];
    while let Some((expr, depth)) = stack.pop() {
        f(expr, depth);
        stack.extend(expr.children().into_iter().rev().map(|child| (child, depth + 1)));
    }
}
