//! Bound operation tree: the typed, resolved view of one document's bodies.
use crate::model::{Conversion, MemberRef, TypeId};
use crate::range::TextRange;
use crate::syntax::ast::{BinaryOp, LiteralKind, NodeId, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u32);

/// The syntax an operation was bound from. Statements have no `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxRef {
    pub node: Option<NodeId>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Block(Vec<OperationId>),
    VariableDeclaration {
        name: String,
        initializer: Option<OperationId>,
    },
    ExpressionStatement(OperationId),
    Return(Option<OperationId>),
    If {
        condition: OperationId,
        when_true: OperationId,
        when_false: Option<OperationId>,
    },
    Loop {
        initializer: Option<OperationId>,
        condition: Option<OperationId>,
        iterators: Vec<OperationId>,
        body: OperationId,
    },
    Empty,

    Literal(LiteralKind),
    LocalReference(String),
    ParameterReference(String),
    InstanceReference,
    FieldReference {
        field: MemberRef,
        instance: Option<OperationId>,
    },
    PropertyReference {
        property: MemberRef,
        instance: Option<OperationId>,
    },
    Invocation {
        method: Option<MemberRef>,
        instance: Option<OperationId>,
        arguments: Vec<OperationId>,
    },
    ObjectCreation {
        arguments: Vec<OperationId>,
    },
    ElementAccess {
        instance: OperationId,
        arguments: Vec<OperationId>,
    },
    Unary {
        operator: UnaryOp,
        operand: OperationId,
    },
    Increment {
        operand: OperationId,
        is_increment: bool,
        is_postfix: bool,
    },
    Binary {
        operator: BinaryOp,
        left: OperationId,
        right: OperationId,
    },
    SimpleAssignment {
        target: OperationId,
        value: OperationId,
    },
    CompoundAssignment {
        operator: BinaryOp,
        target: OperationId,
        value: OperationId,
    },
    Conditional {
        condition: OperationId,
        when_true: OperationId,
        when_false: OperationId,
    },
    Conversion {
        operand: OperationId,
        conversion: Conversion,
    },
    /// Something that failed to bind; children are kept for traversal.
    Invalid(Vec<OperationId>),
}

impl OperationKind {
    /// Child operations in source order.
    pub fn children(&self) -> Vec<OperationId> {
        match self {
            Self::Block(items) | Self::Invalid(items) | Self::ObjectCreation { arguments: items } => {
                items.clone()
            }
            Self::VariableDeclaration { initializer, .. } => initializer.iter().copied().collect(),
            Self::ExpressionStatement(op)
            | Self::Unary { operand: op, .. }
            | Self::Increment { operand: op, .. }
            | Self::Conversion { operand: op, .. } => vec![*op],
            Self::Return(value) => value.iter().copied().collect(),
            Self::If {
                condition,
                when_true,
                when_false,
            } => std::iter::once(*condition)
                .chain(std::iter::once(*when_true))
                .chain(when_false.iter().copied())
                .collect(),
            Self::Loop {
                initializer,
                condition,
                iterators,
                body,
            } => initializer
                .iter()
                .chain(condition.iter())
                .chain(iterators.iter())
                .chain(std::iter::once(body))
                .copied()
                .collect(),
            Self::Empty
            | Self::Literal(_)
            | Self::LocalReference(_)
            | Self::ParameterReference(_)
            | Self::InstanceReference => vec![],
            Self::FieldReference { instance, .. } | Self::PropertyReference { instance, .. } => {
                instance.iter().copied().collect()
            }
            Self::Invocation {
                instance,
                arguments,
                ..
            } => instance.iter().chain(arguments.iter()).copied().collect(),
            Self::ElementAccess {
                instance,
                arguments,
            } => std::iter::once(instance)
                .chain(arguments.iter())
                .copied()
                .collect(),
            Self::Binary { left, right, .. }
            | Self::SimpleAssignment {
                target: left,
                value: right,
            }
            | Self::CompoundAssignment {
                target: left,
                value: right,
                ..
            } => vec![*left, *right],
            Self::Conditional {
                condition,
                when_true,
                when_false,
            } => vec![*condition, *when_true, *when_false],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    /// Static type; `None` for statements, `null` and unresolved expressions.
    pub ty: Option<TypeId>,
    pub syntax: SyntaxRef,
    /// Inserted by the binder rather than written by the author.
    pub is_implicit: bool,
    pub parent: Option<OperationId>,
}

/// All operations bound from one document.
#[derive(Debug, Clone, Default)]
pub struct BoundUnit {
    operations: Vec<Operation>,
    roots: Vec<OperationId>,
}

impl BoundUnit {
    pub(crate) fn alloc(
        &mut self,
        kind: OperationKind,
        ty: Option<TypeId>,
        syntax: SyntaxRef,
        is_implicit: bool,
    ) -> OperationId {
        let id = OperationId(self.operations.len() as u32);
        for child in kind.children() {
            self.operations[child.0 as usize].parent = Some(id);
        }
        self.operations.push(Operation {
            kind,
            ty,
            syntax,
            is_implicit,
            parent: None,
        });
        id
    }

    pub(crate) fn push_root(&mut self, root: OperationId) {
        self.roots.push(root);
    }

    pub fn get(&self, id: OperationId) -> &Operation {
        &self.operations[id.0 as usize]
    }

    pub fn parent(&self, id: OperationId) -> Option<&Operation> {
        self.get(id).parent.map(|parent| self.get(parent))
    }

    pub fn roots(&self) -> &[OperationId] {
        &self.roots
    }

    /// Every operation in document order, each visited once.
    pub fn descendants(&self) -> impl Iterator<Item = OperationId> + '_ {
        let mut stack: Vec<OperationId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.get(id).kind.children().into_iter().rev());
            Some(id)
        })
    }

    /// Conversion operations in document order.
    pub fn conversions(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.descendants()
            .filter(|id| matches!(self.get(*id).kind, OperationKind::Conversion { .. }))
    }
}
