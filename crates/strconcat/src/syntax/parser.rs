//! Recursive-descent parser for the checked C# subset.
//!
//! Constructs outside the subset (generics, lambdas, `switch`, ...) are
//! reported as syntax errors rather than guessed at.
use super::ast::*;
use super::lexer::{Token, TokenKind};
use crate::error::{Error, Result};
use crate::range::TextRange;

const MODIFIERS: [&str; 13] = [
    "public", "private", "protected", "internal", "static", "abstract", "sealed", "readonly",
    "override", "virtual", "const", "extern", "new",
];

// Contextual modifiers: only modifiers when followed by another word.
const CONTEXTUAL_MODIFIERS: [&str; 2] = ["partial", "async"];

pub(crate) struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    next_id: u32,
}

impl<'a> Parser<'a> {
    pub(crate) const fn new(text: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
            next_id: 0,
        }
    }

    // --- token helpers ---------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n)
    }

    fn at_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    fn at_contextual(&self, word: &str) -> bool {
        self.peek().and_then(Token::identifier) == Some(word)
    }

    fn at_identifier(&self) -> bool {
        self.peek().is_some_and(|t| t.kind() == TokenKind::Identifier)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.text.len(), |t| t.range().start())
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map_or(0, |t| t.range().end())
    }

    fn range_from(&self, start: usize) -> TextRange {
        TextRange::new(start, self.prev_end().max(start))
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        let found = self.peek().map_or("end of input", Token::text);
        Err(Error::syntax(
            format!("{} (found `{found}`)", message.into()),
            self.offset(),
        ))
    }

    fn expect_punct(&mut self, punct: &str) -> Result<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            self.error(format!("expected `{punct}`"))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident> {
        match self.peek() {
            Some(token) if token.kind() == TokenKind::Identifier => {
                let ident = Ident {
                    name: token.identifier().unwrap_or_default().to_string(),
                    range: token.range(),
                };
                self.pos += 1;
                Ok(ident)
            }
            _ => self.error("expected identifier"),
        }
    }

    fn mk(&mut self, range: TextRange, kind: ExprKind) -> Expr {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Expr { id, range, kind }
    }

    // --- declarations ----------------------------------------------------

    pub(crate) fn parse_compilation_unit(&mut self) -> Result<CompilationUnit> {
        let usings = self.parse_usings()?;
        let members = self.parse_namespace_members()?;
        if self.peek().is_some() {
            return self.error("expected a namespace or type declaration");
        }
        Ok(CompilationUnit {
            usings,
            members,
            range: TextRange::new(0, self.text.len()),
        })
    }

    fn parse_usings(&mut self) -> Result<Vec<UsingDirective>> {
        let mut usings = Vec::new();
        loop {
            let start = self.offset();
            let is_global = self.at_contextual("global")
                && self.peek_nth(1).is_some_and(|t| t.is_keyword("using"));
            if is_global {
                self.pos += 1;
            }
            if !self.eat_keyword("using") {
                break;
            }
            let is_static = self.eat_keyword("static");
            let alias = if self.at_identifier() && self.peek_nth(1).is_some_and(|t| t.is_punct("="))
            {
                let alias = self.expect_ident()?;
                self.pos += 1;
                Some(alias)
            } else {
                None
            };
            let name = self.parse_qualified_name()?;
            self.expect_punct(";")?;
            usings.push(UsingDirective {
                is_global,
                is_static,
                alias,
                name,
                range: self.range_from(start),
            });
        }
        Ok(usings)
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let start = self.offset();
        let global = self.at_contextual("global") && self.peek_nth(1).is_some_and(|t| t.is_punct("::"));
        if global {
            self.pos += 2;
        }
        let mut parts = vec![self.expect_ident()?];
        while self.at_punct(".")
            && self
                .peek_nth(1)
                .is_some_and(|t| t.kind() == TokenKind::Identifier)
        {
            self.pos += 1;
            parts.push(self.expect_ident()?);
        }
        Ok(QualifiedName {
            global,
            parts,
            range: self.range_from(start),
        })
    }

    fn parse_namespace_members(&mut self) -> Result<Vec<NamespaceMember>> {
        let mut members = Vec::new();
        while self.peek().is_some() && !self.at_punct("}") {
            if self.at_keyword("namespace") {
                members.push(NamespaceMember::Namespace(self.parse_namespace()?));
            } else {
                members.push(NamespaceMember::Type(self.parse_type_decl()?));
            }
        }
        Ok(members)
    }

    fn parse_namespace(&mut self) -> Result<NamespaceDecl> {
        let start = self.offset();
        self.bump();
        let name = self.parse_qualified_name()?;
        let file_scoped = self.eat_punct(";");
        if !file_scoped {
            self.expect_punct("{")?;
        }
        let usings = self.parse_usings()?;
        let members = self.parse_namespace_members()?;
        if !file_scoped {
            self.expect_punct("}")?;
        }
        Ok(NamespaceDecl {
            name,
            file_scoped,
            usings,
            members,
            range: self.range_from(start),
        })
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while self.at_punct("[") {
            self.bump();
            loop {
                let start = self.offset();
                let name = self.parse_qualified_name()?;
                if self.at_punct("(") {
                    self.skip_balanced("(", ")")?;
                }
                attributes.push(Attribute {
                    name,
                    range: self.range_from(start),
                });
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct("]")?;
        }
        Ok(attributes)
    }

    fn skip_balanced(&mut self, open: &str, close: &str) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let Some(token) = self.bump() else {
                return self.error(format!("expected `{close}`"));
            };
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
    }

    fn parse_modifiers(&mut self) -> Vec<String> {
        let mut modifiers = Vec::new();
        while let Some(token) = self.peek() {
            let text = token.text();
            let is_modifier = (token.kind() == TokenKind::Keyword && MODIFIERS.contains(&text))
                || (CONTEXTUAL_MODIFIERS.contains(&text)
                    && self.peek_nth(1).is_some_and(|t| {
                        matches!(t.kind(), TokenKind::Identifier | TokenKind::Keyword)
                    }));
            if !is_modifier {
                break;
            }
            modifiers.push(text.to_string());
            self.pos += 1;
        }
        modifiers
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl> {
        let start = self.offset();
        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers();
        let kind = if self.eat_keyword("class") {
            TypeDeclKind::Class
        } else if self.eat_keyword("struct") {
            TypeDeclKind::Struct
        } else if self.eat_keyword("interface") {
            TypeDeclKind::Interface
        } else {
            return self.error("expected `class`, `struct` or `interface`");
        };
        let name = self.expect_ident()?;
        let mut bases = Vec::new();
        if self.eat_punct(":") {
            loop {
                bases.push(self.parse_type()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            if self.peek().is_none() {
                return self.error("expected `}`");
            }
            members.push(self.parse_member(&name.name)?);
        }
        self.bump();
        self.eat_punct(";");
        Ok(TypeDecl {
            kind,
            attributes,
            modifiers,
            name,
            bases,
            members,
            range: self.range_from(start),
        })
    }

    fn parse_member(&mut self, type_name: &str) -> Result<MemberDecl> {
        let start = self.offset();
        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers();

        if ["class", "struct", "interface"]
            .iter()
            .any(|kw| self.at_keyword(kw))
        {
            return self.error("nested types are not supported");
        }

        // Constructor
        if self.at_contextual(type_name) && self.peek_nth(1).is_some_and(|t| t.is_punct("(")) {
            let name = self.expect_ident()?;
            let parameters = self.parse_parameters()?;
            if self.eat_punct(":") {
                // `: base(...)` / `: this(...)`
                self.bump();
                self.skip_balanced("(", ")")?;
            }
            let body = self.parse_method_body()?;
            return Ok(MemberDecl::Method {
                attributes,
                modifiers,
                return_type: None,
                name,
                parameters,
                body,
                range: self.range_from(start),
            });
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;

        if self.at_punct("(") {
            let parameters = self.parse_parameters()?;
            let body = self.parse_method_body()?;
            return Ok(MemberDecl::Method {
                attributes,
                modifiers,
                return_type: Some(ty),
                name,
                parameters,
                body,
                range: self.range_from(start),
            });
        }

        if self.eat_punct("=>") {
            let expr = self.parse_expr()?;
            self.expect_punct(";")?;
            return Ok(MemberDecl::Property {
                attributes,
                modifiers,
                ty,
                name,
                body: PropertyBody::Expression(expr),
                initializer: None,
                range: self.range_from(start),
            });
        }

        if self.at_punct("{") {
            let accessors = self.parse_accessors()?;
            let initializer = if self.eat_punct("=") {
                let expr = self.parse_expr()?;
                self.expect_punct(";")?;
                Some(expr)
            } else {
                None
            };
            return Ok(MemberDecl::Property {
                attributes,
                modifiers,
                ty,
                name,
                body: PropertyBody::Accessors(accessors),
                initializer,
                range: self.range_from(start),
            });
        }

        let declarators = self.parse_declarators(name)?;
        self.expect_punct(";")?;
        Ok(MemberDecl::Field {
            attributes,
            modifiers,
            ty,
            declarators,
            range: self.range_from(start),
        })
    }

    fn parse_accessors(&mut self) -> Result<Vec<Accessor>> {
        self.expect_punct("{")?;
        let mut accessors = Vec::new();
        while !self.eat_punct("}") {
            self.parse_attributes()?;
            self.parse_modifiers();
            let keyword = match self.peek().and_then(Token::identifier) {
                Some(word @ ("get" | "set" | "init")) => word.to_string(),
                _ => return self.error("expected `get`, `set` or `init`"),
            };
            self.pos += 1;
            let body = self.parse_method_body()?;
            accessors.push(Accessor { keyword, body });
        }
        Ok(accessors)
    }

    fn parse_method_body(&mut self) -> Result<Option<Body>> {
        if self.eat_punct(";") {
            return Ok(None);
        }
        if self.eat_punct("=>") {
            let expr = self.parse_expr()?;
            self.expect_punct(";")?;
            return Ok(Some(Body::Expression(expr)));
        }
        Ok(Some(Body::Block(self.parse_block()?)))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        self.expect_punct("(")?;
        let mut parameters = Vec::new();
        if self.eat_punct(")") {
            return Ok(parameters);
        }
        loop {
            self.parse_attributes()?;
            while ["ref", "out", "in", "params", "this"]
                .iter()
                .any(|kw| self.at_keyword(kw))
            {
                self.pos += 1;
            }
            let ty = self.parse_type()?;
            let name = self.expect_ident()?;
            if self.eat_punct("=") {
                // Default values do not take part in binding.
                self.parse_expr()?;
            }
            parameters.push(Parameter { ty, name });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(parameters)
    }

    fn parse_declarators(&mut self, first: Ident) -> Result<Vec<VariableDeclarator>> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let initializer = if self.eat_punct("=") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            declarators.push(VariableDeclarator { name, initializer });
            if !self.eat_punct(",") {
                break;
            }
            name = self.expect_ident()?;
        }
        Ok(declarators)
    }

    pub(crate) fn parse_type(&mut self) -> Result<TypeSyntax> {
        let start = self.offset();
        let mut ty = match self.peek() {
            Some(token) if token.kind() == TokenKind::Keyword => {
                let Some(predefined) = PredefinedType::from_keyword(token.text()) else {
                    return self.error("expected type");
                };
                let range = token.range();
                self.pos += 1;
                TypeSyntax::Predefined(predefined, range)
            }
            Some(token) if token.kind() == TokenKind::Identifier => {
                TypeSyntax::Named(self.parse_qualified_name()?)
            }
            _ => return self.error("expected type"),
        };
        if self.at_punct("<") {
            return self.error("generic types are not supported");
        }
        loop {
            if self.at_punct("?")
                && self
                    .peek_nth(1)
                    .is_some_and(|t| t.kind() == TokenKind::Identifier || t.is_punct("[") || t.is_punct(")"))
            {
                self.pos += 1;
                ty = TypeSyntax::Nullable(Box::new(ty), self.range_from(start));
            } else if self.at_punct("[") && self.peek_nth(1).is_some_and(|t| t.is_punct("]")) {
                self.pos += 2;
                ty = TypeSyntax::Array(Box::new(ty), self.range_from(start));
            } else {
                break;
            }
        }
        Ok(ty)
    }

    // --- statements ------------------------------------------------------

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.offset();
        self.expect_punct("{")?;
        let mut statements = Vec::new();
        while !self.eat_punct("}") {
            if self.peek().is_none() {
                return self.error("expected `}`");
            }
            statements.push(self.parse_stmt()?);
        }
        Ok(Block {
            statements,
            range: self.range_from(start),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let start = self.offset();
        if self.at_punct("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        if self.eat_punct(";") {
            return Ok(Stmt::Empty(self.range_from(start)));
        }
        if self.eat_keyword("return") {
            let value = if self.at_punct(";") {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect_punct(";")?;
            return Ok(Stmt::Return {
                value,
                range: self.range_from(start),
            });
        }
        if self.eat_keyword("if") {
            self.expect_punct("(")?;
            let condition = self.parse_expr()?;
            self.expect_punct(")")?;
            let then = Box::new(self.parse_stmt()?);
            let otherwise = if self.eat_keyword("else") {
                Some(Box::new(self.parse_stmt()?))
            } else {
                None
            };
            return Ok(Stmt::If {
                condition,
                then,
                otherwise,
                range: self.range_from(start),
            });
        }
        if self.eat_keyword("while") {
            self.expect_punct("(")?;
            let condition = self.parse_expr()?;
            self.expect_punct(")")?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::While {
                condition,
                body,
                range: self.range_from(start),
            });
        }
        if self.eat_keyword("for") {
            return self.parse_for(start);
        }

        if let Some(local) = self.try_parse_local(start)? {
            self.expect_punct(";")?;
            return Ok(local);
        }

        let expr = self.parse_expr()?;
        self.expect_punct(";")?;
        Ok(Stmt::Expression(expr))
    }

    fn parse_for(&mut self, start: usize) -> Result<Stmt> {
        self.expect_punct("(")?;
        let initializer = if self.at_punct(";") {
            None
        } else if let Some(local) = self.try_parse_local(self.offset())? {
            Some(Box::new(local))
        } else {
            Some(Box::new(Stmt::Expression(self.parse_expr()?)))
        };
        self.expect_punct(";")?;
        let condition = if self.at_punct(";") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_punct(";")?;
        let mut iterators = Vec::new();
        while !self.at_punct(")") {
            iterators.push(self.parse_expr()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            initializer,
            condition,
            iterators,
            body,
            range: self.range_from(start),
        })
    }

    /// Parse `Type name [= init], ...` if the upcoming tokens form a local
    /// declaration; otherwise leave the position untouched.
    fn try_parse_local(&mut self, start: usize) -> Result<Option<Stmt>> {
        let saved = self.pos;
        self.eat_keyword("const");

        let ty = if self.at_contextual("var")
            && self
                .peek_nth(1)
                .is_some_and(|t| t.kind() == TokenKind::Identifier)
        {
            let range = self.peek().map(Token::range).unwrap_or_default();
            self.pos += 1;
            TypeSyntax::Implicit(range)
        } else {
            match self.parse_type() {
                Ok(ty) => ty,
                Err(_) => {
                    self.pos = saved;
                    return Ok(None);
                }
            }
        };

        let is_declaration = self.at_identifier()
            && self
                .peek_nth(1)
                .is_some_and(|t| t.is_punct("=") || t.is_punct(";") || t.is_punct(","));
        if !is_declaration {
            self.pos = saved;
            return Ok(None);
        }

        let first = self.expect_ident()?;
        let declarators = self.parse_declarators(first)?;
        Ok(Some(Stmt::Local {
            ty,
            declarators,
            range: self.range_from(start),
        }))
    }

    // --- expressions -----------------------------------------------------

    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        let target = self.parse_conditional()?;
        let Some(op) = self
            .peek()
            .filter(|t| t.kind() == TokenKind::Punctuation)
            .and_then(|t| AssignOp::from_token(t.text()))
        else {
            return Ok(target);
        };
        self.pos += 1;
        let value = self.parse_expr()?;
        let range = target.range.cover(value.range);
        Ok(self.mk(
            range,
            ExprKind::Assignment {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let condition = self.parse_binary(0)?;
        if !self.eat_punct("?") {
            return Ok(condition);
        }
        let when_true = self.parse_expr()?;
        self.expect_punct(":")?;
        let when_false = self.parse_expr()?;
        let range = condition.range.cover(when_false.range);
        Ok(self.mk(
            range,
            ExprKind::Conditional {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
        ))
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        self.peek()
            .filter(|t| t.kind() == TokenKind::Punctuation)
            .and_then(|t| BinaryOp::from_token(t.text()))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            // `??` is right-associative, everything else left-associative.
            let next = if op == BinaryOp::Coalesce {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary(next)?;
            let range = left.range.cover(right.range);
            left = self.mk(
                range,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        if self.at_keyword("is") || self.at_keyword("as") {
            return self.error("type test expressions are not supported");
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.offset();
        let op = match self.peek() {
            Some(t) if t.is_punct("+") => Some(UnaryOp::Plus),
            Some(t) if t.is_punct("-") => Some(UnaryOp::Minus),
            Some(t) if t.is_punct("!") => Some(UnaryOp::Not),
            Some(t) if t.is_punct("~") => Some(UnaryOp::BitNot),
            Some(t) if t.is_punct("++") => Some(UnaryOp::PreIncrement),
            Some(t) if t.is_punct("--") => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            let range = self.range_from(start);
            return Ok(self.mk(
                range,
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }

        if self.at_punct("(") {
            if let Some(ty) = self.try_parse_cast_type() {
                let operand = self.parse_unary()?;
                let range = self.range_from(start);
                return Ok(self.mk(
                    range,
                    ExprKind::Cast {
                        ty,
                        operand: Box::new(operand),
                    },
                ));
            }
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// `(T)` followed by something that can start a cast operand.
    fn try_parse_cast_type(&mut self) -> Option<TypeSyntax> {
        let saved = self.pos;
        self.pos += 1;
        let parsed = self.parse_type().ok().filter(|_| self.eat_punct(")"));
        let Some(ty) = parsed else {
            self.pos = saved;
            return None;
        };

        let mut inner = &ty;
        while let TypeSyntax::Nullable(elem, _) | TypeSyntax::Array(elem, _) = inner {
            inner = elem;
        }
        let keyword_type = matches!(inner, TypeSyntax::Predefined(..));
        let follows_operand = self.peek().is_some_and(|t| match t.kind() {
            TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::Real
            | TokenKind::String
            | TokenKind::Char => true,
            TokenKind::Keyword => !t.is_keyword("is") && !t.is_keyword("as"),
            TokenKind::Punctuation => t.is_punct("(") || t.is_punct("!") || t.is_punct("~"),
        });
        if keyword_type || follows_operand {
            Some(ty)
        } else {
            self.pos = saved;
            None
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let start = self.offset();
        let Some(token) = self.peek().cloned() else {
            return self.error("expected expression");
        };
        let range = token.range();

        let kind = match token.kind() {
            TokenKind::Integer => Some(ExprKind::Literal(LiteralKind::Integer)),
            TokenKind::Real => Some(ExprKind::Literal(LiteralKind::Real)),
            TokenKind::Char => Some(ExprKind::Literal(LiteralKind::Char)),
            TokenKind::String => {
                let text = token.text();
                if text.starts_with('$') || text.starts_with("@$") {
                    Some(ExprKind::Literal(LiteralKind::InterpolatedString))
                } else {
                    Some(ExprKind::Literal(LiteralKind::String))
                }
            }
            TokenKind::Identifier => Some(ExprKind::Name(Ident {
                name: token.identifier().unwrap_or_default().to_string(),
                range,
            })),
            TokenKind::Keyword => match token.text() {
                "true" => Some(ExprKind::Literal(LiteralKind::True)),
                "false" => Some(ExprKind::Literal(LiteralKind::False)),
                "null" => Some(ExprKind::Literal(LiteralKind::Null)),
                "this" => Some(ExprKind::This),
                keyword => PredefinedType::from_keyword(keyword).map(ExprKind::PredefinedType),
            },
            TokenKind::Punctuation => None,
        };
        if let Some(kind) = kind {
            self.pos += 1;
            return Ok(self.mk(range, kind));
        }

        if self.eat_punct("(") {
            let inner = self.parse_expr()?;
            self.expect_punct(")")?;
            let range = self.range_from(start);
            return Ok(self.mk(range, ExprKind::Parenthesized(Box::new(inner))));
        }

        if self.eat_keyword("new") {
            let ty = self.parse_type()?;
            let arguments = if self.at_punct("(") {
                self.parse_arguments("(", ")")?
            } else {
                return self.error("object initializers are not supported");
            };
            if self.at_punct("{") {
                return self.error("object initializers are not supported");
            }
            let range = self.range_from(start);
            return Ok(self.mk(range, ExprKind::ObjectCreation { ty, arguments }));
        }

        self.error("expected expression")
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        let start = expr.range.start();
        loop {
            if self.eat_punct(".") {
                let name = self.expect_ident()?;
                let range = self.range_from(start);
                expr = self.mk(
                    range,
                    ExprKind::MemberAccess {
                        receiver: Box::new(expr),
                        name,
                    },
                );
            } else if self.at_punct("(") {
                let arguments = self.parse_arguments("(", ")")?;
                let range = self.range_from(start);
                expr = self.mk(
                    range,
                    ExprKind::Invocation {
                        callee: Box::new(expr),
                        arguments,
                    },
                );
            } else if self.at_punct("[") {
                let arguments = self.parse_arguments("[", "]")?;
                let range = self.range_from(start);
                expr = self.mk(
                    range,
                    ExprKind::ElementAccess {
                        receiver: Box::new(expr),
                        arguments,
                    },
                );
            } else if self.at_punct("++") || self.at_punct("--") {
                let increment = self.at_punct("++");
                self.pos += 1;
                let range = self.range_from(start);
                expr = self.mk(
                    range,
                    ExprKind::Postfix {
                        increment,
                        operand: Box::new(expr),
                    },
                );
            } else if self.at_punct("?.") || self.at_punct("=>") {
                return self.error("null-conditional access and lambdas are not supported");
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self, open: &str, close: &str) -> Result<Vec<Expr>> {
        self.expect_punct(open)?;
        let mut arguments = Vec::new();
        if self.eat_punct(close) {
            return Ok(arguments);
        }
        loop {
            // Named arguments bind positionally.
            if self.at_identifier() && self.peek_nth(1).is_some_and(|t| t.is_punct(":")) {
                self.pos += 2;
            }
            while self.at_keyword("ref") || self.at_keyword("out") || self.at_keyword("in") {
                self.pos += 1;
            }
            arguments.push(self.parse_expr()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(close)?;
        Ok(arguments)
    }
}
