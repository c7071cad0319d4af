pub mod ast;
pub mod lexer;
mod parser;

use crate::error::Result;
use crate::range::TextRange;
use ast::{CompilationUnit, Expr, walk_expressions};

/// An owned `#` directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveLine {
    pub range: TextRange,
    pub text: String,
}

/// Immutable parse of one document's text.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    unit: CompilationUnit,
    directives: Vec<DirectiveLine>,
    header: Option<TextRange>,
}

/// Parse `text` into a [`SyntaxTree`].
pub fn parse(text: &str) -> Result<SyntaxTree> {
    let lexed = lexer::tokenize(text)?;
    let directives = lexed
        .directives()
        .iter()
        .map(|d| DirectiveLine {
            range: d.range,
            text: d.text.to_string(),
        })
        .collect();
    let header = lexed.header();
    let mut parser = parser::Parser::new(text, lexed.into_tokens());
    let unit = parser.parse_compilation_unit()?;
    Ok(SyntaxTree {
        unit,
        directives,
        header,
    })
}

/// Parse a standalone expression, as used when testing rewrites.
pub fn parse_expression(text: &str) -> Result<Expr> {
    let lexed = lexer::tokenize(text)?;
    let mut parser = parser::Parser::new(text, lexed.into_tokens());
    parser.parse_expr()
}

impl SyntaxTree {
    pub const fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    pub fn directives(&self) -> &[DirectiveLine] {
        &self.directives
    }

    /// Range of the leading comment block, if the file starts with one.
    pub const fn header(&self) -> Option<TextRange> {
        self.header
    }

    /// The innermost expression whose range equals `range`.
    ///
    /// When several nested expressions share the range the deepest one wins.
    pub fn innermost_expression_at(&self, range: TextRange) -> Option<&Expr> {
        let mut found: Option<(&Expr, usize)> = None;
        walk_expressions(&self.unit, &mut |expr, depth| {
            if expr.range == range && found.is_none_or(|(_, best)| depth > best) {
                found = Some((expr, depth));
            }
        });
        found.map(|(expr, _)| expr)
    }
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;

    const PROGRAM: &str = r#"
using System;
using Fmt = System.Globalization;

namespace Demo
{
    class Program : Base
    {
        [Obsolete("no")]
        private int count = 1, other;
        public string Name { get; set; } = "x";
        public int Twice => count * 2;

        string Main(int val)
        {
            string s = "asdf";
            s += val;
            if (val > 0) { s = s + (object)val; } else s = "none";
            for (var i = 0; i < 3; i++) s += i;
            return "hi: " + val;
        }
    }
}
"#;

    #[test]
    fn parses_declarations() {
        let tree = parse(PROGRAM).unwrap();
        let unit = tree.unit();
        assert_eq!(unit.usings.len(), 2);
        assert_eq!(unit.usings[1].alias.as_ref().unwrap().name, "Fmt");
        let NamespaceMember::Namespace(ns) = &unit.members[0] else {
            panic!("expected namespace");
        };
        assert_eq!(ns.name.dotted(), "Demo");
        let NamespaceMember::Type(program) = &ns.members[0] else {
            panic!("expected type");
        };
        assert_eq!(program.name.name, "Program");
        assert_eq!(program.bases.len(), 1);
        assert_eq!(program.members.len(), 4);
    }

    #[test]
    fn additive_binds_left_to_right() {
        let expr = parse_expression(r#""a" + b * c + d"#).unwrap();
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            left.kind,
            ExprKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn casts_and_parentheses() {
        assert!(matches!(
            parse_expression("(object)val").unwrap().kind,
            ExprKind::Cast { .. }
        ));
        assert!(matches!(
            parse_expression("(val).ToString()").unwrap().kind,
            ExprKind::Invocation { .. }
        ));
        assert!(matches!(
            parse_expression("(a) + b").unwrap().kind,
            ExprKind::Binary { .. }
        ));
    }

    #[test]
    fn finds_innermost_expression() {
        let text = "class C { string M(int val) { return \"hi: \" + val; } }";
        let tree = parse(text).unwrap();
        let start = text.find("val;").unwrap();
        let expr = tree
            .innermost_expression_at(TextRange::new(start, start + 3))
            .unwrap();
        assert!(matches!(&expr.kind, ExprKind::Name(ident) if ident.name == "val"));
        assert!(
            tree.innermost_expression_at(TextRange::new(start, start + 1))
                .is_none()
        );
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(parse("class C { void M() { var xs = new List<int>(); } }").is_err());
    }
}
