use std::ops::Deref;

use crate::error::{Error, Result};
use crate::range::TextRange;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Reserved words. Contextual keywords (`var`, `global`, `get`, ...) lex as identifiers.
#[rustfmt::skip]
const KEYWORDS: [&str; 67] = [
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
    "short", "static", "string", "struct", "this", "true", "uint", "ulong", "using",
    "virtual", "void", "while",
];

// Longest first.
#[rustfmt::skip]
const OPERATORS: [&str; 49] = [
    "<<=", "??=",
    "=>", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "<<", "??", "?.", "::", "->",
    "{", "}", "(", ")", "[", "]", ";", ",", ".", ":", "?", "+", "-", "*", "/", "%", "&",
    "|", "^", "!", "~", "=", "<", ">", "@",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TokenKind {
    Identifier,
    Keyword,
    Integer,
    Real,
    /// Regular, verbatim or interpolated string literal, quotes included.
    String,
    Char,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token<'a> {
    /// Index in the token stream
    index: usize,
    /// Text value of the token
    text: &'a str,
    /// Start byte of the text in source
    offset: u32,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    /// # Panics
    ///
    /// Panics if `offset` is larger than `u32::MAX`.
    pub fn new(text: &'a str, index: usize, offset: usize, kind: TokenKind) -> Self {
        Self {
            text,
            index,
            offset: u32::try_from(offset).expect("source larger than 4GiB"),
            kind,
        }
    }

    #[inline]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Start and end byte of the token.
    #[inline]
    pub const fn range(&self) -> TextRange {
        let offset = self.offset as usize;
        TextRange::new(offset, offset + self.text.len())
    }

    #[inline]
    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == punct
    }

    #[inline]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }

    /// Identifier text with a verbatim `@` prefix removed.
    #[inline]
    pub fn identifier(&self) -> Option<&'a str> {
        (self.kind == TokenKind::Identifier).then(|| self.text.trim_start_matches('@'))
    }
}

/// A `#` preprocessor line, kept for the source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    pub range: TextRange,
    /// Directive text after the `#`, trimmed.
    pub text: &'a str,
}

#[derive(Debug)]
pub struct Lexed<'a> {
    tokens: Vec<Token<'a>>,
    directives: Vec<Directive<'a>>,
    /// Range of the leading comment block (the file header), if any.
    header: Option<TextRange>,
}

impl<'a> Deref for Lexed<'a> {
    type Target = Vec<Token<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl<'a> Lexed<'a> {
    pub fn directives(&self) -> &[Directive<'a>] {
        &self.directives
    }

    pub const fn header(&self) -> Option<TextRange> {
        self.header
    }

    pub fn into_tokens(self) -> Vec<Token<'a>> {
        self.tokens
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }
}

#[inline]
fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

#[inline]
fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Split `text` into tokens, skipping whitespace and comments.
pub fn tokenize(text: &str) -> Result<Lexed<'_>> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut tokens = Vec::new();
    let mut directives = Vec::new();
    let mut header: Option<TextRange> = None;
    let mut at_line_start = true;

    while let Some(ch) = cursor.peek() {
        let start = cursor.pos;

        if ch == '\n' {
            cursor.bump();
            at_line_start = true;
            continue;
        }
        if ch.is_whitespace() {
            cursor.bump();
            continue;
        }

        // Comments
        if cursor.rest().starts_with("//") {
            cursor.eat_while(|c| c != '\n');
            if tokens.is_empty() && directives.is_empty() {
                let range = TextRange::new(start, cursor.pos);
                header = Some(header.map_or(range, |h| h.cover(range)));
            }
            continue;
        }
        if cursor.rest().starts_with("/*") {
            let Some(len) = cursor.rest()[2..].find("*/") else {
                return Err(Error::syntax("unterminated block comment", start));
            };
            cursor.pos += 2 + len + 2;
            if tokens.is_empty() && directives.is_empty() {
                let range = TextRange::new(start, cursor.pos);
                header = Some(header.map_or(range, |h| h.cover(range)));
            }
            continue;
        }

        if ch == '#' && at_line_start {
            cursor.eat_while(|c| c != '\n');
            let range = TextRange::new(start, cursor.pos);
            let body = text[start + 1..cursor.pos].trim();
            directives.push(Directive { range, text: body });
            continue;
        }
        at_line_start = false;

        let kind = lex_token(&mut cursor)?;
        let slice = &text[start..cursor.pos];
        let kind = if kind == TokenKind::Identifier && is_keyword(slice) {
            TokenKind::Keyword
        } else {
            kind
        };
        let index = tokens.len();
        tokens.push(Token::new(slice, index, start, kind));
    }

    Ok(Lexed {
        tokens,
        directives,
        header,
    })
}

fn lex_token(cursor: &mut Cursor) -> Result<TokenKind> {
    let start = cursor.pos;
    let rest = cursor.rest();

    // String prefixes: @"..", $"..", $@"..", @$".."
    for (prefix, verbatim, interpolated) in [
        ("$@\"", true, true),
        ("@$\"", true, true),
        ("@\"", true, false),
        ("$\"", false, true),
        ("\"", false, false),
    ] {
        if rest.starts_with(prefix) {
            cursor.pos += prefix.len();
            lex_string_body(cursor, start, verbatim, interpolated)?;
            return Ok(TokenKind::String);
        }
    }

    let Some(ch) = cursor.peek() else {
        return Err(Error::syntax("unexpected end of input", start));
    };

    if ch == '\'' {
        cursor.bump();
        loop {
            match cursor.bump() {
                Some('\\') => {
                    cursor.bump();
                }
                Some('\'') => break,
                Some('\n') | None => return Err(Error::syntax("unterminated char literal", start)),
                Some(_) => {}
            }
        }
        return Ok(TokenKind::Char);
    }

    if ch.is_ascii_digit() || (ch == '.' && cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()))
    {
        return Ok(lex_number(cursor));
    }

    if is_ident_start(ch) || (ch == '@' && cursor.peek_nth(1).is_some_and(is_ident_start)) {
        cursor.bump();
        cursor.eat_while(is_ident_continue);
        return Ok(TokenKind::Identifier);
    }

    if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
        cursor.pos += op.len();
        return Ok(TokenKind::Punctuation);
    }

    Err(Error::syntax(format!("unexpected character {ch:?}"), start))
}

fn lex_string_body(
    cursor: &mut Cursor,
    start: usize,
    verbatim: bool,
    interpolated: bool,
) -> Result<()> {
    let unterminated = || Error::syntax("unterminated string literal", start);
    loop {
        match cursor.bump() {
            None => return Err(unterminated()),
            Some('\n') if !verbatim => return Err(unterminated()),
            Some('\\') if !verbatim => {
                cursor.bump();
            }
            Some('"') => {
                if verbatim && cursor.peek() == Some('"') {
                    cursor.bump();
                } else {
                    return Ok(());
                }
            }
            Some('{') if interpolated => {
                if cursor.peek() == Some('{') {
                    cursor.bump();
                } else {
                    skip_interpolation_hole(cursor).ok_or_else(unterminated)?;
                }
            }
            Some(_) => {}
        }
    }
}

/// Skip to the `}` closing an interpolation hole, stepping over nested strings.
fn skip_interpolation_hole(cursor: &mut Cursor) -> Option<()> {
    let mut depth = 1usize;
    while depth > 0 {
        match cursor.bump()? {
            '{' => depth += 1,
            '}' => depth -= 1,
            '"' => loop {
                match cursor.bump()? {
                    '\\' => {
                        cursor.bump()?;
                    }
                    '"' => break,
                    _ => {}
                }
            },
            _ => {}
        }
    }
    Some(())
}

fn lex_number(cursor: &mut Cursor) -> TokenKind {
    let rest = cursor.rest();
    if rest.starts_with("0x") || rest.starts_with("0X") || rest.starts_with("0b") || rest.starts_with("0B") {
        cursor.pos += 2;
        cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
        eat_integer_suffix(cursor);
        return TokenKind::Integer;
    }

    let mut real = false;
    cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    if cursor.peek() == Some('.') && cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
        real = true;
        cursor.bump();
        cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    }
    if matches!(cursor.peek(), Some('e' | 'E')) {
        let sign = matches!(cursor.peek_nth(1), Some('+' | '-'));
        let digit_at = if sign { 2 } else { 1 };
        if cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            for _ in 0..digit_at {
                cursor.bump();
            }
            cursor.eat_while(|c| c.is_ascii_digit());
        }
    }
    if matches!(cursor.peek(), Some('f' | 'F' | 'd' | 'D' | 'm' | 'M')) {
        cursor.bump();
        return TokenKind::Real;
    }
    if real {
        return TokenKind::Real;
    }
    eat_integer_suffix(cursor);
    TokenKind::Integer
}

fn eat_integer_suffix(cursor: &mut Cursor) {
    cursor.eat_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str, expected: &[&str]) {
        let lexed = tokenize(text).unwrap();
        let received: Vec<_> = lexed.iter().map(Token::text).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn splitting_concatenation() {
        split(
            r#"return "hi: " + val;"#,
            &["return", "\"hi: \"", "+", "val", ";"],
        );
        split("s += val;", &["s", "+=", "val", ";"]);
    }

    #[test]
    fn member_access_on_integer_literal() {
        split("1.ToString()", &["1", ".", "ToString", "(", ")"]);
        split("1.5f + .5", &["1.5f", "+", ".5"]);
    }

    #[test]
    fn string_flavours() {
        split(r#"@"a""b" + $"x{y}z""#, &[r#"@"a""b""#, "+", r#"$"x{y}z""#]);
        split(r#"$"{ "}" }""#, &[r#"$"{ "}" }""#]);
        split(r#"'\'' + 'c'"#, &[r"'\''", "+", "'c'"]);
    }

    #[test]
    fn comments_and_directives() {
        let text = "// header\n#line hidden\nint x; /* c */ // t\n";
        let lexed = tokenize(text).unwrap();
        let received: Vec<_> = lexed.iter().map(Token::text).collect();
        assert_eq!(received, ["int", "x", ";"]);
        assert_eq!(lexed.directives()[0].text, "line hidden");
        assert_eq!(lexed.header(), Some(TextRange::new(0, 9)));
        assert_eq!(lexed[0].kind(), TokenKind::Keyword);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize("\"abc\n\""),
            Err(Error::Syntax { offset: 0, .. })
        ));
    }
}
