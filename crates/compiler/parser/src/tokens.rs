//! # AngelScript Tokens
//!
//! Token definitions for the AngelScript lexer, built on `logos`. Tokens own
//! their text so a token stream can be cached and re-used across analysis
//! passes without borrowing the source buffer.

use std::fmt;

use logos::{Lexer, Logos};
use thiserror::Error;

/// Error produced when the lexer cannot form a token.
#[derive(Default, Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    #[error("numeric literal out of range")]
    NumberOutOfRange,
    #[default]
    #[error("unrecognized character sequence")]
    UnrecognizedToken,
}

fn parse_int(lex: &mut Lexer<TokenKind>) -> Result<i64, LexingError> {
    lex.slice()
        .parse::<i64>()
        .map_err(|_| LexingError::NumberOutOfRange)
}

fn parse_radix(lex: &mut Lexer<TokenKind>, radix: u32) -> Result<i64, LexingError> {
    i64::from_str_radix(&lex.slice()[2..], radix).map_err(|_| LexingError::NumberOutOfRange)
}

fn parse_float(lex: &mut Lexer<TokenKind>) -> Result<f64, LexingError> {
    lex.slice()
        .trim_end_matches(['f', 'F'])
        .parse::<f64>()
        .map_err(|_| LexingError::NumberOutOfRange)
}

fn unquote(lex: &mut Lexer<TokenKind>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// A single AngelScript token.
///
/// `>>`, `>>=` and `>>>` are intentionally *not* lexed as single tokens: the
/// parser reassembles shift operators from consecutive `>` tokens so that
/// nested template argument lists (`array<array<int>>`) close cleanly.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexingError)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fF]?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fF]?", parse_float)]
    Float(f64),
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| parse_radix(lex, 16))]
    #[regex(r"0[oO][0-7]+", |lex| parse_radix(lex, 8))]
    #[regex(r"0[bB][01]+", |lex| parse_radix(lex, 2))]
    #[regex(r"[0-9]+", parse_int)]
    Integer(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, unquote)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, unquote)]
    String(String),

    // Keywords (structural only; primitive type names stay identifiers and
    // are resolved against the builtin table by the type parser)
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("enum")]
    Enum,
    #[token("namespace")]
    Namespace,
    #[token("typedef")]
    Typedef,
    #[token("funcdef")]
    Funcdef,
    #[token("mixin")]
    Mixin,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("this")]
    This,
    #[token("cast")]
    Cast,
    #[token("is")]
    Is,
    #[token("!is")]
    NotIs,

    // Identifiers (after keywords so keywords win)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators (longest match wins)
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<<")]
    Shl,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("**=")]
    StarStarAssign,
    #[token("&=")]
    AmpAssign,
    #[token("|=")]
    PipeAssign,
    #[token("^=")]
    CaretAssign,
    #[token("<<=")]
    ShlAssign,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,

    // Punctuation
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("@")]
    At,
    #[token("#")]
    Hash,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Identifier(s) => write!(f, "{s}"),
            Self::Class => write!(f, "class"),
            Self::Interface => write!(f, "interface"),
            Self::Enum => write!(f, "enum"),
            Self::Namespace => write!(f, "namespace"),
            Self::Typedef => write!(f, "typedef"),
            Self::Funcdef => write!(f, "funcdef"),
            Self::Mixin => write!(f, "mixin"),
            Self::Private => write!(f, "private"),
            Self::Protected => write!(f, "protected"),
            Self::Const => write!(f, "const"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::While => write!(f, "while"),
            Self::Do => write!(f, "do"),
            Self::For => write!(f, "for"),
            Self::Switch => write!(f, "switch"),
            Self::Case => write!(f, "case"),
            Self::Default => write!(f, "default"),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
            Self::Return => write!(f, "return"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::This => write!(f, "this"),
            Self::Cast => write!(f, "cast"),
            Self::Is => write!(f, "is"),
            Self::NotIs => write!(f, "!is"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::StarStar => write!(f, "**"),
            Self::Amp => write!(f, "&"),
            Self::Pipe => write!(f, "|"),
            Self::Caret => write!(f, "^"),
            Self::Tilde => write!(f, "~"),
            Self::Bang => write!(f, "!"),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::Le => write!(f, "<="),
            Self::Ge => write!(f, ">="),
            Self::EqEq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::AmpAmp => write!(f, "&&"),
            Self::PipePipe => write!(f, "||"),
            Self::Shl => write!(f, "<<"),
            Self::Assign => write!(f, "="),
            Self::PlusAssign => write!(f, "+="),
            Self::MinusAssign => write!(f, "-="),
            Self::StarAssign => write!(f, "*="),
            Self::SlashAssign => write!(f, "/="),
            Self::PercentAssign => write!(f, "%="),
            Self::StarStarAssign => write!(f, "**="),
            Self::AmpAssign => write!(f, "&="),
            Self::PipeAssign => write!(f, "|="),
            Self::CaretAssign => write!(f, "^="),
            Self::ShlAssign => write!(f, "<<="),
            Self::Inc => write!(f, "++"),
            Self::Dec => write!(f, "--"),
            Self::Question => write!(f, "?"),
            Self::Colon => write!(f, ":"),
            Self::ColonColon => write!(f, "::"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrack => write!(f, "["),
            Self::RBrack => write!(f, "]"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::At => write!(f, "@"),
            Self::Hash => write!(f, "#"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<TokenKind> {
        TokenKind::lexer(input).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_basic_lexing() {
        let tokens = lex("class Foo : Bar { int x = 0x10; }");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Class,
                TokenKind::Identifier("Foo".into()),
                TokenKind::Colon,
                TokenKind::Identifier("Bar".into()),
                TokenKind::LBrace,
                TokenKind::Identifier("int".into()),
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Integer(16),
                TokenKind::Semicolon,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_nested_template_close_stays_split() {
        let tokens = lex("array<array<int>>");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("array".into()),
                TokenKind::Lt,
                TokenKind::Identifier("array".into()),
                TokenKind::Lt,
                TokenKind::Identifier("int".into()),
                TokenKind::Gt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn test_string_escapes_and_floats() {
        let tokens = lex(r#"1.5f "a\nb" 'c'"#);
        assert_eq!(
            tokens,
            vec![
                TokenKind::Float(1.5),
                TokenKind::String("a\nb".into()),
                TokenKind::String("c".into()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = lex("a // line\n/* block\n still block */ b");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn test_handle_and_scope_tokens() {
        let tokens = lex("A::B@ c; #include");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("A".into()),
                TokenKind::ColonColon,
                TokenKind::Identifier("B".into()),
                TokenKind::At,
                TokenKind::Identifier("c".into()),
                TokenKind::Semicolon,
                TokenKind::Hash,
                TokenKind::Identifier("include".into()),
            ]
        );
    }
}
