//! Tokens of `.stg` group files and of template expressions.
//!
//! Whitespace and comments are emitted as tokens and filtered by the callers,
//! so every byte of the input is covered by some token or error span.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupToken {
    #[token("import")]
    Import,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(",")]
    Comma,

    #[token("::=")]
    Defines,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    /// `<<...>>`
    #[token("<<", big_string)]
    BigString,

    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

impl GroupToken {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            GroupToken::Whitespace | GroupToken::LineComment | GroupToken::BlockComment
        )
    }
}

fn big_string(lex: &mut logos::Lexer<GroupToken>) -> bool {
    match lex.remainder().find(">>") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

fn block_comment(lex: &mut logos::Lexer<GroupToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

/// Tokens inside `<...>` of a template body.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(",")]
    Comma,

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    String,

    #[token(">")]
    Close,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

impl ExprToken {
    /// Token name used in `expecting ...` messages.
    pub fn describe(self) -> &'static str {
        match self {
            ExprToken::Ident => "ID",
            ExprToken::ParenOpen => "'('",
            ExprToken::ParenClose => "')'",
            ExprToken::Comma => "','",
            ExprToken::String => "STRING",
            ExprToken::Close => "'>'",
            ExprToken::Whitespace => "WS",
        }
    }
}

/// Resolve `\"`, `\\`, `\n`, `\t` and `\r` in a double-quoted literal.
pub fn unescape_string(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
