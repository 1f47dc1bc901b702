//! Template body compiler.
//!
//! A body is literal text interleaved with `<...>` expressions:
//!
//! ```text
//! outStream.println("<s>"); <! comment !> \<not an expression\>
//! <setText(normalize(getText()))>  <"literal">
//! ```

use logos::Logos;

use super::lexer::{ExprToken, unescape_string};
use crate::template::MessageShape;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expr {
    Attribute {
        name: String,
        offset: usize,
    },
    Include {
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
    Literal(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Chunk {
    Text(String),
    Expr(Expr),
}

/// A compiled template. Offsets in expressions index into `source`.
#[derive(Clone, Debug)]
pub struct CompiledTemplate {
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) source: String,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CompileError {
    pub shape: MessageShape,
    /// Byte offset into the compiled source.
    pub offset: usize,
    pub text: String,
}

impl CompileError {
    fn structural(offset: usize, text: impl Into<String>) -> Self {
        Self {
            shape: MessageShape::Structural,
            offset,
            text: text.into(),
        }
    }

    fn premature_eof(source: &str) -> Self {
        Self::structural(source.len(), "premature EOF")
    }
}

pub(crate) fn compile(
    name: &str,
    params: Vec<String>,
    source: &str,
) -> Result<CompiledTemplate, CompileError> {
    Ok(CompiledTemplate {
        name: name.to_owned(),
        params,
        chunks: compile_body(source)?,
        source: source.to_owned(),
    })
}

fn compile_body(source: &str) -> Result<Vec<Chunk>, CompileError> {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(ch) = source[pos..].chars().next() {
        let rest = &source[pos..];

        if ch == '\\' {
            if let Some(escaped @ ('<' | '>' | '\\')) = rest[1..].chars().next() {
                text.push(escaped);
                pos += 2;
                continue;
            }
        }

        if rest.starts_with("<!") {
            let Some(end) = rest[2..].find("!>") else {
                return Err(CompileError::premature_eof(source));
            };
            pos += 2 + end + 2;
            continue;
        }

        if ch == '<' {
            if !text.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text)));
            }
            let (expr, next) = compile_expression(source, pos + 1)?;
            chunks.push(Chunk::Expr(expr));
            pos = next;
            continue;
        }

        text.push(ch);
        pos += ch.len_utf8();
    }

    if !text.is_empty() {
        chunks.push(Chunk::Text(text));
    }
    Ok(chunks)
}

struct Lexeme<'s> {
    token: ExprToken,
    text: &'s str,
    offset: usize,
}

/// Compile the expression starting at `start` (just after `<`). Returns the
/// expression and the offset just past the closing `>`.
fn compile_expression(source: &str, start: usize) -> Result<(Expr, usize), CompileError> {
    let mut lexemes = Vec::new();
    let mut lexer = ExprToken::lexer(&source[start..]);
    let mut end = None;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let offset = start + span.start;
        match result {
            Ok(ExprToken::Whitespace) => {}
            Ok(ExprToken::Close) => {
                lexemes.push(Lexeme {
                    token: ExprToken::Close,
                    text: lexer.slice(),
                    offset,
                });
                end = Some(start + span.end);
                break;
            }
            Ok(token) => lexemes.push(Lexeme {
                token,
                text: lexer.slice(),
                offset,
            }),
            Err(()) => {
                let slice = lexer.slice();
                // An unterminated string runs to the end of the source.
                if slice.starts_with('"') {
                    return Err(CompileError::premature_eof(source));
                }
                let bad = slice.chars().next().unwrap_or(' ');
                return Err(CompileError {
                    shape: MessageShape::Lexer,
                    offset,
                    text: format!("invalid character '{bad}'"),
                });
            }
        }
    }

    let Some(end) = end else {
        return Err(CompileError::premature_eof(source));
    };

    let mut parser = ExprParser { lexemes, pos: 0 };
    let expr = parser.expr()?;
    parser.expect(ExprToken::Close)?;
    Ok((expr, end))
}

struct ExprParser<'s> {
    lexemes: Vec<Lexeme<'s>>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<ExprToken> {
        self.lexemes.get(self.pos).map(|l| l.token)
    }

    fn mismatched(&self, expecting: &str) -> CompileError {
        // The token list always ends with `>`, so `pos` is in bounds.
        let lexeme = &self.lexemes[self.pos.min(self.lexemes.len() - 1)];
        CompileError::structural(
            lexeme.offset,
            format!("mismatched input '{}' expecting {expecting}", lexeme.text),
        )
    }

    fn expect(&mut self, token: ExprToken) -> Result<(), CompileError> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.mismatched(token.describe()))
        }
    }

    fn expr(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(ExprToken::String) => {
                let text = unescape_string(self.lexemes[self.pos].text);
                self.pos += 1;
                Ok(Expr::Literal(text))
            }
            Some(ExprToken::Ident) => {
                let lexeme = &self.lexemes[self.pos];
                let name = lexeme.text.to_owned();
                let offset = lexeme.offset;
                self.pos += 1;
                if self.peek() != Some(ExprToken::ParenOpen) {
                    return Ok(Expr::Attribute { name, offset });
                }
                self.pos += 1;
                let args = self.args()?;
                Ok(Expr::Include { name, args, offset })
            }
            _ => Err(self.mismatched("ID")),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.peek() == Some(ExprToken::ParenClose) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.peek() {
                Some(ExprToken::Comma) => self.pos += 1,
                Some(ExprToken::ParenClose) => {
                    self.pos += 1;
                    return Ok(args);
                }
                _ => return Err(self.mismatched("')'")),
            }
        }
    }
}
