//! Group file parser.
//!
//! ```text
//! import "Common.stg"
//!
//! // one-liners use a string body
//! getText() ::= "getText()"
//! writeln(s) ::= <<outStream.println("<s>");>>
//! ```
//!
//! A syntax error skips ahead to the end of the next template body, so one
//! broken definition does not hide the others.

use logos::Logos;

use super::compile::CompileError;
use super::lexer::{GroupToken, unescape_string};
use crate::template::MessageShape;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Definition {
    pub name: String,
    pub name_offset: usize,
    pub params: Vec<String>,
    pub body: String,
    /// Offset of the body's first character in the group source.
    pub body_offset: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GroupSource {
    /// Import paths with the offset of their string literal.
    pub imports: Vec<(String, usize)>,
    pub definitions: Vec<Definition>,
}

struct Lexeme<'s> {
    token: GroupToken,
    text: &'s str,
    offset: usize,
}

pub(crate) fn parse_group(source: &str, errors: &mut Vec<CompileError>) -> GroupSource {
    let mut lexemes = Vec::new();
    let mut lexer = GroupToken::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) if token.is_trivia() => {}
            Ok(token) => lexemes.push(Lexeme {
                token,
                text: lexer.slice(),
                offset: span.start,
            }),
            Err(()) => errors.push(lexer_error(source, lexer.slice(), span.start)),
        }
    }

    let mut parser = GroupParser {
        source,
        lexemes,
        pos: 0,
    };
    parser.group(errors)
}

fn lexer_error(source: &str, slice: &str, offset: usize) -> CompileError {
    if slice.starts_with("<<") || slice.starts_with("/*") || slice.starts_with('"') {
        return CompileError {
            shape: MessageShape::Structural,
            offset: source.len(),
            text: "premature EOF".to_owned(),
        };
    }
    let bad = slice.chars().next().unwrap_or(' ');
    CompileError {
        shape: MessageShape::Lexer,
        offset,
        text: format!("invalid character '{bad}'"),
    }
}

fn describe(token: GroupToken) -> &'static str {
    match token {
        GroupToken::Import => "'import'",
        GroupToken::Ident => "ID",
        GroupToken::ParenOpen => "'('",
        GroupToken::ParenClose => "')'",
        GroupToken::Comma => "','",
        GroupToken::Defines => "'::='",
        GroupToken::Colon => "':'",
        GroupToken::Equals => "'='",
        GroupToken::BigString => "BIGSTRING",
        GroupToken::String => "STRING",
        GroupToken::LineComment | GroupToken::BlockComment | GroupToken::Whitespace => "WS",
    }
}

struct GroupParser<'s> {
    source: &'s str,
    lexemes: Vec<Lexeme<'s>>,
    pos: usize,
}

impl<'s> GroupParser<'s> {
    fn peek(&self) -> Option<GroupToken> {
        self.lexemes.get(self.pos).map(|l| l.token)
    }

    fn mismatched(&self, expecting: &str) -> CompileError {
        let (found, offset) = match self.lexemes.get(self.pos) {
            Some(lexeme) => (lexeme.text, lexeme.offset),
            None => ("<EOF>", self.source.len()),
        };
        CompileError {
            shape: MessageShape::Structural,
            offset,
            text: format!("mismatched input '{found}' expecting {expecting}"),
        }
    }

    fn expect(&mut self, token: GroupToken) -> Result<&Lexeme<'s>, CompileError> {
        if self.peek() != Some(token) {
            return Err(self.mismatched(describe(token)));
        }
        self.pos += 1;
        Ok(&self.lexemes[self.pos - 1])
    }

    fn group(&mut self, errors: &mut Vec<CompileError>) -> GroupSource {
        let mut group = GroupSource::default();

        while self.peek() == Some(GroupToken::Import) {
            self.pos += 1;
            match self.expect(GroupToken::String) {
                Ok(lexeme) => group
                    .imports
                    .push((unescape_string(lexeme.text), lexeme.offset)),
                Err(err) => errors.push(err),
            }
        }

        while self.peek().is_some() {
            match self.definition() {
                Ok(def) => group.definitions.push(def),
                Err(err) => {
                    errors.push(err);
                    self.recover();
                }
            }
        }
        group
    }

    /// Skip past the next template body.
    fn recover(&mut self) {
        while let Some(token) = self.peek() {
            self.pos += 1;
            if matches!(token, GroupToken::BigString | GroupToken::String) {
                return;
            }
        }
    }

    fn definition(&mut self) -> Result<Definition, CompileError> {
        let name = self.expect(GroupToken::Ident)?;
        let (name, name_offset) = (name.text.to_owned(), name.offset);

        self.expect(GroupToken::ParenOpen)?;
        let mut params = Vec::new();
        if self.peek() == Some(GroupToken::Ident) {
            params.push(self.expect(GroupToken::Ident)?.text.to_owned());
            while self.peek() == Some(GroupToken::Comma) {
                self.pos += 1;
                params.push(self.expect(GroupToken::Ident)?.text.to_owned());
            }
        }
        self.expect(GroupToken::ParenClose)?;
        self.expect(GroupToken::Defines)?;

        let (body, body_offset) = match self.peek() {
            Some(GroupToken::BigString) => {
                let lexeme = &self.lexemes[self.pos];
                big_string_body(lexeme.text, lexeme.offset)
            }
            Some(GroupToken::String) => {
                let lexeme = &self.lexemes[self.pos];
                (unescape_string(lexeme.text), lexeme.offset + 1)
            }
            _ => return Err(self.mismatched("STRING or BIGSTRING")),
        };
        self.pos += 1;

        Ok(Definition {
            name,
            name_offset,
            params,
            body,
            body_offset,
        })
    }
}

/// Strip `<<`/`>>` plus one newline right inside each delimiter.
fn big_string_body(text: &str, offset: usize) -> (String, usize) {
    let mut body = &text[2..text.len() - 2];
    let mut body_offset = offset + 2;

    if let Some(rest) = body.strip_prefix("\r\n") {
        body = rest;
        body_offset += 2;
    } else if let Some(rest) = body.strip_prefix('\n') {
        body = rest;
        body_offset += 1;
    }

    if let Some(rest) = body.strip_suffix("\r\n") {
        body = rest;
    } else if let Some(rest) = body.strip_suffix('\n') {
        body = rest;
    }

    (body.to_owned(), body_offset)
}
