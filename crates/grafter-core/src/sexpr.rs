//! Textual tree notation.
//!
//! ```text
//! (GRAMMAR:COMBINED_GRAMMAR ID:T
//!     (RULES (RULE RULE_REF:a (BLOCK (ALT STRING_LITERAL:'x' ACTION:{f();}@2:14)))))
//! ```
//!
//! A node is `KIND`, optionally followed by `:text` and `@line:col`. Interior
//! nodes are parenthesized with their children. Text is a bare word, a
//! `'quoted'` literal, or a `{braced}` action (optionally followed by `?`).
//! A node without `:text` gets its kind name as text.
//!
//! [`Ast::dump`] writes the same notation without positions.

use logos::Logos;

use crate::ast::{Ast, NodeId, Position};
use crate::grammar::{GrammarId, GrammarSet};
use crate::kind::NodeKind;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[regex(r"'(?:[^'\\]|\\.)*'")]
    Quoted,

    #[token("{", braced)]
    Braced,

    #[regex(r"@[0-9]+:[0-9]+")]
    Position,

    #[regex(r"[^\s():'{}@]+")]
    Word,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

/// Consume a balanced `{...}` block and an optional predicate `?`.
fn braced(lex: &mut logos::Lexer<Token>) -> bool {
    let rest = lex.remainder();
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let mut len = i + 1;
                    if rest[len..].starts_with('?') {
                        len += 1;
                    }
                    lex.bump(len);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid input at offset {offset}")]
    InvalidInput { offset: usize },

    #[error("unexpected `{found}` at offset {offset}, expected {expected}")]
    Unexpected {
        found: String,
        offset: usize,
        expected: &'static str,
    },

    #[error("unknown node kind `{name}` at offset {offset}")]
    UnknownKind { name: String, offset: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

struct Lexeme<'s> {
    token: Token,
    text: &'s str,
    offset: usize,
}

fn lex(source: &str) -> Result<Vec<Lexeme<'_>>, ParseError> {
    let mut out = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(Token::Whitespace) => {}
            Ok(token) => out.push(Lexeme {
                token,
                text: &source[span.clone()],
                offset: span.start,
            }),
            Err(()) => return Err(ParseError::InvalidInput { offset: span.start }),
        }
    }
    Ok(out)
}

struct Reader<'a, 's> {
    ast: &'a mut Ast,
    lexemes: Vec<Lexeme<'s>>,
    pos: usize,
}

impl<'s> Reader<'_, 's> {
    fn peek(&self) -> Option<&Lexeme<'s>> {
        self.lexemes.get(self.pos)
    }

    fn bump(&mut self, expected: &'static str) -> Result<&Lexeme<'s>, ParseError> {
        let lexeme = self
            .lexemes
            .get(self.pos)
            .ok_or(ParseError::UnexpectedEof { expected })?;
        self.pos += 1;
        Ok(lexeme)
    }

    fn node(&mut self) -> Result<NodeId, ParseError> {
        let lexeme = self.bump("a node")?;
        match lexeme.token {
            Token::ParenOpen => {
                let parent = self.leaf()?;
                loop {
                    match self.peek().map(|l| l.token) {
                        Some(Token::ParenClose) => {
                            self.pos += 1;
                            return Ok(parent);
                        }
                        Some(_) => {
                            let child = self.node()?;
                            self.ast.push_child(parent, child);
                        }
                        None => return Err(ParseError::UnexpectedEof { expected: "`)`" }),
                    }
                }
            }
            Token::Word => {
                self.pos -= 1;
                self.leaf()
            }
            _ => Err(ParseError::Unexpected {
                found: lexeme.text.to_owned(),
                offset: lexeme.offset,
                expected: "a node",
            }),
        }
    }

    fn leaf(&mut self) -> Result<NodeId, ParseError> {
        let lexeme = self.bump("a node kind")?;
        if lexeme.token != Token::Word {
            return Err(ParseError::Unexpected {
                found: lexeme.text.to_owned(),
                offset: lexeme.offset,
                expected: "a node kind",
            });
        }
        let Some(kind) = NodeKind::from_name(lexeme.text) else {
            return Err(ParseError::UnknownKind {
                name: lexeme.text.to_owned(),
                offset: lexeme.offset,
            });
        };

        let mut text = kind.name().to_owned();
        if self.peek().map(|l| l.token) == Some(Token::Colon) {
            self.pos += 1;
            let value = self.bump("node text")?;
            match value.token {
                Token::Word | Token::Quoted | Token::Braced => text = value.text.to_owned(),
                _ => {
                    return Err(ParseError::Unexpected {
                        found: value.text.to_owned(),
                        offset: value.offset,
                        expected: "node text",
                    });
                }
            }
        }

        let id = self.ast.alloc_with_text(kind, text);

        if let Some(lexeme) = self.peek()
            && lexeme.token == Token::Position
        {
            let position = parse_position(lexeme.text);
            self.pos += 1;
            self.ast.set_position(id, position);
        }
        Ok(id)
    }
}

fn parse_position(text: &str) -> Position {
    let body = text.trim_start_matches('@');
    let (line, column) = body.split_once(':').unwrap_or((body, "0"));
    Position::new(line.parse().unwrap_or(0), column.parse().unwrap_or(0))
}

/// Read one tree from `source` into the arena.
pub fn parse(ast: &mut Ast, source: &str) -> Result<NodeId, ParseError> {
    let lexemes = lex(source)?;
    let mut reader = Reader {
        ast,
        lexemes,
        pos: 0,
    };
    let root = reader.node()?;
    if let Some(extra) = reader.peek() {
        return Err(ParseError::Unexpected {
            found: extra.text.to_owned(),
            offset: extra.offset,
            expected: "end of input",
        });
    }
    Ok(root)
}

/// Read a grammar tree and register it in the set.
pub fn load_grammar(
    set: &mut GrammarSet,
    file_name: &str,
    source: &str,
) -> Result<GrammarId, ParseError> {
    let root = parse(&mut set.ast, source)?;
    Ok(set.add(file_name, root))
}

impl Ast {
    /// Render the subtree in tree notation, without positions.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(id, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, out: &mut String) {
        let children = self.children(id);
        if !children.is_empty() {
            out.push('(');
        }
        let kind = self.kind(id);
        out.push_str(kind.name());
        let text = self.text(id);
        if text != kind.name() {
            out.push(':');
            out.push_str(text);
        }
        for &child in children {
            out.push(' ');
            self.dump_into(child, out);
        }
        if !children.is_empty() {
            out.push(')');
        }
    }
}
