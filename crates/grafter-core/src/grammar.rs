//! Grammar model: one parsed grammar file and the set of grammars of a tool
//! invocation.
//!
//! A [`GrammarSet`] owns the single [`Ast`] arena shared by the root grammar,
//! its imports, and any implicit lexer split off later.

use indexmap::{IndexMap, IndexSet};

use crate::ast::{Ast, NodeId};
use crate::kind::NodeKind;

/// Handle to a grammar in a [`GrammarSet`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GrammarId(u32);

impl GrammarId {
    #[cfg(test)]
    pub(crate) fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrammarKind {
    Lexer,
    Parser,
    Combined,
}

impl GrammarKind {
    /// Text of the GRAMMAR root node for this kind.
    pub fn root_text(self) -> &'static str {
        match self {
            GrammarKind::Lexer => "LEXER_GRAMMAR",
            GrammarKind::Parser => "PARSER_GRAMMAR",
            GrammarKind::Combined => "COMBINED_GRAMMAR",
        }
    }

    pub fn from_root_text(text: &str) -> Option<GrammarKind> {
        match text {
            "LEXER_GRAMMAR" => Some(GrammarKind::Lexer),
            "PARSER_GRAMMAR" => Some(GrammarKind::Parser),
            "COMBINED_GRAMMAR" => Some(GrammarKind::Combined),
            _ => None,
        }
    }

    /// Scope applied to `@name {...}` actions written without a scope.
    pub fn default_action_scope(self) -> &'static str {
        match self {
            GrammarKind::Lexer => "lexer",
            GrammarKind::Parser | GrammarKind::Combined => "parser",
        }
    }
}

/// Options a combined grammar may pass on to its implicit lexer.
pub const LEXER_OPTIONS: &[&str] = &[
    "superClass",
    "contextSuperClass",
    "TokenLabelType",
    "tokenVocab",
    "language",
    "accessLevel",
    "exportMacro",
    "caseInsensitive",
    "actionTemplates",
];

/// Lexer options that stay with the parser half of a combined grammar.
pub const DO_NOT_COPY_OPTIONS_TO_LEXER: &[&str] = &["superClass", "TokenLabelType", "tokenVocab"];

/// Prefix of names given to lexer rules synthesized for string literals.
pub const AUTO_GENERATED_TOKEN_NAME_PREFIX: &str = "T__";

/// Names starting with an uppercase letter denote token (lexer) rules.
pub fn is_token_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Strip the quotes of a grammar string literal and resolve simple escapes.
pub fn unquote_literal(literal: &str) -> String {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
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
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Clone, Debug)]
pub struct Grammar {
    pub name: String,
    pub file_name: String,
    pub kind: GrammarKind,
    pub root: NodeId,
    /// Option name to the node holding its value.
    pub options: IndexMap<String, NodeId>,
    /// Direct imports in declaration order.
    pub imports: Vec<GrammarId>,
    literal_rule_counter: u32,
}

impl Grammar {
    pub fn default_action_scope(&self) -> &'static str {
        self.kind.default_action_scope()
    }

    pub fn is_combined(&self) -> bool {
        self.kind == GrammarKind::Combined
    }

    pub fn option(&self, name: &str) -> Option<NodeId> {
        self.options.get(name).copied()
    }

    /// Rendered value of an option: string literals are unquoted, everything
    /// else is the value node's text.
    pub fn option_string(&self, ast: &Ast, name: &str) -> Option<String> {
        self.option(name).map(|value| option_value_string(ast, value))
    }

    /// String literals referenced by the grammar's rules, in encounter order.
    ///
    /// Literals inside element options are not references and are skipped.
    pub fn string_literals(&self, ast: &Ast) -> IndexSet<String> {
        let mut literals = IndexSet::new();
        for rule in self.rules(ast) {
            collect_literals(ast, rule, &mut literals);
        }
        literals
    }

    /// RULE nodes of the RULES section and of every mode, in tree order.
    pub fn rules(&self, ast: &Ast) -> Vec<NodeId> {
        let mut rules = Vec::new();
        for &section in ast.children(self.root) {
            match ast.kind(section) {
                NodeKind::Rules | NodeKind::Mode => {
                    rules.extend(ast.children_with_kind(section, NodeKind::Rule));
                }
                _ => {}
            }
        }
        rules
    }

    /// Next free name for a lexer rule matching a string literal.
    ///
    /// Names follow `T__<n>`; any name already used by a rule in `taken` is
    /// skipped, so the result never collides.
    pub fn next_literal_rule_name(&mut self, taken: &IndexSet<String>) -> String {
        loop {
            let name = format!("{AUTO_GENERATED_TOKEN_NAME_PREFIX}{}", self.literal_rule_counter);
            self.literal_rule_counter += 1;
            if !taken.contains(&name) {
                return name;
            }
        }
    }
}

fn collect_literals(ast: &Ast, id: NodeId, out: &mut IndexSet<String>) {
    match ast.kind(id) {
        NodeKind::ElementOptions => return,
        NodeKind::StringLiteral => {
            out.insert(ast.text(id).to_owned());
        }
        _ => {}
    }
    for &child in ast.children(id) {
        collect_literals(ast, child, out);
    }
}

pub fn option_value_string(ast: &Ast, value: NodeId) -> String {
    match ast.kind(value) {
        NodeKind::StringLiteral => unquote_literal(ast.text(value)),
        _ => ast.text(value).to_owned(),
    }
}

/// Name of a RULE or MODE node: the text of its first child.
pub fn section_name(ast: &Ast, node: NodeId) -> &str {
    ast.child(node, 0).map(|id| ast.text(id)).unwrap_or("")
}

/// Collect `name = value` pairs from an OPTIONS node.
pub fn read_options(ast: &Ast, options: NodeId) -> IndexMap<String, NodeId> {
    let mut map = IndexMap::new();
    for &assign in ast.children(options) {
        let (Some(name), Some(value)) = (ast.child(assign, 0), ast.child(assign, 1)) else {
            continue;
        };
        map.insert(ast.text(name).to_owned(), value);
    }
    map
}

/// All grammars of one tool invocation plus the arena holding their trees.
#[derive(Clone, Debug, Default)]
pub struct GrammarSet {
    pub ast: Ast,
    grammars: Vec<Grammar>,
}

impl GrammarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ast(ast: Ast) -> Self {
        Self {
            ast,
            grammars: Vec::new(),
        }
    }

    /// Register a grammar whose tree already lives in the arena.
    ///
    /// The name is read from the root's first child, the kind from the root
    /// text (combined when unrecognized), and the option map from its OPTIONS
    /// section. Every node of the tree is marked as owned by the new grammar.
    pub fn add(&mut self, file_name: impl Into<String>, root: NodeId) -> GrammarId {
        let id = GrammarId(self.grammars.len() as u32);
        let name = section_name(&self.ast, root).to_owned();
        let kind =
            GrammarKind::from_root_text(self.ast.text(root)).unwrap_or(GrammarKind::Combined);
        let options = self
            .ast
            .first_child_with_kind(root, NodeKind::Options)
            .map(|opts| read_options(&self.ast, opts))
            .unwrap_or_default();
        self.ast.set_owner_recursive(root, id);
        self.grammars.push(Grammar {
            name,
            file_name: file_name.into(),
            kind,
            root,
            options,
            imports: Vec::new(),
            literal_rule_counter: 0,
        });
        id
    }

    /// Declare that `grammar` imports `delegate`, after any earlier imports.
    pub fn add_import(&mut self, grammar: GrammarId, delegate: GrammarId) {
        assert_ne!(grammar, delegate, "a grammar cannot import itself");
        self.grammars[grammar.index()].imports.push(delegate);
    }

    pub fn get(&self, id: GrammarId) -> &Grammar {
        &self.grammars[id.index()]
    }

    pub fn get_mut(&mut self, id: GrammarId) -> &mut Grammar {
        &mut self.grammars[id.index()]
    }

    /// Split borrow: the arena mutably and a grammar immutably.
    pub fn ast_and_grammar(&mut self, id: GrammarId) -> (&mut Ast, &Grammar) {
        (&mut self.ast, &self.grammars[id.index()])
    }

    /// Split borrow: the arena and a grammar, both mutably.
    pub fn ast_and_grammar_mut(&mut self, id: GrammarId) -> (&mut Ast, &mut Grammar) {
        (&mut self.ast, &mut self.grammars[id.index()])
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GrammarId> + '_ {
        (0..self.grammars.len() as u32).map(GrammarId)
    }

    /// Transitive imports: each direct import followed by its own imports,
    /// depth first, in declaration order. A file imported twice is listed once,
    /// at its first position.
    pub fn all_imports(&self, id: GrammarId) -> Vec<GrammarId> {
        let mut seen = IndexMap::new();
        self.collect_imports(id, &mut seen);
        seen.into_values().collect()
    }

    fn collect_imports(&self, id: GrammarId, seen: &mut IndexMap<String, GrammarId>) {
        for &delegate in &self.get(id).imports {
            let file = self.get(delegate).file_name.clone();
            if seen.contains_key(&file) {
                continue;
            }
            seen.insert(file, delegate);
            self.collect_imports(delegate, seen);
        }
    }
}
