//! Implicit lexer extraction.
//!
//! A combined grammar is split in two:
//!
//! ```text
//! (COMBINED_GRAMMAR A
//!     (OPTIONS (= language Java))
//!     (AT members {foo})
//!     (AT lexer header {package jj;})
//!     (RULES (RULE s ...) (RULE ID ...)))
//! ```
//!
//! Token rules move (not copy) into a new `ALexer` tree. Every named action
//! is copied over; `@lexer::` actions also leave the combined tree. String
//! literals referenced by the remaining parser rules become `T__<n>` rules at
//! the front of the lexer, so keywords beat generic tokens.

use grafter_core::grammar::{
    DO_NOT_COPY_OPTIONS_TO_LEXER, LEXER_OPTIONS, is_token_name, section_name,
};
use grafter_core::invariants::verify_links;
use grafter_core::{Ast, GrammarId, GrammarKind, GrammarSet, NodeId, NodeKind};
use indexmap::{IndexMap, IndexSet};

/// The lexer tree split off a combined grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplicitLexer {
    /// Detached GRAMMAR root, owned by the combined grammar until the
    /// caller registers it.
    pub root: NodeId,
    pub name: String,
    /// Option name to value node, for the options copied over.
    pub options: IndexMap<String, NodeId>,
}

/// Split the token rules of `combined` into a new lexer tree.
///
/// Returns `None` when the lexer would have no rules. A combined grammar
/// without a RULES section is left untouched.
pub fn extract_implicit_lexer(set: &mut GrammarSet, combined: GrammarId) -> Option<ImplicitLexer> {
    let (ast, grammar) = set.ast_and_grammar_mut(combined);
    let combined_root = grammar.root;
    let combined_rules = ast.first_child_with_kind(combined_root, NodeKind::Rules)?;
    let elements = ast.children(combined_root).to_vec();

    let name = format!("{}Lexer", section_name(ast, combined_root));
    let lexer_root = ast.alloc_with_text(NodeKind::Grammar, GrammarKind::Lexer.root_text());
    ast.set_tokens(lexer_root, ast.tokens(combined_root));
    let id = ast.alloc_with_text(NodeKind::Id, name.clone());
    ast.push_child(lexer_root, id);

    let options = copy_lexer_options(ast, combined_root, lexer_root);

    // Copy all named actions, move those scoped to the lexer.
    let mut lexer_actions = Vec::new();
    for &element in &elements {
        if ast.kind(element) != NodeKind::At {
            continue;
        }
        let copy = ast.dup_tree(element);
        ast.push_child(lexer_root, copy);
        if ast.child(element, 0).is_some_and(|scope| ast.text(scope) == "lexer") {
            lexer_actions.push(element);
        }
    }
    for action in lexer_actions {
        ast.delete_child(combined_root, action);
    }

    let lexer_rules = ast.alloc(NodeKind::Rules);
    ast.push_child(lexer_root, lexer_rules);

    for rule in ast.children_with_kind(combined_rules, NodeKind::Rule) {
        if is_token_name(section_name(ast, rule)) {
            ast.push_child(lexer_rules, rule);
        }
    }

    let view: &Ast = ast;
    let aliases = literal_aliases(view, lexer_rules);
    let literals = grammar.string_literals(view);
    let mut taken: IndexSet<String> = grammar
        .rules(view)
        .into_iter()
        .chain(view.children(lexer_rules).iter().copied())
        .map(|rule| section_name(view, rule).to_owned())
        .collect();

    let mut insert_at = 0;
    for literal in literals {
        if aliases.contains(&literal) {
            continue;
        }
        let rule_name = grammar.next_literal_rule_name(&taken);
        let rule = literal_rule(ast, &rule_name, &literal);
        ast.attach(lexer_rules, rule, insert_at);
        taken.insert(rule_name);
        insert_at += 1;
    }

    ast.set_owner_recursive(lexer_root, combined);
    verify_links(ast, lexer_root);
    verify_links(ast, combined_root);

    log::debug!(target: "grammar", "after extract implicit lexer = {}", ast.dump(combined_root));
    log::debug!(target: "grammar", "lexer = {}", ast.dump(lexer_root));

    if ast.child_count(lexer_rules) == 0 {
        return None;
    }
    Some(ImplicitLexer {
        root: lexer_root,
        name,
        options,
    })
}

/// Copy lexer-applicable options into a new OPTIONS node of the lexer.
fn copy_lexer_options(
    ast: &mut Ast,
    combined_root: NodeId,
    lexer_root: NodeId,
) -> IndexMap<String, NodeId> {
    let mut options = IndexMap::new();
    let Some(combined_options) = ast.first_child_with_kind(combined_root, NodeKind::Options) else {
        return options;
    };
    if ast.child_count(combined_options) == 0 {
        return options;
    }

    let lexer_options = ast.dup_node(combined_options);
    ast.push_child(lexer_root, lexer_options);
    for assign in ast.children(combined_options).to_vec() {
        let Some(name) = ast.child(assign, 0).map(|id| ast.text(id).to_owned()) else {
            continue;
        };
        if !LEXER_OPTIONS.contains(&name.as_str())
            || DO_NOT_COPY_OPTIONS_TO_LEXER.contains(&name.as_str())
        {
            continue;
        }
        let copy = ast.dup_tree(assign);
        ast.push_child(lexer_options, copy);
        if let Some(value) = ast.child(copy, 1) {
            options.insert(name, value);
        }
    }
    options
}

/// Literals already matched by a rule of the exact shape
/// `(RULE TOKEN_REF (BLOCK (ALT STRING_LITERAL)))`.
fn literal_aliases(ast: &Ast, rules: NodeId) -> IndexSet<String> {
    let only_child = |id: NodeId, kind: NodeKind| match ast.children(id) {
        [child] if ast.kind(*child) == kind => Some(*child),
        _ => None,
    };

    let mut aliases = IndexSet::new();
    for &rule in ast.children(rules) {
        let [name, block] = *ast.children(rule) else {
            continue;
        };
        if ast.kind(name) != NodeKind::TokenRef || ast.kind(block) != NodeKind::Block {
            continue;
        }
        let literal = only_child(block, NodeKind::Alt)
            .and_then(|alt| only_child(alt, NodeKind::StringLiteral));
        if let Some(literal) = literal {
            aliases.insert(ast.text(literal).to_owned());
        }
    }
    aliases
}

/// `(RULE TOKEN_REF:<name> (BLOCK (ALT STRING_LITERAL:<literal>)))`
fn literal_rule(ast: &mut Ast, name: &str, literal: &str) -> NodeId {
    let rule = ast.alloc(NodeKind::Rule);
    let id = ast.alloc_with_text(NodeKind::TokenRef, name);
    let block = ast.alloc(NodeKind::Block);
    let alt = ast.alloc(NodeKind::Alt);
    let string = ast.alloc_with_text(NodeKind::StringLiteral, literal);
    ast.push_child(alt, string);
    ast.push_child(block, alt);
    ast.push_child(rule, id);
    ast.push_child(rule, block);
    rule
}
