//! Import integration: merge delegate grammars into the root grammar's tree.
//!
//! ```text
//! (TOKENS_SPEC X) + (TOKENS_SPEC Z)          ->  (TOKENS_SPEC X Z)
//! (AT members {foo}) + (AT members {bar})    ->  (AT members {foo\nbar})
//! (RULES (RULE x) (RULE y)) + (RULES (RULE z)) ->  (RULES (RULE x) (RULE y) (RULE z))
//! ```
//!
//! The root always wins: a rule already defined in the root, or pulled in
//! from an earlier import, keeps a later import's rule of the same name out.

use std::collections::HashSet;

use grafter_core::grammar::section_name;
use grafter_core::{Ast, GrammarId, GrammarSet, NodeId, NodeKind};
use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Merge every transitive import of `root_grammar` into its tree.
pub fn integrate_imports(
    set: &mut GrammarSet,
    root_grammar: GrammarId,
    diagnostics: &mut Diagnostics,
) {
    let imports = set.all_imports(root_grammar);
    if imports.is_empty() {
        return;
    }

    let mut merge = ImportMerge::new(set, root_grammar);
    for import in imports {
        merge.channels(set, import);
        merge.tokens(set, import);
        merge.named_actions(set, import, diagnostics);
        merge.modes(set, import);
        merge.rules(set, import);
        merge.options(set, import, diagnostics);
    }

    log::debug!(target: "grammar", "Grammar: {}", set.ast.dump(merge.root));
}

/// State carried across imports.
struct ImportMerge {
    grammar: GrammarId,
    root: NodeId,
    rules: NodeId,
    default_scope: &'static str,
    /// Every rule name in the merged tree, modes included.
    rule_names: HashSet<String>,
    modes: Vec<NodeId>,
    /// AT nodes already reported as redefinitions.
    redefinitions: HashSet<NodeId>,
}

impl ImportMerge {
    fn new(set: &mut GrammarSet, grammar: GrammarId) -> Self {
        let root = set.get(grammar).root;
        let rules = match set.ast.first_child_with_kind(root, NodeKind::Rules) {
            Some(rules) => rules,
            None => {
                let rules = set.ast.alloc(NodeKind::Rules);
                set.ast.set_owner(rules, grammar);
                set.ast.push_child(root, rules);
                rules
            }
        };
        let rule_names = set
            .get(grammar)
            .rules(&set.ast)
            .into_iter()
            .map(|rule| section_name(&set.ast, rule).to_owned())
            .collect();

        Self {
            grammar,
            root,
            rules,
            default_scope: set.get(grammar).default_action_scope(),
            rule_names,
            modes: set.ast.children_with_kind(root, NodeKind::Mode),
            redefinitions: HashSet::new(),
        }
    }

    fn channels(&mut self, set: &mut GrammarSet, import: GrammarId) {
        let import_root = set.get(import).root;
        let ast = &mut set.ast;
        let Some(imported) = ast.first_child_with_kind(import_root, NodeKind::Channels) else {
            return;
        };
        log::debug!(target: "grammar", "imported channels: {}", ast.dump(imported));

        let Some(channels) = ast.first_child_with_kind(self.root, NodeKind::Channels) else {
            let copy = ast.dup_tree(imported);
            ast.set_owner_recursive(copy, self.grammar);
            ast.attach(self.root, copy, 1);
            return;
        };

        for channel in ast.children(imported).to_vec() {
            let present = ast
                .children(channels)
                .iter()
                .any(|&existing| ast.text(existing) == ast.text(channel));
            if !present {
                let copy = ast.dup_node(channel);
                ast.set_owner(copy, self.grammar);
                ast.push_child(channels, copy);
            }
        }
    }

    fn tokens(&mut self, set: &mut GrammarSet, import: GrammarId) {
        let import_root = set.get(import).root;
        let ast = &mut set.ast;
        let Some(imported) = ast.first_child_with_kind(import_root, NodeKind::TokensSpec) else {
            return;
        };
        log::debug!(target: "grammar", "imported tokens: {}", ast.dump(imported));

        let tokens = match ast.first_child_with_kind(self.root, NodeKind::TokensSpec) {
            Some(tokens) => tokens,
            None => {
                let tokens = ast.alloc(NodeKind::TokensSpec);
                ast.set_owner(tokens, self.grammar);
                ast.attach(self.root, tokens, 1);
                tokens
            }
        };
        // Duplicates are resolved when token types are assigned.
        for token in ast.children(imported).to_vec() {
            ast.push_child(tokens, token);
        }
    }

    fn named_actions(
        &mut self,
        set: &mut GrammarSet,
        import: GrammarId,
        diagnostics: &mut Diagnostics,
    ) {
        let import_root = set.get(import).root;
        let mut candidates = set.ast.children_with_kind(self.root, NodeKind::At);
        let imported = set.ast.children_with_kind(import_root, NodeKind::At);
        if imported.is_empty() && candidates.is_empty() {
            return;
        }
        log::debug!(target: "grammar", "imported actions: {}", imported.len());
        candidates.extend(imported);

        let mut named: IndexMap<(String, String), NodeId> = IndexMap::new();
        for at in candidates {
            let Some(parts) = NamedAction::of(&set.ast, at, self.default_scope) else {
                continue;
            };
            let key = (parts.scope.clone(), set.ast.text(parts.name).to_owned());
            let Some(&previous) = named.get(&key) else {
                named.insert(key, at);
                continue;
            };

            if set.ast.owner(previous) == set.ast.owner(at) {
                if self.redefinitions.insert(at) {
                    let file = set
                        .ast
                        .owner(at)
                        .map_or_else(|| set.get(self.grammar), |g| set.get(g))
                        .file_name
                        .clone();
                    diagnostics
                        .report(DiagnosticKind::ActionRedefinition)
                        .file(file)
                        .at(set.ast.position(parts.name))
                        .span(set.ast.range(parts.name))
                        .message(key.1)
                        .emit();
                }
                continue;
            }

            let Some(kept) = NamedAction::of(&set.ast, previous, self.default_scope) else {
                continue;
            };
            let merged = format!(
                "{{{}\n{}}}",
                strip_braces(set.ast.text(kept.action)),
                strip_braces(set.ast.text(parts.action))
            );
            set.ast.set_text(kept.action, merged);
        }

        for ((scope, name), at) in named {
            log::debug!(
                target: "grammar",
                "{scope}:{name}={}",
                NamedAction::of(&set.ast, at, self.default_scope)
                    .map_or("", |parts| set.ast.text(parts.action))
            );
            if !set.ast.is_within(at, self.root) {
                set.ast.detach(at);
                set.ast.attach(self.root, at, 1);
            }
        }
    }

    fn modes(&mut self, set: &mut GrammarSet, import: GrammarId) {
        let import_root = set.get(import).root;
        let ast = &mut set.ast;

        for mode in ast.children_with_kind(import_root, NodeKind::Mode) {
            log::debug!(target: "grammar", "imported mode: {}", ast.dump(mode));
            let name = section_name(ast, mode).to_owned();
            let existing = self
                .modes
                .iter()
                .copied()
                .find(|&m| section_name(ast, m) == name);

            let destination = match existing {
                Some(destination) => destination,
                None => {
                    let destination = ast.dup_node(mode);
                    ast.set_owner(destination, self.grammar);
                    if let Some(id) = ast.child(mode, 0) {
                        let id = ast.dup_node(id);
                        ast.push_child(destination, id);
                    }
                    destination
                }
            };

            let mut added = 0;
            for rule in ast.children_with_kind(mode, NodeKind::Rule) {
                let rule_name = section_name(ast, rule).to_owned();
                if self.rule_names.insert(rule_name) {
                    ast.push_child(destination, rule);
                    added += 1;
                }
            }

            // A new mode that received nothing is dropped.
            if existing.is_none() && added > 0 {
                ast.push_child(self.root, destination);
                self.modes.push(destination);
            }
        }
    }

    fn rules(&mut self, set: &mut GrammarSet, import: GrammarId) {
        let import_root = set.get(import).root;
        let ast = &mut set.ast;
        let Some(imported) = ast.first_child_with_kind(import_root, NodeKind::Rules) else {
            return;
        };

        for rule in ast.children_with_kind(imported, NodeKind::Rule) {
            log::debug!(target: "grammar", "imported rule: {}", ast.dump(rule));
            let name = section_name(ast, rule).to_owned();
            if self.rule_names.insert(name) {
                ast.push_child(self.rules, rule);
            }
        }
    }

    /// Warn once per import whose options differ from the root's. Options
    /// missing on either side are not compared.
    fn options(&self, set: &GrammarSet, import: GrammarId, diagnostics: &mut Diagnostics) {
        let grammar = set.get(import);
        let Some(options) = set.ast.first_child_with_kind(grammar.root, NodeKind::Options) else {
            return;
        };
        let root = set.get(self.grammar);

        let differs = grammar.options.keys().any(|name| {
            match (
                grammar.option_string(&set.ast, name),
                root.option_string(&set.ast, name),
            ) {
                (Some(imported), Some(own)) => imported != own,
                _ => false,
            }
        });

        if differs {
            diagnostics
                .report(DiagnosticKind::OptionsInDelegate)
                .file(grammar.file_name.clone())
                .at(set.ast.position(options))
                .span(set.ast.range(options))
                .message(grammar.name.clone())
                .emit();
        }
    }
}

/// Parts of `(AT [scope] name ACTION)`.
struct NamedAction {
    scope: String,
    name: NodeId,
    action: NodeId,
}

impl NamedAction {
    fn of(ast: &Ast, at: NodeId, default_scope: &str) -> Option<Self> {
        let children = ast.children(at);
        match *children {
            [scope, name, action] => Some(Self {
                scope: ast.text(scope).to_owned(),
                name,
                action,
            }),
            [name, action] => Some(Self {
                scope: default_scope.to_owned(),
                name,
                action,
            }),
            _ => None,
        }
    }
}

fn strip_braces(text: &str) -> &str {
    text.strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(text)
}
