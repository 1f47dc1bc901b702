//! Source-position bookkeeping for synthesized subtrees.

use grafter_core::grammar::read_options;
use grafter_core::{Ast, GrammarId, GrammarSet, NodeId, NodeKind, TokenSpan};

/// Element option recording the token an element was copied from.
pub const TOKEN_INDEX_OPTION: &str = "tokenIndex";

/// Point elements carrying a `tokenIndex` option back at their original token.
///
/// The element's token span is taken from the node of the grammar's own tree
/// built from that token. When no such node exists the span collapses onto
/// the index itself.
pub fn augment_tokens_with_original_position(
    set: &mut GrammarSet,
    grammar: GrammarId,
    tree: NodeId,
) {
    let grammar_root = set.get(grammar).root;
    let ast = &mut set.ast;

    for options in ast.descendants_with_kind(tree, NodeKind::ElementOptions) {
        let Some(element) = ast.parent(options) else {
            continue;
        };
        let Some(value) = read_options(ast, options).get(TOKEN_INDEX_OPTION).copied() else {
            continue;
        };
        let Ok(index) = ast.text(value).parse::<u32>() else {
            log::debug!(target: "grammar", "ignoring tokenIndex {:?}", ast.text(value));
            continue;
        };

        let tokens = match ast.node_with_token_index(grammar_root, index) {
            Some(original) => {
                let original = ast.tokens(original);
                TokenSpan {
                    index: Some(index),
                    start: original.start,
                    stop: original.stop,
                }
            }
            None => TokenSpan {
                index: Some(index),
                start: Some(index),
                stop: Some(index),
            },
        };
        ast.set_tokens(element, tokens);
    }
}

/// Mark every node of `tree` as belonging to `grammar`.
pub fn set_grammar_owner(ast: &mut Ast, tree: NodeId, grammar: GrammarId) {
    ast.set_owner_recursive(tree, grammar);
}
