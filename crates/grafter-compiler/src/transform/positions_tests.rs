use grafter_core::{GrammarSet, NodeKind, TokenSpan, sexpr};

use super::{augment_tokens_with_original_position, set_grammar_owner};
use crate::test_utils::load;

#[test]
fn elements_point_back_at_original_tokens() {
    let mut set = GrammarSet::new();
    let grammar = load(
        &mut set,
        "T.g4",
        "(GRAMMAR:PARSER_GRAMMAR ID:T (RULES (RULE RULE_REF:e (BLOCK (ALT TOKEN_REF:ID)))))",
    );
    let original = set
        .ast
        .descendants_with_kind(set.get(grammar).root, NodeKind::TokenRef)[0];
    set.ast.set_tokens(
        original,
        TokenSpan {
            index: Some(7),
            start: Some(6),
            stop: Some(9),
        },
    );

    let tree = sexpr::parse(
        &mut set.ast,
        "(ALT \
            (TOKEN_REF:ID (ELEMENT_OPTIONS (ASSIGN ID:tokenIndex INT:7))) \
            (TOKEN_REF:X (ELEMENT_OPTIONS (ASSIGN ID:tokenIndex INT:12))) \
            (TOKEN_REF:Y (ELEMENT_OPTIONS (ASSIGN ID:assoc ID:right))))",
    )
    .unwrap();
    let elements = set.ast.children(tree).to_vec();

    augment_tokens_with_original_position(&mut set, grammar, tree);

    assert_eq!(
        set.ast.tokens(elements[0]),
        TokenSpan {
            index: Some(7),
            start: Some(6),
            stop: Some(9),
        }
    );
    assert_eq!(
        set.ast.tokens(elements[1]),
        TokenSpan {
            index: Some(12),
            start: Some(12),
            stop: Some(12),
        }
    );
    assert_eq!(set.ast.tokens(elements[2]), TokenSpan::default());
}

#[test]
fn malformed_token_index_is_ignored() {
    let mut set = GrammarSet::new();
    let grammar = load(&mut set, "T.g4", "(GRAMMAR:PARSER_GRAMMAR ID:T RULES)");
    let tree = sexpr::parse(
        &mut set.ast,
        "(ALT (TOKEN_REF:ID (ELEMENT_OPTIONS (ASSIGN ID:tokenIndex ID:seven))))",
    )
    .unwrap();

    augment_tokens_with_original_position(&mut set, grammar, tree);

    let element = set.ast.child(tree, 0).unwrap();
    assert_eq!(set.ast.tokens(element), TokenSpan::default());
}

#[test]
fn owner_is_set_on_whole_subtree() {
    let mut set = GrammarSet::new();
    let grammar = load(&mut set, "T.g4", "(GRAMMAR:PARSER_GRAMMAR ID:T RULES)");
    let tree = sexpr::parse(&mut set.ast, "(RULE RULE_REF:r (BLOCK (ALT TOKEN_REF:A)))").unwrap();

    set_grammar_owner(&mut set.ast, tree, grammar);

    for node in grafter_core::walk::preorder(&set.ast, tree) {
        assert_eq!(set.ast.owner(node), Some(grammar));
    }
}
