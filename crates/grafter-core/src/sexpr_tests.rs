use indoc::indoc;

use crate::ast::{Ast, Position};
use crate::grammar::{GrammarKind, GrammarSet};
use crate::kind::NodeKind;
use crate::sexpr::{self, ParseError};

#[test]
fn parse_and_dump() {
    let mut ast = Ast::new();
    let src = indoc! {"
        (GRAMMAR:COMBINED_GRAMMAR ID:T
            (RULES
                (RULE RULE_REF:a (BLOCK (ALT STRING_LITERAL:'x y' ACTION:{f(1);})))))
    "};

    let root = sexpr::parse(&mut ast, src).unwrap();

    insta::assert_snapshot!(ast.dump(root), @"(GRAMMAR:COMBINED_GRAMMAR ID:T (RULES (RULE RULE_REF:a (BLOCK (ALT STRING_LITERAL:'x y' ACTION:{f(1);})))))");
}

#[test]
fn positions_are_read_not_dumped() {
    let mut ast = Ast::new();
    let root = sexpr::parse(&mut ast, "(ALT SEMPRED:{p()}?@2:14)").unwrap();
    let pred = ast.child(root, 0).unwrap();

    assert_eq!(ast.text(pred), "{p()}?");
    assert_eq!(ast.position(pred), Position::new(2, 14));
    insta::assert_snapshot!(ast.dump(root), @"(ALT SEMPRED:{p()}?)");
}

#[test]
fn nested_braces_and_newlines() {
    let mut ast = Ast::new();
    let src = "ACTION:{\n  if (x) { y(); }\n}@1:0";

    let action = sexpr::parse(&mut ast, src).unwrap();

    assert_eq!(ast.kind(action), NodeKind::Action);
    assert_eq!(ast.text(action), "{\n  if (x) { y(); }\n}");
}

#[test]
fn unknown_kind() {
    let mut ast = Ast::new();

    let err = sexpr::parse(&mut ast, "(FOO ID:a)").unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"unknown node kind `FOO` at offset 1");
}

#[test]
fn unclosed_paren() {
    let mut ast = Ast::new();

    let err = sexpr::parse(&mut ast, "(ALT ID:a").unwrap_err();

    assert_eq!(err, ParseError::UnexpectedEof { expected: "`)`" });
}

#[test]
fn unterminated_action() {
    let mut ast = Ast::new();

    let err = sexpr::parse(&mut ast, "ACTION:{oops").unwrap_err();

    assert_eq!(err, ParseError::InvalidInput { offset: 7 });
}

#[test]
fn trailing_input() {
    let mut ast = Ast::new();

    let err = sexpr::parse(&mut ast, "ID:a ID:b").unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"unexpected `ID` at offset 5, expected end of input");
}

#[test]
fn load_grammar_registers_set_entry() {
    let mut set = GrammarSet::new();
    let src = "(GRAMMAR:LEXER_GRAMMAR ID:L (OPTIONS (ASSIGN ID:language ID:Java)))";

    let id = sexpr::load_grammar(&mut set, "L.g4", src).unwrap();

    let grammar = set.get(id);
    assert_eq!(grammar.name, "L");
    assert_eq!(grammar.kind, GrammarKind::Lexer);
    assert_eq!(grammar.option_string(&set.ast, "language").as_deref(), Some("Java"));
}
