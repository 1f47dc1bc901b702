use std::path::Path;

use grafter_core::{GrammarId, GrammarSet, NodeKind};
use indoc::indoc;

use super::ActionTemplateExpander;
use super::stg::StgEngine;
use crate::config::ToolConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::test_utils::load;

const WRITELN: &str = r#"writeln(s) ::= <<outStream.println("<s>");>>"#;

/// `lexer grammar L;` with one rule `I : '0'..'9'+ <action> ;`, the action
/// at 2:14.
fn lexer_grammar(set: &mut GrammarSet, file_name: &str, action: &str) -> GrammarId {
    let src = format!(
        "(GRAMMAR:LEXER_GRAMMAR ID:L
            (RULES
                (RULE TOKEN_REF:I (BLOCK (ALT
                    (POSITIVE_CLOSURE (BLOCK (ALT (RANGE STRING_LITERAL:'0' STRING_LITERAL:'9'))))
                    ACTION:{action}@2:14)))
                (RULE TOKEN_REF:WS (BLOCK (LEXER_ALT_ACTION
                    (ALT (BLOCK (ALT STRING_LITERAL:' ') (ALT STRING_LITERAL:'\\n')))
                    LEXER_ACTION_CALL:skip)))))"
    );
    load(set, file_name, &src)
}

fn write_group(dir: &Path, source: &str) {
    std::fs::write(dir.join("Java.stg"), source).unwrap();
}

fn expand(config: &ToolConfig, set: &mut GrammarSet, grammar: GrammarId) -> Diagnostics {
    let engine = StgEngine::new();
    let mut diagnostics = Diagnostics::new();
    ActionTemplateExpander::new(&engine, config).expand(set, grammar, &mut diagnostics);
    diagnostics
}

fn action_texts(set: &GrammarSet, grammar: GrammarId) -> Vec<String> {
    let root = set.get(grammar).root;
    grafter_core::walk::preorder(&set.ast, root)
        .into_iter()
        .filter(|&id| set.ast.kind(id).is_action_like())
        .map(|id| set.ast.text(id).to_owned())
        .collect()
}

fn config_for(dir: &Path) -> ToolConfig {
    ToolConfig::new()
        .with_input_dir(dir)
        .with_action_templates("Java.stg")
}

#[test]
fn valid_action_template() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", r#"{<writeln("I")>}"#);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(action_texts(&set, g), [r#" outStream.println("I"); "#]);
}

#[test]
fn valid_multiline_action_template() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let reference = dir.path().join("Java.stg");
    let config = ToolConfig::new().with_action_templates(reference.display().to_string());
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{\n  <writeln(\"I\")>\n}");

    let diagnostics = expand(&config, &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(
        action_texts(&set, g),
        [" \n  outStream.println(\"I\");\n "]
    );
}

#[test]
fn unlexable_action_template() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{<¢>}");

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(211): L.g4:2:14: error compiling action template: 2:16: invalid character '¢'");
    assert_eq!(action_texts(&set, g), ["{<¢>}"]);
}

#[test]
fn unlexable_multiline_action_template() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{\n  <¢>\n}");

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(211): L.g4:2:14: error compiling action template: 3:3: invalid character '¢'");
}

#[test]
fn unterminated_expression() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", r#"{<writeln("I")}"#);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(211): L.g4:2:14: error compiling action template: 2:29: premature EOF");
    assert_eq!(action_texts(&set, g), [r#"{<writeln("I")}"#]);
}

#[test]
fn unterminated_multiline_expression() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{\n  <writeln(\"I\")\n}");

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(211): L.g4:2:14: error compiling action template: 4:1: premature EOF");
}

#[test]
fn invalid_group_file() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), r#"writeln(s) := <<outStream.println("<s>");>>"#);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", r#"{<writeln("I")>}"#);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    let path = dir.path().join("Java.stg");
    assert_eq!(
        diagnostics.render(),
        format!(
            "error(209): error compiling action templates file {}: Java.stg 1:11: mismatched input ':' expecting '::='\n\
             error(212): L.g4:2:14: error rendering action template: 2:16: no such template: /writeln",
            path.display()
        )
    );
}

#[test]
fn wrong_extension_is_checked_before_resolution() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Java.st"), "").unwrap();
    let config = ToolConfig::new()
        .with_input_dir(dir.path())
        .with_lib_dir(dir.path())
        .with_action_templates("Java.st");
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{x();}");

    let diagnostics = expand(&config, &mut set, g);

    assert_eq!(diagnostics.kinds(), [DiagnosticKind::GroupFileWrongExtension]);
    insta::assert_snapshot!(diagnostics.render(), @"error(208): error reading action templates file Java.st: Group file names must end in .stg: Java.st");
    assert_eq!(action_texts(&set, g), ["{x();}"]);
}

#[test]
fn missing_file_given_on_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{x();}");

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(206): cannot find action templates file Java.stg given for L");
}

#[test]
fn missing_file_named_in_grammar() {
    let mut set = GrammarSet::new();
    let src = indoc! {"
        (GRAMMAR:LEXER_GRAMMAR ID:L
            (OPTIONS (ASSIGN ID:actionTemplates STRING_LITERAL:'Missing.stg'@1:34))
            (RULES (RULE TOKEN_REF:I (BLOCK (ALT STRING_LITERAL:'i' ACTION:{x();}@2:8)))))
    "};
    let g = load(&mut set, "L.g4", src);

    let diagnostics = expand(&ToolConfig::new(), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(207): L.g4:1:34: cannot find action templates file Missing.stg");
}

#[test]
fn command_line_wins_over_grammar_option() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let src = indoc! {r#"
        (GRAMMAR:LEXER_GRAMMAR ID:L
            (OPTIONS (ASSIGN ID:actionTemplates STRING_LITERAL:'Missing.stg'))
            (RULES (RULE TOKEN_REF:I (BLOCK (ALT STRING_LITERAL:'i' ACTION:{<writeln("i")>})))))
    "#};
    let g = load(&mut set, "L.g4", src);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(action_texts(&set, g), [r#" outStream.println("i"); "#]);
}

#[test]
fn group_next_to_grammar_file() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let grammar_file = dir.path().join("L.g4").display().to_string();
    let mut set = GrammarSet::new();
    let src = indoc! {r#"
        (GRAMMAR:LEXER_GRAMMAR ID:L
            (OPTIONS (ASSIGN ID:actionTemplates STRING_LITERAL:'Java.stg'))
            (RULES (RULE TOKEN_REF:I (BLOCK (ALT STRING_LITERAL:'i' ACTION:{<writeln("i")>})))))
    "#};
    let g = load(&mut set, &grammar_file, src);

    let diagnostics = expand(&ToolConfig::new(), &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(action_texts(&set, g), [r#" outStream.println("i"); "#]);
}

#[test]
fn group_in_lib_dir() {
    let lib = tempfile::tempdir().unwrap();
    write_group(lib.path(), WRITELN);
    let config = ToolConfig::new()
        .with_lib_dir(lib.path())
        .with_action_templates("Java.stg");
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", r#"{<writeln("I")>}"#);

    let diagnostics = expand(&config, &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(action_texts(&set, g), [r#" outStream.println("I"); "#]);
}

#[test]
fn header_action_and_predicate() {
    let dir = tempfile::tempdir().unwrap();
    write_group(
        dir.path(),
        indoc! {"
            normalizerImports() ::= <<
            import java.text.Normalizer;
            import java.text.Normalizer.Form;
            >>
            normalize(s) ::= <<Normalizer.normalize(<s>, Form.NFKC)>>
            getText() ::= <<getText()>>
            setText(s) ::= <<setText(<s>);>>
            pred() ::= <<true>>
        "},
    );
    let mut set = GrammarSet::new();
    let src = indoc! {"
        (GRAMMAR:COMBINED_GRAMMAR ID:P
            (AT ID:lexer ID:header ACTION:{\n<normalizerImports()>\n}@2:15)
            (RULES
                (RULE RULE_REF:atom (BLOCK (ALT SEMPRED:{ <pred()> }?@3:21 RULE_REF:variable)))
                (RULE TOKEN_REF:ID (BLOCK (ALT RULE_REF:ID_START ACTION:{ <setText(normalize(getText()))> }@5:52)))))
    "};
    let g = load(&mut set, "P.g4", src);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    assert!(diagnostics.is_empty(), "{}", diagnostics.render());
    assert_eq!(
        action_texts(&set, g),
        [
            " \nimport java.text.Normalizer;\nimport java.text.Normalizer.Form;\n ",
            "  true  ",
            "  setText(Normalizer.normalize(getText(), Form.NFKC));  ",
        ]
    );
}

#[test]
fn one_failing_action_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), WRITELN);
    let mut set = GrammarSet::new();
    let src = indoc! {r#"
        (GRAMMAR:LEXER_GRAMMAR ID:L
            (RULES
                (RULE TOKEN_REF:A (BLOCK (ALT STRING_LITERAL:'a' ACTION:{<nope()>}@2:8)))
                (RULE TOKEN_REF:B (BLOCK (ALT STRING_LITERAL:'b' ACTION:{<writeln("B")>}@3:8)))))
    "#};
    let g = load(&mut set, "L.g4", src);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(212): L.g4:2:8: error rendering action template: 2:10: no such template: /nope");
    assert_eq!(
        action_texts(&set, g),
        ["{<nope()>}", r#" outStream.println("B"); "#]
    );
}

#[test]
fn errors_inside_included_templates_carry_only_their_text() {
    let dir = tempfile::tempdir().unwrap();
    write_group(dir.path(), r#"w(s) ::= "<x>""#);
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", r#"{<w("a")>}"#);

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    insta::assert_snapshot!(diagnostics.render(), @"error(212): L.g4:2:14: error rendering action template: attribute x isn't defined");
    assert_eq!(action_texts(&set, g)[0], r#"{<w("a")>}"#);
}

#[test]
fn unreadable_group_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Java.stg"), [0xff, 0xfe, 0x00]).unwrap();
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{x();}");

    let diagnostics = expand(&config_for(dir.path()), &mut set, g);

    assert_eq!(diagnostics.kinds(), [DiagnosticKind::GroupFileReadError]);
    assert_eq!(
        diagnostics.render(),
        format!(
            "error(208): error reading action templates file Java.stg: {}: group file is not valid UTF-8",
            dir.path().join("Java.stg").display()
        )
    );
}

#[test]
fn nothing_configured() {
    let mut set = GrammarSet::new();
    let g = lexer_grammar(&mut set, "L.g4", "{<¢>}");

    let diagnostics = expand(&ToolConfig::new(), &mut set, g);

    assert!(diagnostics.is_empty());
    assert_eq!(action_texts(&set, g), ["{<¢>}"]);
    assert_eq!(
        set.ast.descendants_with_kind(set.get(g).root, NodeKind::Action).len(),
        1
    );
}
