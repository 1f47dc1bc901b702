use grafter_core::Position;
use rowan::TextRange;

use super::*;

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"error");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"warning");
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(DiagnosticKind::InternalError).emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    insta::assert_snapshot!(diagnostics.render(), @"error(20): internal error");
}

#[test]
fn warnings_are_not_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::OptionsInDelegate)
        .file("S.g4")
        .at(Position::new(2, 0))
        .message("S")
        .emit();

    assert!(!diagnostics.has_errors());
    assert!(diagnostics.has_warnings());
    assert_eq!(diagnostics.warning_count(), 1);
    insta::assert_snapshot!(diagnostics.render(), @"warning(109): S.g4:2:0: options ignored in imported grammar S");
}

#[test]
fn plain_format_with_location() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ActionTemplateCompileError)
        .file("L.g4")
        .at(Position::new(2, 14))
        .message("2:16: invalid character '¢'")
        .emit();
    diagnostics
        .report(DiagnosticKind::GroupFileNotFoundOnCmdline)
        .message("Java.stg given for L")
        .emit();

    insta::assert_snapshot!(diagnostics.render(), @r"
    error(211): L.g4:2:14: error compiling action template: 2:16: invalid character '¢'
    error(206): cannot find action templates file Java.stg given for L
    ");
}

#[test]
fn unknown_position_is_dropped() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ActionRedefinition)
        .file("T.g4")
        .at(Position::default())
        .message("members")
        .emit();

    insta::assert_snapshot!(diagnostics.render(), @"error(94): T.g4: redefinition of `members` action");
}

#[test]
fn cause_is_appended() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::InternalError)
        .message("can't read Java.stg")
        .cause("permission denied")
        .emit();

    insta::assert_snapshot!(diagnostics.render(), @r"
    error(20): internal error: can't read Java.stg
    Caused by: permission denied
    ");
}

#[test]
fn printer_with_span_and_path() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ActionRedefinition)
        .file("T.g4")
        .span(Some(TextRange::new(1.into(), 8.into())))
        .message("members")
        .emit();

    let result = diagnostics.printer().source("@members {x}").render();
    insta::assert_snapshot!(result, @r"
    error: redefinition of `members` action
     --> T.g4:1:2
      |
    1 | @members {x}
      |  ^^^^^^^
    ");
}

#[test]
fn printer_falls_back_to_plain_without_span() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::GroupFileCompileError)
        .message("/tmp/Java.stg: Java.stg 1:11: mismatched input ':' expecting '::='")
        .emit();

    let result = diagnostics.printer().source("grammar T;").render();
    insta::assert_snapshot!(result, @"error(209): error compiling action templates file /tmp/Java.stg: Java.stg 1:11: mismatched input ':' expecting '::='");
}

#[test]
fn printer_colored() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ActionRedefinition)
        .span(Some(TextRange::new(0.into(), 5.into())))
        .message("test")
        .emit();

    let result = diagnostics.printer().source("hello").colored(true).render();
    assert!(result.contains("test"));
    assert!(result.contains('\x1b'));
}

#[test]
fn printer_empty_diagnostics() {
    let diagnostics = Diagnostics::new();
    let result = diagnostics.printer().source("source").render();
    assert!(result.is_empty());
}

#[test]
fn json_output() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ActionTemplateRenderError)
        .file("L.g4")
        .at(Position::new(2, 14))
        .message("2:16: no such template: /writeln")
        .emit();

    let json = diagnostics.printer().render_json().unwrap();
    insta::assert_snapshot!(json, @r#"
    [
      {
        "code": 212,
        "kind": "ACTION_TEMPLATE_RENDER_ERROR",
        "severity": "error",
        "file": "L.g4",
        "line": 2,
        "column": 14,
        "message": "error rendering action template: 2:16: no such template: /writeln"
      }
    ]
    "#);
}

#[test]
fn extend_merges() {
    let mut a = Diagnostics::new();
    a.report(DiagnosticKind::InternalError).emit();
    let mut b = Diagnostics::new();
    b.report(DiagnosticKind::OptionsInDelegate).emit();

    a.extend(b);

    assert_eq!(
        a.kinds(),
        [DiagnosticKind::InternalError, DiagnosticKind::OptionsInDelegate]
    );
    assert_eq!(a.error_count(), 1);
}
