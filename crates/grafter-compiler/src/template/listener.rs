//! Listeners that turn template engine diagnostics into grammar diagnostics.

use grafter_core::Position;
use rowan::TextRange;

use super::{Coordinate, MessageShape, TemplateListener, TemplateMessage};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Map a coordinate inside an embedded template to the grammar source.
///
/// The template starts at the action's opening brace, so only its first line
/// inherits the action's column; later lines already start at column 0.
pub fn remap(action: Position, at: Coordinate) -> Position {
    let line = (action.line + at.line).saturating_sub(1);
    let column = if at.line == 1 {
        at.column + action.column
    } else {
        at.column
    };
    Position::new(line, column)
}

fn report_internal(diagnostics: &mut Diagnostics, msg: &TemplateMessage) {
    let mut builder = diagnostics
        .report(DiagnosticKind::InternalError)
        .message(msg.to_string());
    if let Some(cause) = &msg.cause {
        builder = builder.cause(cause.clone());
    }
    builder.emit();
}

/// Listener for loading a template group file.
///
/// Messages keep the engine's own file coordinates and are reported as
/// tool-level diagnostics naming the group file.
pub struct GroupFileListener<'a> {
    diagnostics: &'a mut Diagnostics,
    file_name: String,
}

impl<'a> GroupFileListener<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics, file_name: impl Into<String>) -> Self {
        Self {
            diagnostics,
            file_name: file_name.into(),
        }
    }

    fn report(&mut self, kind: DiagnosticKind, msg: &TemplateMessage) {
        self.diagnostics
            .report(kind)
            .message(format!("{}: {msg}", self.file_name))
            .emit();
    }
}

impl TemplateListener for GroupFileListener<'_> {
    fn compile_time_error(&mut self, msg: &TemplateMessage) {
        self.report(DiagnosticKind::GroupFileCompileError, msg);
    }

    fn runtime_error(&mut self, msg: &TemplateMessage) {
        self.report(DiagnosticKind::GroupFileRenderError, msg);
    }

    fn io_error(&mut self, msg: &TemplateMessage) {
        report_internal(self.diagnostics, msg);
    }

    fn internal_error(&mut self, msg: &TemplateMessage) {
        report_internal(self.diagnostics, msg);
    }
}

/// Listener for one ACTION or SEMPRED node being expanded.
///
/// Diagnostics are located at the node; positions inside the template are
/// remapped into grammar coordinates and prefixed to the message.
pub struct EmbeddedActionListener<'a> {
    diagnostics: &'a mut Diagnostics,
    grammar_file: String,
    action: Position,
    span: Option<TextRange>,
}

impl<'a> EmbeddedActionListener<'a> {
    pub fn new(
        diagnostics: &'a mut Diagnostics,
        grammar_file: impl Into<String>,
        action: Position,
        span: Option<TextRange>,
    ) -> Self {
        Self {
            diagnostics,
            grammar_file: grammar_file.into(),
            action,
            span,
        }
    }

    fn located_text(&self, msg: &TemplateMessage) -> String {
        match msg.position {
            Some(at) => format!("{}: {}", remap(self.action, at), msg.text),
            None => msg.text.clone(),
        }
    }

    fn report(&mut self, kind: DiagnosticKind, detail: String) {
        self.diagnostics
            .report(kind)
            .file(self.grammar_file.clone())
            .at(self.action)
            .span(self.span)
            .message(detail)
            .emit();
    }
}

impl TemplateListener for EmbeddedActionListener<'_> {
    fn compile_time_error(&mut self, msg: &TemplateMessage) {
        let detail = match msg.shape {
            MessageShape::Structural | MessageShape::Lexer => self.located_text(msg),
            MessageShape::Plain => msg.to_string(),
        };
        self.report(DiagnosticKind::ActionTemplateCompileError, detail);
    }

    fn runtime_error(&mut self, msg: &TemplateMessage) {
        let mut detail = self.located_text(msg);
        if let Some(cause) = &msg.cause {
            detail.push_str("\nCaused by: ");
            detail.push_str(cause);
        }
        self.report(DiagnosticKind::ActionTemplateRenderError, detail);
    }

    fn io_error(&mut self, msg: &TemplateMessage) {
        report_internal(self.diagnostics, msg);
    }

    fn internal_error(&mut self, msg: &TemplateMessage) {
        report_internal(self.diagnostics, msg);
    }
}
