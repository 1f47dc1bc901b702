//! Diagnostics collected while transforming grammars.
//!
//! Passes never print. They report through [`Diagnostics::report`] and the
//! caller decides how to render (plain lines, annotated snippets, or JSON).

mod message;
mod printer;

#[cfg(test)]
mod tests;

use grafter_core::Position;
use rowan::TextRange;

pub use message::{DiagnosticKind, DiagnosticMessage, Severity};
pub use printer::DiagnosticsPrinter;

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Create a diagnostic of the given kind.
    ///
    /// Uses the kind's default message. Call `.message()` on the builder to override.
    pub fn report(&mut self, kind: DiagnosticKind) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::with_default_message(kind),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.messages.iter().map(|d| d.kind).collect()
    }

    /// Plain one-line-per-diagnostic rendering.
    pub fn render(&self) -> String {
        self.printer().render()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Provide custom detail for this diagnostic, rendered using the kind's template.
    pub fn message(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.message.message = self.message.kind.message(Some(&detail));
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.message.file = Some(file.into());
        self
    }

    /// Source position. Unknown positions (line 0) are ignored.
    pub fn at(mut self, position: Position) -> Self {
        if position.is_known() {
            self.message.position = Some(position);
        }
        self
    }

    pub fn span(mut self, range: Option<TextRange>) -> Self {
        self.message.range = range;
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.message.cause = Some(cause.into());
        self
    }

    pub fn emit(self) {
        log::trace!(target: "diagnostics", "{}", self.message);
        self.diagnostics.messages.push(self.message);
    }
}
