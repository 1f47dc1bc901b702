//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use rowan::TextRange;
use serde::Serialize;

use super::Diagnostics;
use super::message::{DiagnosticMessage, Severity};

/// Builder for rendering diagnostics with various options.
///
/// Without a source every diagnostic renders as a plain
/// `error(<code>): <file>:<line>:<col>: <message>` line. With a source,
/// diagnostics carrying a span render as annotated snippets.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            match (self.source, diag.range) {
                (Some(source), Some(range)) => {
                    self.format_snippet(w, &renderer, source, diag, range)?
                }
                _ => write!(w, "{diag}")?,
            }
        }
        Ok(())
    }

    fn format_snippet(
        &self,
        w: &mut impl Write,
        renderer: &Renderer,
        source: &str,
        diag: &DiagnosticMessage,
        range: TextRange,
    ) -> std::fmt::Result {
        let range = adjust_range(range, source.len());
        let mut snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(range));

        if let Some(p) = self.path.or(diag.file.as_deref()) {
            snippet = snippet.path(p);
        }

        let level = severity_to_level(diag.severity());
        let report = vec![level.primary_title(&diag.message).element(snippet)];

        write!(w, "{}", renderer.render(&report))
    }

    /// JSON array with one object per diagnostic.
    pub fn render_json(&self) -> serde_json::Result<String> {
        let entries: Vec<JsonDiagnostic<'_>> =
            self.diagnostics.iter().map(JsonDiagnostic::from).collect();
        serde_json::to_string_pretty(&entries)
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: u16,
    kind: super::DiagnosticKind,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'a str>,
}

impl<'a> From<&'a DiagnosticMessage> for JsonDiagnostic<'a> {
    fn from(diag: &'a DiagnosticMessage) -> Self {
        Self {
            code: diag.kind.code(),
            kind: diag.kind,
            severity: diag.severity(),
            file: diag.file.as_deref(),
            line: diag.position.map(|p| p.line),
            column: diag.position.map(|p| p.column),
            message: &diag.message,
            cause: diag.cause.as_deref(),
        }
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
