//! Template engine boundary.
//!
//! The expander talks to a template engine only through [`TemplateEngine`]
//! and receives its diagnostics through a [`TemplateListener`]. The built-in
//! [`stg::StgEngine`] implements the `.stg` group-file format; any other
//! engine can be plugged in through the same trait.

pub mod expand;
pub mod listener;
pub mod stg;

#[cfg(test)]
mod expand_tests;

use std::path::{Path, PathBuf};

pub use expand::ActionTemplateExpander;
pub use listener::{EmbeddedActionListener, GroupFileListener};

/// Position inside a template source. Lines are 1-based, columns 0-based
/// and counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub line: u32,
    pub column: u32,
}

impl Coordinate {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Coordinate of a byte offset in `source`.
    pub fn of_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..floor_char_boundary(source, offset)];
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() as u32;
        Self { line, column }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// What produced a compile-time message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageShape {
    /// Template or group syntax error reported by the parser.
    Structural,
    /// Malformed character or token reported by the lexer.
    Lexer,
    /// Anything else; rendered through `Display` only.
    Plain,
}

/// One diagnostic from the template engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateMessage {
    pub shape: MessageShape,
    /// Group file the message belongs to, for messages about group files.
    pub source_name: Option<String>,
    pub position: Option<Coordinate>,
    pub text: String,
    pub cause: Option<String>,
}

impl TemplateMessage {
    pub fn new(shape: MessageShape, text: impl Into<String>) -> Self {
        Self {
            shape,
            source_name: None,
            position: None,
            text: text.into(),
            cause: None,
        }
    }

    pub fn at(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self
    }

    pub fn in_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// `[<source> ][<line>:<col>: ]<text>`
impl std::fmt::Display for TemplateMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.source_name, self.position) {
            (Some(name), Some(pos)) => write!(f, "{name} {pos}: ")?,
            (Some(name), None) => write!(f, "{name}: ")?,
            (None, Some(pos)) => write!(f, "{pos}: ")?,
            (None, None) => {}
        }
        f.write_str(&self.text)
    }
}

/// Receiver of template engine diagnostics.
pub trait TemplateListener {
    fn compile_time_error(&mut self, msg: &TemplateMessage);
    fn runtime_error(&mut self, msg: &TemplateMessage);
    fn io_error(&mut self, msg: &TemplateMessage);
    fn internal_error(&mut self, msg: &TemplateMessage);
}

/// Failures that prevent a group from loading at all.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no such group file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Group file names must end in {suffix}: {}", .path.display())]
    WrongExtension { path: PathBuf, suffix: &'static str },

    /// The file exists but is not a readable group.
    #[error("{}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("can't read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A template engine: loads groups from files and renders inline templates
/// against them.
pub trait TemplateEngine {
    type Group;

    /// Required file name suffix of group files, including the dot.
    fn group_file_suffix(&self) -> &'static str;

    /// Load and eagerly compile a group file. Syntax problems inside the file
    /// go to the listener; only failures to obtain a group at all are errors.
    fn load_group(
        &self,
        path: &Path,
        listener: &mut dyn TemplateListener,
    ) -> Result<Self::Group, EngineError>;

    /// Compile `template` as an anonymous template importing `group` and
    /// render it with no arguments.
    ///
    /// Returns `None` if any compile-time or runtime error was reported.
    fn render_inline(
        &self,
        group: &Self::Group,
        source_name: &str,
        template: &str,
        listener: &mut dyn TemplateListener,
    ) -> Option<String>;
}
