//! Tool-level configuration for the transformation stage.

use std::path::{Path, PathBuf};

/// Settings that come from the command line rather than from a grammar.
#[derive(Clone, Debug, Default)]
pub struct ToolConfig {
    /// Directory the grammar files were read from.
    pub(crate) input_dir: Option<PathBuf>,
    /// Directory searched last for imported grammars and template groups.
    pub(crate) lib_dir: Option<PathBuf>,
    /// Template group given on the command line. Takes precedence over the
    /// grammar's `actionTemplates` option.
    pub(crate) action_templates: Option<String>,
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    pub fn with_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = Some(dir.into());
        self
    }

    /// Set the action template group given on the command line.
    pub fn with_action_templates(mut self, file: impl Into<String>) -> Self {
        self.action_templates = Some(file.into());
        self
    }

    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn lib_dir(&self) -> Option<&Path> {
        self.lib_dir.as_deref()
    }

    pub fn action_templates(&self) -> Option<&str> {
        self.action_templates.as_deref()
    }
}
