//! Expansion of template references inside ACTION and SEMPRED nodes.
//!
//! The group file comes from the command line or from the grammar's
//! `actionTemplates` option. Every action body is rendered as an inline
//! template importing that group; a failing action keeps its text and the
//! walk moves on.

use std::path::{Path, PathBuf};

use grafter_core::grammar::option_value_string;
use grafter_core::walk::{self, Order};
use grafter_core::{Ast, Grammar, GrammarId, GrammarSet, NodeId, NodeKind};

use super::listener::{EmbeddedActionListener, GroupFileListener};
use super::{EngineError, TemplateEngine};
use crate::config::ToolConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Grammar option naming the action template group.
pub const ACTION_TEMPLATES_OPTION: &str = "actionTemplates";

/// Where the group file reference came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupReference {
    CommandLine(String),
    /// The option's value node, for locating diagnostics.
    GrammarOption { file: String, value: NodeId },
}

impl GroupReference {
    pub fn file(&self) -> &str {
        match self {
            GroupReference::CommandLine(file) | GroupReference::GrammarOption { file, .. } => file,
        }
    }
}

pub struct ActionTemplateExpander<'e, E: TemplateEngine> {
    engine: &'e E,
    config: &'e ToolConfig,
}

impl<'e, E: TemplateEngine> ActionTemplateExpander<'e, E> {
    pub fn new(engine: &'e E, config: &'e ToolConfig) -> Self {
        Self { engine, config }
    }

    /// The configured group reference. The command line wins over the
    /// grammar option.
    pub fn reference(&self, set: &GrammarSet, grammar: GrammarId) -> Option<GroupReference> {
        if let Some(file) = self.config.action_templates() {
            return Some(GroupReference::CommandLine(file.to_owned()));
        }
        let value = set.get(grammar).option(ACTION_TEMPLATES_OPTION)?;
        Some(GroupReference::GrammarOption {
            file: option_value_string(&set.ast, value),
            value,
        })
    }

    /// Find the group file: as given, then under the input directory, next to
    /// the grammar file, and under the library directory.
    pub fn resolve_group_file(&self, grammar: &Grammar, file: &str) -> Option<PathBuf> {
        let grammar_dir = Path::new(&grammar.file_name).parent();
        let candidates = [
            Some(PathBuf::from(file)),
            self.config.input_dir().map(|dir| dir.join(file)),
            grammar_dir.map(|dir| dir.join(file)),
            self.config.lib_dir().map(|dir| dir.join(file)),
        ];
        candidates.into_iter().flatten().find(|path| path.exists())
    }

    /// Expand every ACTION and SEMPRED node of `grammar`. Does nothing when no
    /// group is configured; problems are reported, never returned.
    pub fn expand(&self, set: &mut GrammarSet, grammar: GrammarId, diagnostics: &mut Diagnostics) {
        let Some(reference) = self.reference(set, grammar) else {
            return;
        };
        let Some(group) = self.load(&set.ast, set.get(grammar), &reference, diagnostics) else {
            return;
        };

        // Rules merged from imports keep their owner, so diagnostics name
        // the file each action was written in.
        let files: Vec<String> = set.ids().map(|id| set.get(id).file_name.clone()).collect();
        let (ast, grammar) = set.ast_and_grammar(grammar);
        let root_file = &grammar.file_name;
        walk::rewrite(ast, grammar.root, Order::Pre, |ast, node| {
            let kind = ast.kind(node);
            if !kind.is_action_like() {
                return None;
            }
            let template = format!(" {} ", action_body(kind, ast.text(node))?);
            let file_name = ast
                .owner(node)
                .and_then(|owner| files.get(owner.index()))
                .unwrap_or(root_file);

            let mut listener = EmbeddedActionListener::new(
                &mut *diagnostics,
                file_name.clone(),
                ast.position(node),
                ast.range(node),
            );
            if let Some(rendered) =
                self.engine
                    .render_inline(&group, file_name, &template, &mut listener)
            {
                ast.set_text(node, rendered);
            }
            None
        });
    }

    fn load(
        &self,
        ast: &Ast,
        grammar: &Grammar,
        reference: &GroupReference,
        diagnostics: &mut Diagnostics,
    ) -> Option<E::Group> {
        let file = reference.file();
        let suffix = self.engine.group_file_suffix();
        if !file.ends_with(suffix) {
            let err = EngineError::WrongExtension {
                path: PathBuf::from(file),
                suffix,
            };
            diagnostics
                .report(DiagnosticKind::GroupFileWrongExtension)
                .message(format!("{file}: {err}"))
                .emit();
            return None;
        }

        let Some(path) = self.resolve_group_file(grammar, file) else {
            not_found(ast, grammar, reference, diagnostics);
            return None;
        };

        log::debug!(target: "grammar", "action templates: {}", path.display());
        let mut listener = GroupFileListener::new(diagnostics, path.display().to_string());
        match self.engine.load_group(&path, &mut listener) {
            Ok(group) => Some(group),
            Err(EngineError::NotFound(_)) => {
                not_found(ast, grammar, reference, diagnostics);
                None
            }
            Err(err @ EngineError::WrongExtension { .. }) => {
                diagnostics
                    .report(DiagnosticKind::GroupFileWrongExtension)
                    .message(format!("{file}: {err}"))
                    .emit();
                None
            }
            Err(err @ EngineError::Read { .. }) => {
                diagnostics
                    .report(DiagnosticKind::GroupFileReadError)
                    .message(format!("{file}: {err}"))
                    .emit();
                None
            }
            Err(err @ EngineError::Io { .. }) => {
                let mut builder = diagnostics
                    .report(DiagnosticKind::InternalError)
                    .message(err.to_string());
                if let Some(source) = std::error::Error::source(&err) {
                    builder = builder.cause(source.to_string());
                }
                builder.emit();
                None
            }
        }
    }
}

fn not_found(
    ast: &Ast,
    grammar: &Grammar,
    reference: &GroupReference,
    diagnostics: &mut Diagnostics,
) {
    match reference {
        GroupReference::CommandLine(file) => diagnostics
            .report(DiagnosticKind::GroupFileNotFoundOnCmdline)
            .message(format!("{file} given for {}", grammar.name))
            .emit(),
        GroupReference::GrammarOption { file, value } => diagnostics
            .report(DiagnosticKind::GroupFileNotFoundInGrammar)
            .file(grammar.file_name.clone())
            .at(ast.position(*value))
            .span(ast.range(*value))
            .message(file.clone())
            .emit(),
    }
}

/// Text between the braces of an action, or of a predicate's `{...}?`.
fn action_body(kind: NodeKind, text: &str) -> Option<&str> {
    let inner = text.strip_prefix('{')?;
    match kind {
        NodeKind::Sempred => inner.strip_suffix("}?"),
        _ => inner.strip_suffix('}'),
    }
}
