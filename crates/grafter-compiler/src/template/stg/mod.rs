//! Built-in engine for `.stg` template group files.

mod compile;
mod group;
mod lexer;
mod render;


use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

pub use compile::CompiledTemplate;

use compile::CompileError;
use super::{
    Coordinate, EngineError, MessageShape, TemplateEngine, TemplateListener, TemplateMessage,
};

pub const GROUP_FILE_SUFFIX: &str = ".stg";

/// Name of the anonymous template an inline action is compiled as.
const INLINE_TEMPLATE_NAME: &str = "action";

const DEFAULT_MAX_DEPTH: usize = 128;

/// A loaded group: its own templates plus the groups it imports.
#[derive(Clone, Debug, Default)]
pub struct StgGroup {
    name: String,
    templates: IndexMap<String, CompiledTemplate>,
    imports: Vec<StgGroup>,
}

impl StgGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own templates first, then imports in declaration order.
    pub fn lookup(&self, name: &str) -> Option<&CompiledTemplate> {
        self.templates
            .get(name)
            .or_else(|| self.imports.iter().find_map(|g| g.lookup(name)))
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn imports(&self) -> &[StgGroup] {
        &self.imports
    }
}

#[derive(Clone, Debug)]
pub struct StgEngine {
    max_depth: usize,
}

impl Default for StgEngine {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StgEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit on nested template includes while rendering.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Build a group from in-memory source. Imports resolve against `dir`,
    /// or the working directory when none is given.
    pub fn group_from_str(
        &self,
        name: &str,
        source: &str,
        dir: Option<&Path>,
        listener: &mut dyn TemplateListener,
    ) -> StgGroup {
        let mut visited = HashSet::new();
        self.build_group(name, source, dir, &mut visited, listener)
    }

    fn load_file(
        &self,
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        listener: &mut dyn TemplateListener,
    ) -> Result<StgGroup, EngineError> {
        if !path.to_string_lossy().ends_with(GROUP_FILE_SUFFIX) {
            return Err(EngineError::WrongExtension {
                path: path.to_owned(),
                suffix: GROUP_FILE_SUFFIX,
            });
        }

        let source = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => EngineError::NotFound(path.to_owned()),
            ErrorKind::InvalidData => EngineError::Read {
                path: path.to_owned(),
                message: "group file is not valid UTF-8".to_owned(),
            },
            _ => EngineError::Io {
                path: path.to_owned(),
                source,
            },
        })?;

        visited.insert(canonical(path));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!(target: "templates", "loading group {}", path.display());

        Ok(self.build_group(&name, &source, path.parent(), visited, listener))
    }

    fn build_group(
        &self,
        name: &str,
        source: &str,
        dir: Option<&Path>,
        visited: &mut HashSet<PathBuf>,
        listener: &mut dyn TemplateListener,
    ) -> StgGroup {
        let mut errors = Vec::new();
        let parsed = group::parse_group(source, &mut errors);
        for err in errors {
            report(listener, name, source, err);
        }

        let mut group = StgGroup {
            name: name.to_owned(),
            ..StgGroup::default()
        };

        for (import, offset) in &parsed.imports {
            let path = match dir {
                Some(dir) => dir.join(import),
                None => PathBuf::from(import),
            };
            if visited.contains(&canonical(&path)) {
                continue;
            }
            match self.load_file(&path, visited, listener) {
                Ok(imported) => group.imports.push(imported),
                Err(EngineError::NotFound(_)) => report(
                    listener,
                    name,
                    source,
                    CompileError {
                        shape: MessageShape::Structural,
                        offset: *offset,
                        text: format!("can't find imported group file {import}"),
                    },
                ),
                Err(err) => {
                    let mut msg = TemplateMessage::new(MessageShape::Plain, err.to_string())
                        .in_source(name);
                    if let Some(cause) = std::error::Error::source(&err) {
                        msg = msg.caused_by(cause.to_string());
                    }
                    listener.io_error(&msg);
                }
            }
        }

        for def in parsed.definitions {
            if group.templates.contains_key(&def.name) {
                report(
                    listener,
                    name,
                    source,
                    CompileError {
                        shape: MessageShape::Structural,
                        offset: def.name_offset,
                        text: format!("redefinition of template /{}", def.name),
                    },
                );
                continue;
            }
            match compile::compile(&def.name, def.params, &def.body) {
                Ok(template) => {
                    group.templates.insert(def.name, template);
                }
                Err(mut err) => {
                    err.offset += def.body_offset;
                    report(listener, name, source, err);
                }
            }
        }

        group
    }
}

fn report(listener: &mut dyn TemplateListener, name: &str, source: &str, err: CompileError) {
    let msg = TemplateMessage::new(err.shape, err.text)
        .in_source(name)
        .at(Coordinate::of_offset(source, err.offset));
    listener.compile_time_error(&msg);
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_owned())
}

impl TemplateEngine for StgEngine {
    type Group = StgGroup;

    fn group_file_suffix(&self) -> &'static str {
        GROUP_FILE_SUFFIX
    }

    fn load_group(
        &self,
        path: &Path,
        listener: &mut dyn TemplateListener,
    ) -> Result<StgGroup, EngineError> {
        let mut visited = HashSet::new();
        self.load_file(path, &mut visited, listener)
    }

    fn render_inline(
        &self,
        group: &StgGroup,
        source_name: &str,
        template: &str,
        listener: &mut dyn TemplateListener,
    ) -> Option<String> {
        log::trace!(target: "templates", "inline template from {source_name}: {template:?}");
        let compiled = match compile::compile(INLINE_TEMPLATE_NAME, Vec::new(), template) {
            Ok(compiled) => compiled,
            Err(err) => {
                let msg = TemplateMessage::new(err.shape, err.text)
                    .at(Coordinate::of_offset(template, err.offset));
                listener.compile_time_error(&msg);
                return None;
            }
        };
        render::render(&compiled, group, listener, self.max_depth)
    }
}
