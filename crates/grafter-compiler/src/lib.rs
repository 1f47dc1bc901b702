//! Grafter compiler: the grammar transformation stage.
//!
//! This crate rewrites parsed grammar trees into the self-contained form
//! consumed by code generation:
//! - `transform` - import integration, implicit lexer extraction, token positions
//! - `template` - action template expansion and the built-in `.stg` engine
//! - `pipeline` - the driver running the stages in order
//! - `diagnostics` - error reporting
//! - `config` - tool-level settings

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod template;
pub mod transform;

#[cfg(test)]
pub mod test_utils;

pub use config::ToolConfig;
pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use pipeline::{GrammarTransformPipeline, TreePass};
pub use template::stg::StgEngine;
pub use template::{TemplateEngine, TemplateListener};
pub use transform::{ImplicitLexer, extract_implicit_lexer, integrate_imports};
