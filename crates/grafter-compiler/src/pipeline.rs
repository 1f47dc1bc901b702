//! Transformation pipeline: from a freshly parsed grammar tree to the form
//! consumed by code generation.
//!
//! Stages, in order:
//! 1. import integration
//! 2. registered structural passes, in registration order
//! 3. action template expansion, when a template group is configured

use grafter_core::{GrammarId, GrammarSet};

use crate::config::ToolConfig;
use crate::diagnostics::Diagnostics;
use crate::template::{ActionTemplateExpander, TemplateEngine};
use crate::transform::{self, ImplicitLexer};

/// A structural rewrite run between import integration and template
/// expansion.
pub trait TreePass {
    fn name(&self) -> &str;

    fn run(&mut self, set: &mut GrammarSet, grammar: GrammarId, diagnostics: &mut Diagnostics);
}

pub struct GrammarTransformPipeline<'e, E: TemplateEngine> {
    engine: &'e E,
    config: &'e ToolConfig,
    passes: Vec<Box<dyn TreePass + 'e>>,
}

impl<'e, E: TemplateEngine> GrammarTransformPipeline<'e, E> {
    pub fn new(engine: &'e E, config: &'e ToolConfig) -> Self {
        Self {
            engine,
            config,
            passes: Vec::new(),
        }
    }

    pub fn with_pass(mut self, pass: Box<dyn TreePass + 'e>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Run every stage on `grammar`. Problems end up in `diagnostics`; check
    /// [`Diagnostics::has_errors`] afterwards.
    pub fn process(
        &mut self,
        set: &mut GrammarSet,
        grammar: GrammarId,
        diagnostics: &mut Diagnostics,
    ) {
        let root = set.get(grammar).root;
        log::debug!(target: "grammar", "before: {}", set.ast.dump(root));

        transform::integrate_imports(set, grammar, diagnostics);

        for pass in &mut self.passes {
            log::debug!(target: "grammar", "pass: {}", pass.name());
            pass.run(set, grammar, diagnostics);
        }

        let expander = ActionTemplateExpander::new(self.engine, self.config);
        if expander.reference(set, grammar).is_some() {
            expander.expand(set, grammar, diagnostics);
        }

        log::debug!(target: "grammar", "after: {}", set.ast.dump(set.get(grammar).root));
    }

    /// See [`transform::extract_implicit_lexer`].
    pub fn extract_implicit_lexer(
        &self,
        set: &mut GrammarSet,
        combined: GrammarId,
    ) -> Option<ImplicitLexer> {
        transform::extract_implicit_lexer(set, combined)
    }
}
