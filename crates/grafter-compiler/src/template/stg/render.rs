//! Template evaluation.

use super::StgGroup;
use super::compile::{Chunk, CompiledTemplate, Expr};
use crate::template::{Coordinate, MessageShape, TemplateListener, TemplateMessage};

/// Render `template` with no arguments, resolving includes in `group`.
///
/// Returns `None` if any runtime error was reported. Only errors raised by
/// `template` itself carry a position; errors inside included templates are
/// reported without one.
pub(crate) fn render(
    template: &CompiledTemplate,
    group: &StgGroup,
    listener: &mut dyn TemplateListener,
    max_depth: usize,
) -> Option<String> {
    let mut renderer = Renderer {
        group,
        listener,
        max_depth,
        failed: false,
    };
    let mut out = String::new();
    renderer.template(template, &[], 0, &mut out);
    (!renderer.failed).then_some(out)
}

struct Renderer<'g, 'l> {
    group: &'g StgGroup,
    listener: &'l mut dyn TemplateListener,
    max_depth: usize,
    failed: bool,
}

impl<'g> Renderer<'g, '_> {
    fn template(&mut self, template: &CompiledTemplate, args: &[String], depth: usize, out: &mut String) {
        for chunk in &template.chunks {
            match chunk {
                Chunk::Text(text) => out.push_str(text),
                Chunk::Expr(expr) => {
                    if let Some(value) = self.eval(template, args, expr, depth) {
                        out.push_str(&value);
                    }
                }
            }
        }
    }

    fn eval(
        &mut self,
        template: &CompiledTemplate,
        args: &[String],
        expr: &Expr,
        depth: usize,
    ) -> Option<String> {
        match expr {
            Expr::Literal(text) => Some(text.clone()),
            Expr::Attribute { name, offset } => {
                match template.params.iter().position(|p| p == name) {
                    Some(index) => Some(args.get(index).cloned().unwrap_or_default()),
                    None => {
                        self.error(template, depth, *offset, format!("attribute {name} isn't defined"));
                        None
                    }
                }
            }
            Expr::Include {
                name,
                args: arg_exprs,
                offset,
            } => {
                let mut values = Vec::with_capacity(arg_exprs.len());
                for arg in arg_exprs {
                    values.push(self.eval(template, args, arg, depth)?);
                }

                let group: &'g StgGroup = self.group;
                let Some(callee) = group.lookup(name) else {
                    self.error(template, depth, *offset, format!("no such template: /{name}"));
                    return None;
                };
                if values.len() != callee.params.len() {
                    let text = format!(
                        "passed {} arg(s) to template /{name} with {} declared arg(s)",
                        values.len(),
                        callee.params.len()
                    );
                    self.error(template, depth, *offset, text);
                    return None;
                }
                if depth + 1 > self.max_depth {
                    let text = format!(
                        "template /{name} exceeds the maximum nesting depth of {}",
                        self.max_depth
                    );
                    self.error(template, depth, *offset, text);
                    return None;
                }

                let mut out = String::new();
                self.template(callee, &values, depth + 1, &mut out);
                Some(out)
            }
        }
    }

    fn error(&mut self, template: &CompiledTemplate, depth: usize, offset: usize, text: String) {
        self.failed = true;
        let mut msg = TemplateMessage::new(MessageShape::Plain, text);
        if depth == 0 {
            msg = msg.at(Coordinate::of_offset(&template.source, offset));
        } else {
            msg = msg.in_source(format!("/{}", template.name));
        }
        self.listener.runtime_error(&msg);
    }
}
