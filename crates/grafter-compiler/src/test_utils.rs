//! Test utilities shared by the unit tests.

use grafter_core::{GrammarId, GrammarSet, sexpr};

use crate::template::{TemplateListener, TemplateMessage};

/// Load a grammar written in tree notation, panicking on bad fixtures.
pub fn load(set: &mut GrammarSet, file_name: &str, source: &str) -> GrammarId {
    sexpr::load_grammar(set, file_name, source).expect("valid tree notation")
}

/// Dump a grammar's tree in tree notation.
pub fn dump(set: &GrammarSet, grammar: GrammarId) -> String {
    set.ast.dump(set.get(grammar).root)
}

/// Listener that records every message as `<category>: <message>`.
#[derive(Default)]
pub struct RecordingListener {
    pub messages: Vec<String>,
}

impl RecordingListener {
    pub fn joined(&self) -> String {
        self.messages.join("\n")
    }
}

impl TemplateListener for RecordingListener {
    fn compile_time_error(&mut self, msg: &TemplateMessage) {
        self.messages.push(format!("compile: {msg}"));
    }

    fn runtime_error(&mut self, msg: &TemplateMessage) {
        self.messages.push(format!("runtime: {msg}"));
    }

    fn io_error(&mut self, msg: &TemplateMessage) {
        self.messages.push(format!("io: {msg}"));
    }

    fn internal_error(&mut self, msg: &TemplateMessage) {
        self.messages.push(format!("internal: {msg}"));
    }
}
