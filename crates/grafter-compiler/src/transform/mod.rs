//! Structural transforms over grammar trees.
//!
//! - `imports`: merge delegate grammars into the root grammar
//! - `lexer`: split a combined grammar's token rules into their own tree
//! - `positions`: token bookkeeping for synthesized subtrees

mod imports;
mod lexer;
mod positions;

#[cfg(test)]
mod positions_tests;

pub use imports::integrate_imports;
pub use lexer::{ImplicitLexer, extract_implicit_lexer};
pub use positions::{TOKEN_INDEX_OPTION, augment_tokens_with_original_position, set_grammar_owner};
