//! Node kinds of the grammar AST.
//!
//! The set is closed: every pass matches over it exhaustively or with a
//! wildcard, never through dynamic dispatch on node objects.

use serde::Serialize;

macro_rules! node_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum NodeKind {
            $($variant),*
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant),*];

            /// Canonical upper-case name, also the default node text.
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => $name),*
                }
            }

            pub fn from_name(name: &str) -> Option<NodeKind> {
                match name {
                    $($name => Some(NodeKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

node_kinds! {
    Grammar => "GRAMMAR",
    Id => "ID",
    TokenRef => "TOKEN_REF",
    RuleRef => "RULE_REF",
    Options => "OPTIONS",
    ElementOptions => "ELEMENT_OPTIONS",
    Assign => "ASSIGN",
    PlusAssign => "PLUS_ASSIGN",
    TokensSpec => "TOKENS_SPEC",
    Channels => "CHANNELS",
    At => "AT",
    Action => "ACTION",
    Sempred => "SEMPRED",
    ArgAction => "ARG_ACTION",
    Rules => "RULES",
    Rule => "RULE",
    RuleModifiers => "RULEMODIFIERS",
    Mode => "MODE",
    Block => "BLOCK",
    Alt => "ALT",
    LexerAltAction => "LEXER_ALT_ACTION",
    LexerActionCall => "LEXER_ACTION_CALL",
    StringLiteral => "STRING_LITERAL",
    LexerCharSet => "LEXER_CHAR_SET",
    Int => "INT",
    Set => "SET",
    Not => "NOT",
    Range => "RANGE",
    Wildcard => "WILDCARD",
    Optional => "OPTIONAL",
    Closure => "CLOSURE",
    PositiveClosure => "POSITIVE_CLOSURE",
    Epsilon => "EPSILON",
}

impl NodeKind {
    /// Embedded target-language code: candidates for template expansion.
    pub fn is_action_like(self) -> bool {
        matches!(self, NodeKind::Action | NodeKind::Sempred)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
