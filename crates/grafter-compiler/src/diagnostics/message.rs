use grafter_core::Position;
use rowan::TextRange;
use serde::Serialize;

/// Diagnostic kinds reported by the transformation stage.
///
/// Each kind carries a stable numeric code shown as `error(<code>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    // Tool failures
    InternalError,

    // Import integration
    ActionRedefinition,
    OptionsInDelegate,

    // Action template group loading
    GroupFileNotFoundOnCmdline,
    GroupFileNotFoundInGrammar,
    GroupFileWrongExtension,
    GroupFileReadError,
    GroupFileCompileError,
    GroupFileRenderError,

    // Embedded action templates
    ActionTemplateCompileError,
    ActionTemplateRenderError,
}

impl DiagnosticKind {
    pub fn code(&self) -> u16 {
        match self {
            Self::InternalError => 20,
            Self::ActionRedefinition => 94,
            Self::OptionsInDelegate => 109,
            Self::GroupFileNotFoundOnCmdline => 206,
            Self::GroupFileNotFoundInGrammar => 207,
            Self::GroupFileWrongExtension | Self::GroupFileReadError => 208,
            Self::GroupFileCompileError => 209,
            Self::GroupFileRenderError => 210,
            Self::ActionTemplateCompileError => 211,
            Self::ActionTemplateRenderError => 212,
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::OptionsInDelegate => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::InternalError => "internal error",
            Self::ActionRedefinition => "action redefinition",
            Self::OptionsInDelegate => "options ignored in imported grammar",
            Self::GroupFileNotFoundOnCmdline | Self::GroupFileNotFoundInGrammar => {
                "cannot find action templates file"
            }
            Self::GroupFileWrongExtension | Self::GroupFileReadError => {
                "error reading action templates file"
            }
            Self::GroupFileCompileError => "error compiling action templates file",
            Self::GroupFileRenderError => "error rendering action templates file",
            Self::ActionTemplateCompileError => "error compiling action template",
            Self::ActionTemplateRenderError => "error rendering action template",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::InternalError => "internal error: {}".to_string(),
            Self::ActionRedefinition => "redefinition of `{}` action".to_string(),

            // Name or path follows directly
            Self::OptionsInDelegate
            | Self::GroupFileNotFoundOnCmdline
            | Self::GroupFileNotFoundInGrammar
            | Self::GroupFileWrongExtension
            | Self::GroupFileReadError
            | Self::GroupFileCompileError
            | Self::GroupFileRenderError => format!("{} {{}}", self.fallback_message()),

            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    /// Grammar or group file the diagnostic refers to. Tool-level
    /// diagnostics have none.
    pub(crate) file: Option<String>,
    pub(crate) position: Option<Position>,
    /// Byte range in the grammar source, when the loader recorded one.
    pub(crate) range: Option<TextRange>,
    pub(crate) message: String,
    pub(crate) cause: Option<String>,
}

impl DiagnosticMessage {
    pub(crate) fn with_default_message(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            file: None,
            position: None,
            range: None,
            message: kind.fallback_message().to_string(),
            cause: None,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn range(&self) -> Option<TextRange> {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// `file:line:col: ` or `file: ` prefix of the plain format.
    pub(crate) fn location(&self) -> Option<String> {
        match (&self.file, self.position) {
            (Some(file), Some(pos)) => Some(format!("{file}:{pos}")),
            (Some(file), None) => Some(file.clone()),
            (None, Some(pos)) => Some(pos.to_string()),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}): ", self.severity(), self.kind.code())?;
        if let Some(location) = self.location() {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, "\nCaused by: {cause}")?;
        }
        Ok(())
    }
}
