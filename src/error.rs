use std::fmt;

use thiserror::Error;

/// Result type for instruction handlers.
pub type ExecResult<T> = Result<T, ErrorKind>;

/// Reasons a run can fail. Every kind is fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("unknown value `{token}`")]
    UnknownValue { token: String },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("variable `{name}` does not hold a number")]
    NotANumber { name: String },

    #[error("invalid expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("unknown command `{command}`")]
    UnknownCommand { command: String },

    #[error("unknown label `{label}`")]
    UnknownLabel { label: String },

    #[error("`{command}` is missing its {argument}")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: usize },

    #[error("run cancelled")]
    Cancelled,
}

/// A failure located at the instruction that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    /// 1-based physical line in the program text.
    pub source_line: usize,
    pub raw_text: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, source_line: usize, raw_text: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            source_line,
            raw_text: raw_text.into(),
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Renders the message, the offending line and a caret under its first
    /// character.
    pub fn render(&self) -> String {
        let prefix = format!("Line {}: ", self.source_line);
        format!(
            "{}\n{}{}\n{}^",
            self.message(),
            prefix,
            self.raw_text.trim(),
            " ".repeat(prefix.len())
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
