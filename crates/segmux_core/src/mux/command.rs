//! Immutable description of an external tool invocation.

use std::path::PathBuf;

use serde::Serialize;

/// A fully built external-tool invocation: program, exec-style argument
/// tokens, and optional working directory.
///
/// Tokens are passed to the process verbatim, one argument each, so no
/// shell quoting or escaping ever applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    /// Executable path or bare command name resolved via PATH.
    pub program: PathBuf,
    /// Argument tokens in order.
    pub args: Vec<String>,
    /// Working directory for the invocation; inherit when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Create an empty command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument token.
    pub fn arg(&mut self, token: impl Into<String>) -> &mut Self {
        self.args.push(token.into());
        self
    }

    /// Append several argument tokens.
    pub fn args<I>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for token in tokens {
            self.args.push(token.into());
        }
        self
    }

    /// Short program name for log and error messages.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// One-line rendering for logs.
    pub fn display_line(&self) -> String {
        format!("{} {}", self.program.display(), self.args.join(" "))
    }

    /// JSON rendering for structured logs.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Format argument tokens for pretty display (one option per line).
pub fn format_args_pretty(args: &[String]) -> String {
    let mut result = String::new();
    let mut i = 0;

    while i < args.len() {
        let token = &args[i];

        if token.starts_with('-') && i + 1 < args.len() && !args[i + 1].starts_with('-') {
            // Option with value
            result.push_str(&format!("{} {} \\\n", token, args[i + 1]));
            i += 2;
        } else {
            result.push_str(&format!("{} \\\n", token));
            i += 1;
        }
    }

    result
}
