//! Miette-based diagnostics for configuration errors.
//!
//! TOML syntax errors are rendered with the offending file content and a
//! label pointing at the problem.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(fry::config))]
pub struct ConfigDiagnostic {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    /// Build a diagnostic from a TOML parse error, if it carries a span.
    #[must_use]
    pub fn from_toml(name: &str, content: &str, err: &toml::de::Error) -> Option<Self> {
        let span = err.span()?;
        Some(Self {
            message: err.message().to_string(),
            src: NamedSource::new(name, content.to_string()),
            span: (span.start, span.end.saturating_sub(span.start)).into(),
            help: Some("see config.toml.example for every recognized option".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_at_parse_error() {
        let content = "[scoring]\nwindow_secs = \"soon\n";
        let err = toml::from_str::<toml::Value>(content).unwrap_err();
        let diagnostic = ConfigDiagnostic::from_toml("config.toml", content, &err).unwrap();
        let offset: usize = diagnostic.span.offset();
        assert!(offset >= "[scoring]\n".len());
        assert!(!diagnostic.message.is_empty());
    }
}
