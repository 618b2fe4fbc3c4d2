pub mod ansi;

use crate::ast::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A renderable error report. Built `From` each stage's error type so
/// the driver reports every failure the same way.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub label: Option<Label>,
    pub notes: Vec<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            label: None,
            notes: Vec::new(),
            source: None,
        }
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.label = Some(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for the stage error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        Diagnostic::error(format!("unexpected token '{}'", e.snippet)).with_span(span, "here")
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        Diagnostic::error(&e.message).with_span(e.span, "here")
    }
}

impl From<&crate::codegen::CompileError> for Diagnostic {
    fn from(e: &crate::codegen::CompileError) -> Self {
        Diagnostic::error(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains() {
        let d = Diagnostic::error("bad")
            .with_span(Span { start: 1, end: 2 }, "here")
            .with_note("context");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "bad");
        assert_eq!(d.label.as_ref().unwrap().span, Span { start: 1, end: 2 });
        assert_eq!(d.notes, vec!["context".to_string()]);
    }

    #[test]
    fn lex_error_converts_with_span() {
        let e = crate::lexer::lex("x = @;").unwrap_err();
        let d = Diagnostic::from(&e);
        assert!(d.message.contains('@'));
        assert_eq!(d.label.unwrap().span, Span { start: 4, end: 5 });
    }

    #[test]
    fn compile_error_converts_message() {
        let e = crate::codegen::CompileError::UndefinedFunction { name: "f".to_string() };
        let d = Diagnostic::from(&e);
        assert_eq!(d.message, "undefined function: f");
        assert!(d.label.is_none());
    }
}
