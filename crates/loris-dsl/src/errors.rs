use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(loris::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Duplicate definition of process constant '{name}'")]
    #[diagnostic(code(loris::parse::duplicate))]
    DuplicateDefinition {
        name: String,
        #[label("redefined here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Unknown process constant '{name}'")]
    #[diagnostic(
        code(loris::parse::unknown_constant),
        help("every invocation must refer to a definition `Name(params) = process`")
    )]
    UnknownConstant {
        name: String,
        #[label("not defined")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("'{name}' takes {expected} parameter(s), invoked with {actual}")]
    #[diagnostic(code(loris::parse::arity))]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
        #[label("wrong number of arguments")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Malformed parse tree: {0}")]
    #[diagnostic(code(loris::parse::internal))]
    Internal(String),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span, source: &str, filename: &str) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: (span.start, span.end.saturating_sub(span.start)).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        }
    }
}
