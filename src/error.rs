//! Error types shared by every stage of the pipeline.
//!
//! All errors carry the same payload: what kind of failure it was, a
//! message, and (when known) the source location of the offending
//! character, token, or expression. They render uniformly as
//! `filename:line:column: error: message`, which is the format the REPL
//! and the CLI print to stderr.

use std::fmt;

/// A position in some source text. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new("<stdin>", 1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Which stage produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexer,
    Parse,
    Type,
    Runtime,
}

/// An error from any stage: lexing, parsing, type inference, or evaluation.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Error {
    pub fn lexer(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::Lexer,
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn parse(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Type,
            message: message.into(),
            location: None,
        }
    }

    pub fn type_error_at(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::Type,
            message: message.into(),
            location: Some(location),
        }
    }

    /// A runtime error with no useful location, e.g. raised inside a builtin.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
            location: None,
        }
    }

    pub fn runtime_at(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
            location: Some(location),
        }
    }

    /// Attach a location if the error does not already carry one.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: error: {}", loc, self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
