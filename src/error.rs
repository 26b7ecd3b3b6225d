use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by a [`LineErrorKind::Visit`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Line(#[from] LineError),
    #[error("line {line}: invalid UTF-8 input: {source}")]
    InvalidEncoding {
        line: u32,
        #[source]
        source: std::str::Utf8Error,
    },
}

impl Error {
    /// Line number the error is tagged with, if it came from a specific line.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Io(_) => None,
            Self::Line(err) => Some(err.line),
            Self::InvalidEncoding { line, .. } => Some(*line),
        }
    }

    /// Parse failure behind this error, if any.
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            Self::Line(err) => err.parse_kind(),
            _ => None,
        }
    }
}

/// A parse or visitor failure tagged with the 1-based line it occurred on.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct LineError {
    pub line: u32,
    #[source]
    pub kind: LineErrorKind,
}

impl LineError {
    pub(crate) fn new(line: u32, kind: LineErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match &self.kind {
            LineErrorKind::Parse(kind) => Some(kind),
            LineErrorKind::Visit(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LineErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseErrorKind),
    #[error(transparent)]
    Visit(BoxError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("line does not contain a variable definition {0:?}")]
    NonVariableLine(String),
    #[error("name {0:?} is invalid")]
    InvalidName(String),
    #[error("value {value:?} cannot start with unclosed quote {quote:?}")]
    UnclosedQuote { value: String, quote: String },
    #[error("cannot unquote value: {0}")]
    Unquote(#[from] UnquoteError),
    #[error("invalid whitespace at beginning of value {0:?}")]
    InvalidLeadingWhitespace(String),
}

/// Failure to decode a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnquoteError {
    #[error("literal is not enclosed in matching quotes")]
    MissingDelimiters,
    #[error("unescaped {0:?} inside quoted literal")]
    UnescapedQuote(char),
    #[error("raw newline inside quoted literal")]
    Newline,
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    #[error("truncated escape sequence")]
    TruncatedEscape,
    #[error("invalid code point U+{0:X}")]
    InvalidCodePoint(u32),
    #[error("octal escape value {0:#o} exceeds 0o377")]
    OctalOverflow(u32),
    #[error("single-quoted literal must contain exactly one character")]
    NotSingleChar,
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
    #[error("{0}")]
    Custom(String),
}

/// The process-environment visitor refused a name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetVarError {
    #[error("environment variable name is empty")]
    EmptyName,
    #[error("environment variable name {0:?} contains `=` or NUL")]
    InvalidName(String),
    #[error("value for environment variable {0:?} contains NUL")]
    InvalidValue(String),
}
