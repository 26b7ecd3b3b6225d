//! Parse `.env`-style definition files line by line and source them into an
//! environment.
//!
//! Every line is parsed on its own: an optional `export` keyword, a name, the
//! first `=`, and a value that is either bare (trailing comments and
//! whitespace removed) or quoted (decoded by a pluggable unquote function).
//! Blank lines and whole-line comments are skipped.
//!
//! [`Sourcer::drive`] feeds each definition to a [`Visitor`]. Collecting into
//! a `Vec<Entry>` or an in-memory [`TargetEnv`] is safe; the process
//! environment target and the `source*` helpers are `unsafe`, because callers
//! must guarantee no concurrent process-environment access.

mod env;
mod error;
mod loader;
mod model;
mod parser;
pub mod unquote;

pub use env::{TargetEnv, VisitFn, Visitor};
pub use error::{
    BoxError, Error, LineError, LineErrorKind, ParseErrorKind, SetVarError, UnquoteError,
};
pub use loader::{
    DEFAULT_COMMENT, DEFAULT_EXPORT, DEFAULT_QUOTE, Sourcer, parse_reader, parse_str, source_file,
};
pub use model::Entry;
pub use unquote::{UnquoteFn, quote};
