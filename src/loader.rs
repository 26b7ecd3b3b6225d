use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

use crate::env::{TargetEnv, Visitor};
use crate::error::{Error, LineError, LineErrorKind};
use crate::model::Entry;
use crate::unquote::{UnquoteFn, unquote};

/// Comment token used by [`Sourcer::new`].
pub const DEFAULT_COMMENT: &str = "#";
/// Quote token used by [`Sourcer::new`].
pub const DEFAULT_QUOTE: &str = "\"";
/// Export keyword used by [`Sourcer::new`].
pub const DEFAULT_EXPORT: &str = "export";

/// Parse every definition in `input` with the default configuration.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, Error> {
    Sourcer::new().name_vars(input.as_bytes())
}

/// Parse every definition from a buffered reader with the default configuration.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Entry>, Error> {
    Sourcer::new().name_vars(reader)
}

/// Set every definition in the file at `path` on the process environment.
///
/// # Safety
///
/// See [`Sourcer::source`].
pub unsafe fn source_file(path: impl AsRef<Path>) -> Result<(), Error> {
    unsafe { Sourcer::new().source_file(path) }
}

/// Builder-style parsing configuration and line driver.
///
/// An empty token disables the corresponding feature: no comments, no quoted
/// values, or no export keyword.
#[derive(Clone)]
pub struct Sourcer {
    pub(crate) comment: String,
    pub(crate) quote: String,
    pub(crate) export: String,
    pub(crate) unquote: UnquoteFn,
}

impl Sourcer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = quote.into();
        self
    }

    pub fn export(mut self, export: impl Into<String>) -> Self {
        self.export = export.into();
        self
    }

    /// Replace the decoder applied to quoted values.
    ///
    /// The function receives the full quoted span, delimiters included.
    pub fn unquote(mut self, unquote: UnquoteFn) -> Self {
        self.unquote = unquote;
        self
    }

    pub fn comment_token(&self) -> &str {
        &self.comment
    }

    pub fn quote_token(&self) -> &str {
        &self.quote
    }

    pub fn export_token(&self) -> &str {
        &self.export
    }

    /// Parse `reader` line by line and hand each definition to `visitor`.
    ///
    /// Stops at the first parse or visitor failure and reports it with its
    /// 1-based line number. The reader is not guaranteed to be fully consumed
    /// when an error is returned.
    pub fn drive<R, V>(&self, mut reader: R, visitor: &mut V) -> Result<(), Error>
    where
        R: BufRead,
        V: Visitor + ?Sized,
    {
        let mut buf = Vec::new();
        let mut line_num = 0u32;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            line_num += 1;

            let line = std::str::from_utf8(strip_line_ending(&buf)).map_err(|source| {
                Error::InvalidEncoding {
                    line: line_num,
                    source,
                }
            })?;

            let Some(entry) = self
                .parse_line(line)
                .map_err(|kind| LineError::new(line_num, LineErrorKind::Parse(kind)))?
            else {
                trace!(line = line_num, "skipping line without definition");
                continue;
            };

            debug!(line = line_num, name = %entry.name, "visiting definition");
            visitor
                .visit(&entry.name, &entry.value)
                .map_err(|err| LineError::new(line_num, LineErrorKind::Visit(err.into())))?;
        }
    }

    /// [`Sourcer::drive`] over an in-memory string.
    pub fn drive_str<V>(&self, input: &str, visitor: &mut V) -> Result<(), Error>
    where
        V: Visitor + ?Sized,
    {
        self.drive(input.as_bytes(), visitor)
    }

    /// Open `path` and [`Sourcer::drive`] its contents.
    ///
    /// The file handle is released before returning, whatever the outcome.
    pub fn drive_file<V>(&self, path: impl AsRef<Path>, visitor: &mut V) -> Result<(), Error>
    where
        V: Visitor + ?Sized,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), "sourcing file");
        self.drive(BufReader::new(file), visitor)
    }

    /// Collect every definition from `reader` in input order.
    pub fn name_vars<R: BufRead>(&self, reader: R) -> Result<Vec<Entry>, Error> {
        let mut entries: Vec<Entry> = Vec::new();
        self.drive(reader, &mut entries)?;
        Ok(entries)
    }

    /// Collect every definition in the file at `path` in input order.
    pub fn name_vars_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<Entry>, Error> {
        let mut entries: Vec<Entry> = Vec::new();
        self.drive_file(path, &mut entries)?;
        Ok(entries)
    }

    /// Set every definition from `reader` on the process environment.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment while this runs.
    pub unsafe fn source<R: BufRead>(&self, reader: R) -> Result<(), Error> {
        let mut target = unsafe { TargetEnv::process() };
        self.drive(reader, &mut target)
    }

    /// Set every definition in the file at `path` on the process environment.
    ///
    /// # Safety
    ///
    /// See [`Sourcer::source`].
    pub unsafe fn source_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let mut target = unsafe { TargetEnv::process() };
        self.drive_file(path, &mut target)
    }
}

impl Default for Sourcer {
    fn default() -> Self {
        Self {
            comment: DEFAULT_COMMENT.to_owned(),
            quote: DEFAULT_QUOTE.to_owned(),
            export: DEFAULT_EXPORT.to_owned(),
            unquote,
        }
    }
}

impl fmt::Debug for Sourcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sourcer")
            .field("comment", &self.comment)
            .field("quote", &self.quote)
            .field("export", &self.export)
            .finish_non_exhaustive()
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
