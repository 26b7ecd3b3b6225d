use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::error::{BoxError, SetVarError};
use crate::model::Entry;

/// Receives each definition found by [`Sourcer::drive`](crate::Sourcer::drive).
///
/// A failing visit stops the drive; the error is reported with the line the
/// definition came from.
pub trait Visitor {
    type Error: Into<BoxError>;

    fn visit(&mut self, name: &str, value: &str) -> Result<(), Self::Error>;
}

/// Collects definitions in input order. Never fails.
impl Visitor for Vec<Entry> {
    type Error = Infallible;

    fn visit(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        self.push(Entry::new(name, value));
        Ok(())
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    type Error = V::Error;

    fn visit(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        (**self).visit(name, value)
    }
}

/// Adapts a closure into a [`Visitor`].
#[derive(Debug, Clone, Copy)]
pub struct VisitFn<F>(pub F);

impl<F, E> Visitor for VisitFn<F>
where
    F: FnMut(&str, &str) -> Result<(), E>,
    E: Into<BoxError>,
{
    type Error = E;

    fn visit(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        (self.0)(name, value)
    }
}

/// Destination for sourced environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnv {
    kind: TargetEnvKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetEnvKind {
    /// Apply entries to the current process environment.
    ///
    /// This writes through [`std::env::set_var`], which mutates global process
    /// state and is not thread-safe for concurrent environment access.
    Process,
    /// Apply entries to an in-memory map.
    Memory(BTreeMap<String, String>),
}

impl Default for TargetEnv {
    fn default() -> Self {
        Self::memory()
    }
}

impl TargetEnv {
    /// Create a process-environment target.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// target.
    pub unsafe fn process() -> Self {
        Self {
            kind: TargetEnvKind::Process,
        }
    }

    /// Create an in-memory environment target.
    ///
    /// Use this to avoid mutating the process environment.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory environment target from an existing map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: TargetEnvKind::Memory(map),
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, TargetEnvKind::Process)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    pub fn into_memory(self) -> Option<BTreeMap<String, String>> {
        match self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match &self.kind {
            TargetEnvKind::Process => {
                std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
            }
            TargetEnvKind::Memory(map) => map.get(name).cloned(),
        }
    }

    /// Set `name` to `value`.
    ///
    /// Pairs the platform would reject are refused up front instead of
    /// panicking inside [`std::env::set_var`]. The in-memory target applies
    /// the same rules.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SetVarError> {
        check_pair(name, value)?;
        match &mut self.kind {
            TargetEnvKind::Process => unsafe { std::env::set_var(name, value) },
            TargetEnvKind::Memory(map) => {
                map.insert(name.to_owned(), value.to_owned());
            }
        }
        Ok(())
    }
}

impl Visitor for TargetEnv {
    type Error = SetVarError;

    fn visit(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        self.set(name, value)
    }
}

fn check_pair(name: &str, value: &str) -> Result<(), SetVarError> {
    if name.is_empty() {
        return Err(SetVarError::EmptyName);
    }
    if name.contains(['=', '\0']) {
        return Err(SetVarError::InvalidName(name.to_owned()));
    }
    if value.contains('\0') {
        return Err(SetVarError::InvalidValue(name.to_owned()));
    }
    Ok(())
}
