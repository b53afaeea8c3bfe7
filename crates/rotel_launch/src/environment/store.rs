//! Read/write access to environment variables

use indexmap::IndexMap;

/// Environment variable storage used by the synthesizer and launcher
pub trait EnvStore {
    /// Current value of `name`, if set and valid unicode
    fn get(&self, name: &str) -> Option<String>;

    /// Set `name` to `value`, overwriting any previous value
    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError>;

    /// Value of `name`, treating an empty string as unset
    fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

/// An in-memory environment that remembers what was written to it.
///
/// The process environment itself is never written; assignments are handed
/// to the child process instead.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnv {
    vars: IndexMap<String, String>,
    assigned: IndexMap<String, String>,
}

impl MemoryEnv {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment (non-unicode entries are dropped)
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self {
            vars,
            assigned: IndexMap::new(),
        }
    }

    /// Add a pre-existing variable without recording it as an assignment
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Variables written through [`EnvStore::set`], in first-write order
    pub fn assignments(&self) -> &IndexMap<String, String> {
        &self.assigned
    }
}

impl EnvStore for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        validate(name, value)?;
        self.vars.insert(name.to_string(), value.to_string());
        self.assigned.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Rejects names and values a process environment cannot carry
fn validate(name: &str, value: &str) -> Result<(), EnvError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(EnvError::InvalidName(name.to_string()));
    }
    if value.contains('\0') {
        return Err(EnvError::InvalidValue(name.to_string()));
    }
    Ok(())
}

/// Errors that can occur when writing environment variables
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("invalid environment variable name '{0}'")]
    InvalidName(String),

    #[error("value for environment variable '{0}' contains a NUL byte")]
    InvalidValue(String),
}
