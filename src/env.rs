//! Injectable environment lookup.
//!
//! Everything that reads environment variables goes through [`Env`] so tests can
//! hand in a fixed map instead of touching process state.

use std::collections::HashMap;
use std::env::VarError;
use std::sync::Arc;

/// Name-to-value lookup backed either by the real process environment or by a map.
#[derive(Clone, Debug)]
pub struct Env(Inner);

#[derive(Clone, Debug)]
enum Inner {
    Real,
    Fake(Arc<HashMap<String, String>>),
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

impl Env {
    /// Reads from `std::env`.
    pub fn real() -> Self {
        Env(Inner::Real)
    }

    /// Builds a fixed environment from `(name, value)` pairs.
    pub fn from_slice(vars: &[(&str, &str)]) -> Self {
        let map = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Env(Inner::Fake(Arc::new(map)))
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Env(Inner::Fake(Arc::new(map)))
    }

    pub fn get(&self, name: &str) -> Result<String, VarError> {
        match &self.0 {
            Inner::Real => std::env::var(name),
            Inner::Fake(map) => map.get(name).cloned().ok_or(VarError::NotPresent),
        }
    }

    /// Presence check; an empty value still counts as set.
    pub fn is_set(&self, name: &str) -> bool {
        match &self.0 {
            Inner::Real => std::env::var_os(name).is_some(),
            Inner::Fake(map) => map.contains_key(name),
        }
    }

    /// Value of `name` if it is set and not blank.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.get(name).ok().filter(|v| !v.trim().is_empty())
    }
}
