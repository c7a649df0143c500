//! Environment access for path-info discovery.
//!
//! The dispatcher reads `PATH_INFO` through [`EnvReader`] so tests can supply
//! a request path without touching the process environment.

use std::collections::HashMap;

/// Name of the variable holding the request path.
pub const PATH_INFO: &str = "PATH_INFO";

/// Abstraction over environment variables.
pub trait EnvReader: Send + Sync {
    /// Get an environment variable value.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of variables for tests.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Shorthand for a `PATH_INFO` variable.
    pub fn path_info(value: impl Into<String>) -> Self {
        Self::new().with_var(PATH_INFO, value)
    }
}

impl EnvReader for MockEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
