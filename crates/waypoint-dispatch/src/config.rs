//! Dispatcher configuration.
//!
//! [`DispatcherConfig`] can be built in code or read from YAML:
//!
//! ```rust
//! use waypoint_dispatch::DispatcherConfig;
//!
//! let config = DispatcherConfig::from_yaml_str(
//!     "directory: /srv/app\ncontroller_directory: others/Sub\nparams:\n  locale: ja\n",
//! )?;
//! assert_eq!(config.controller_directory, "others/Sub");
//! assert_eq!(config.action_directory, "actions");
//! assert_eq!(config.params["locale"], "ja");
//! # Ok::<(), waypoint_dispatch::DispatchError>(())
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::Params;

pub const DEFAULT_CONTROLLER_DIRECTORY: &str = "controllers";
pub const DEFAULT_ACTION_DIRECTORY: &str = "actions";
pub const DEFAULT_UNIT_EXTENSION: &str = "unit";
pub const DEFAULT_MAX_FORWARD_DEPTH: usize = 32;

/// Settings that shape where handlers are loaded from and what they receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Base directory holding the controller and action directories.
    pub directory: Option<PathBuf>,

    /// Controller directory, relative to `directory`. May be nested.
    pub controller_directory: String,

    /// Action directory, relative to `directory`. May be nested.
    pub action_directory: String,

    /// Extension of unit files, without the dot.
    pub unit_extension: String,

    /// Request path. When unset, `PATH_INFO` from the environment is used.
    pub path_info: Option<String>,

    /// Parameters merged over everything else a request produces.
    pub params: Params,

    /// How many forwards a single dispatch may chain.
    pub max_forward_depth: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            directory: None,
            controller_directory: DEFAULT_CONTROLLER_DIRECTORY.to_string(),
            action_directory: DEFAULT_ACTION_DIRECTORY.to_string(),
            unit_extension: DEFAULT_UNIT_EXTENSION.to_string(),
            path_info: None,
            params: Params::new(),
            max_forward_depth: DEFAULT_MAX_FORWARD_DEPTH,
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn controller_directory(mut self, name: impl Into<String>) -> Self {
        self.controller_directory = name.into();
        self
    }

    pub fn action_directory(mut self, name: impl Into<String>) -> Self {
        self.action_directory = name.into();
        self
    }

    pub fn unit_extension(mut self, extension: impl Into<String>) -> Self {
        self.unit_extension = extension.into();
        self
    }

    pub fn path_info(mut self, path: impl Into<String>) -> Self {
        self.path_info = Some(path.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn max_forward_depth(mut self, depth: usize) -> Self {
        self.max_forward_depth = depth;
        self
    }
}
