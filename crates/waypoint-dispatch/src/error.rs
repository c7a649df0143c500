//! Error types for dispatch.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use waypoint_mapper::MapperError;

/// The lifecycle step during which a handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Controller pre-hook
    PreDispatch,
    /// Controller action method
    Action,
    /// Controller post-hook
    PostDispatch,
    /// Action pre-hook
    PreExecute,
    /// Action entry point
    Execute,
    /// Action post-hook
    PostExecute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreDispatch => write!(f, "pre-dispatch"),
            Phase::Action => write!(f, "action"),
            Phase::PostDispatch => write!(f, "post-dispatch"),
            Phase::PreExecute => write!(f, "pre-execute"),
            Phase::Execute => write!(f, "execute"),
            Phase::PostExecute => write!(f, "post-execute"),
        }
    }
}

/// Errors that abort a dispatch call.
///
/// Every variant is terminal for the top-level call, including failures
/// raised inside a forwarded dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher was built without a route mapper.
    #[error("router is invalid: no mapper attached to this dispatcher")]
    RouterInvalid,

    /// The handler base directory does not exist.
    #[error("directory not found: '{}'", .0.display())]
    DirectoryNotFound(PathBuf),

    /// No route matches the path.
    #[error("could not dispatch '{0}': no route matches")]
    NoMatch(String),

    /// A computed load path contains a disallowed character.
    #[error("illegal character in filename: '{}'", .0.display())]
    IllegalCharacter(PathBuf),

    /// The unit file does not exist or no handler is registered for it.
    #[error("handler unit {unit} not found at '{}'", .path.display())]
    NotFound { unit: String, path: PathBuf },

    /// The controller has no method for the requested action.
    #[error("action method '{action}' not found on {controller}")]
    ActionNotFound { controller: String, action: String },

    /// Forwarding went deeper than the configured limit.
    #[error("forward depth limit of {limit} exceeded while forwarding to {unit}")]
    ForwardLoopDetected { limit: usize, unit: String },

    /// A handler hook or entry point returned an error.
    #[error("{unit} failed during {phase}: {source}")]
    Handler {
        unit: String,
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },

    /// A route could not be registered.
    #[error(transparent)]
    Mapper(#[from] MapperError),

    /// Configuration could not be parsed.
    #[error("invalid dispatcher configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl DispatchError {
    pub(crate) fn handler(unit: &str, phase: Phase, source: anyhow::Error) -> Self {
        Self::Handler {
            unit: unit.to_string(),
            phase,
            source,
        }
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
