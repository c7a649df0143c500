//! Handler types.
//!
//! A handler is either a [`Controller`], which exposes several named actions,
//! or a bare [`Action`] with a single entry point. The dispatcher drives both
//! through a fixed lifecycle:
//!
//! ```text
//! construct
//!   → set_params                      (parameter injection)
//!   → pre_dispatch  | pre_execute
//!   → call_action   | execute
//!   → post_dispatch | post_execute
//!   → next_forward, until empty       (action stack)
//! ```
//!
//! Every hook has a no-op default, so a handler only implements what it
//! needs. Handlers that embed a [`HandlerBase`] and return it from `base` /
//! `base_mut` get parameter storage and the action stack for free.
//!
//! # Example
//!
//! ```rust
//! use waypoint_dispatch::{Controller, HandlerBase};
//!
//! #[derive(Default)]
//! struct UserController {
//!     base: HandlerBase,
//! }
//!
//! impl Controller for UserController {
//!     fn has_action(&self, action: &str) -> bool {
//!         matches!(action, "index" | "save")
//!     }
//!
//!     fn call_action(&mut self, action: &str) -> anyhow::Result<()> {
//!         if action == "save" {
//!             // Run `index` right after this action finishes.
//!             self.base.action_stack("index", None, None);
//!         }
//!         Ok(())
//!     }
//!
//!     fn base(&self) -> Option<&HandlerBase> {
//!         Some(&self.base)
//!     }
//!
//!     fn base_mut(&mut self) -> Option<&mut HandlerBase> {
//!         Some(&mut self.base)
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::Params;

/// A request, queued by a handler, to run another handler next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forward {
    /// Action name, without suffix.
    pub action: String,
    /// Controller name, without suffix. `None` keeps the current controller,
    /// or stays in bare-action mode.
    pub controller: Option<String>,
    /// Parameters merged over the current ones for the next handler.
    pub params: Option<Params>,
}

/// Parameter storage and action stack shared by most handlers.
#[derive(Debug, Clone, Default)]
pub struct HandlerBase {
    params: Params,
    stack: VecDeque<Forward>,
}

impl HandlerBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a forward. Forwards run in the order they were queued.
    pub fn action_stack(
        &mut self,
        action: impl Into<String>,
        controller: Option<&str>,
        params: Option<Params>,
    ) -> &mut Self {
        self.stack.push_back(Forward {
            action: action.into(),
            controller: controller.map(str::to_string),
            params,
        });
        self
    }

    /// Dequeues the oldest forward.
    pub fn next_forward(&mut self) -> Option<Forward> {
        self.stack.pop_front()
    }

    pub fn pending_forwards(&self) -> usize {
        self.stack.len()
    }

    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns the parameter unless it is missing or null.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    /// Returns the parameter, or `default` when it is missing or null.
    pub fn param_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.param(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Returns a string parameter, or `default` when missing, null or not a string.
    pub fn param_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).and_then(Value::as_str).unwrap_or(default)
    }
}

/// A handler exposing named actions.
pub trait Controller {
    /// Whether `action` (without suffix) can be called.
    fn has_action(&self, action: &str) -> bool;

    /// Runs `action`. Only called after `has_action` returned true.
    fn call_action(&mut self, action: &str) -> anyhow::Result<()>;

    fn pre_dispatch(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_dispatch(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn base(&self) -> Option<&HandlerBase> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut HandlerBase> {
        None
    }

    /// Receives the resolved parameters before any hook runs.
    fn set_params(&mut self, params: Params) {
        if let Some(base) = self.base_mut() {
            base.set_params(params);
        }
    }

    /// Dequeues the next forward, if any.
    fn next_forward(&mut self) -> Option<Forward> {
        self.base_mut().and_then(HandlerBase::next_forward)
    }
}

/// A handler with a single entry point.
pub trait Action {
    fn execute(&mut self) -> anyhow::Result<()>;

    fn pre_execute(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_execute(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn base(&self) -> Option<&HandlerBase> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut HandlerBase> {
        None
    }

    fn set_params(&mut self, params: Params) {
        if let Some(base) = self.base_mut() {
            base.set_params(params);
        }
    }

    fn next_forward(&mut self) -> Option<Forward> {
        self.base_mut().and_then(HandlerBase::next_forward)
    }
}

/// A constructed handler instance.
pub enum Instance {
    Controller(Box<dyn Controller>),
    Action(Box<dyn Action>),
}

impl Instance {
    pub fn base(&self) -> Option<&HandlerBase> {
        match self {
            Instance::Controller(c) => c.base(),
            Instance::Action(a) => a.base(),
        }
    }

    pub(crate) fn next_forward(&mut self) -> Option<Forward> {
        match self {
            Instance::Controller(c) => c.next_forward(),
            Instance::Action(a) => a.next_forward(),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Controller(_) => f.write_str("Instance::Controller(..)"),
            Instance::Action(_) => f.write_str("Instance::Action(..)"),
        }
    }
}

/// The outcome of a dispatch: the last handler that ran.
///
/// When forwards occurred this is the final handler of the chain, not the
/// one the route selected.
#[derive(Debug)]
pub struct Dispatched {
    pub(crate) unit: String,
    pub(crate) action: Option<String>,
    pub(crate) params: Params,
    pub(crate) instance: Instance,
}

impl Dispatched {
    /// Unit name of the handler, e.g. `HogeController` or `ParamAction`.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The controller action that ran; `None` for bare actions.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn is_controller(&self) -> bool {
        matches!(self.instance, Instance::Controller(_))
    }

    /// Parameters the handler was given.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn into_instance(self) -> Instance {
        self.instance
    }
}
