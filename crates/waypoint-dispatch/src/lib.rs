//! URL dispatch to controllers and actions.
//!
//! `waypoint-dispatch` matches a request path against routes held by a
//! [`waypoint_mapper::Mapper`], merges parameters from the path, the query and
//! the body, loads the selected handler and runs it through a fixed
//! lifecycle. Handlers can queue forwards to other handlers, which run right
//! after them.
//!
//! # Features
//!
//! - **Two dispatch modes**: `:controller/:action` routes run a method on a
//!   [`Controller`]; routes without a controller run a bare [`Action`]
//! - **Parameter merging**: residual `key/value` pairs, query, body, matched
//!   captures and caller defaults, later sources winning
//! - **Guarded loading**: handlers are compiled in but only dispatchable once
//!   their unit file exists; every computed path passes a character allow-list
//! - **Action stacking**: FIFO forwards with a depth limit
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint_dispatch::{Action, Dispatcher, HandlerBase, HandlerRegistry, MapperRegistry};
//!
//! #[derive(Default)]
//! struct HelloAction {
//!     base: HandlerBase,
//! }
//!
//! impl Action for HelloAction {
//!     fn execute(&mut self) -> anyhow::Result<()> {
//!         println!("hello {}", self.base.param_str_or("name", "world"));
//!         Ok(())
//!     }
//!
//!     fn base_mut(&mut self) -> Option<&mut HandlerBase> {
//!         Some(&mut self.base)
//!     }
//! }
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::create_dir(dir.path().join("actions"))?;
//! std::fs::write(dir.path().join("actions/HelloAction.unit"), "")?;
//!
//! let handlers = Arc::new(HandlerRegistry::new().action("hello", HelloAction::default));
//! let mappers = MapperRegistry::new();
//! let mut dispatcher = Dispatcher::new(&mappers, "site", handlers);
//! dispatcher
//!     .connect(":action/*params", Default::default(), Default::default())?
//!     .set_path_info("hello/name/ferris");
//!
//! let done = dispatcher.dispatch_in(dir.path())?;
//! assert_eq!(done.unit(), "HelloAction");
//! assert_eq!(done.params()["name"], "ferris");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod dispatcher;
mod error;
mod handler;
mod lifecycle;
mod loader;

pub mod env;
pub mod params;
pub mod security;

pub use config::{
    DispatcherConfig, DEFAULT_ACTION_DIRECTORY, DEFAULT_CONTROLLER_DIRECTORY,
    DEFAULT_MAX_FORWARD_DEPTH, DEFAULT_UNIT_EXTENSION,
};
pub use dispatcher::{Dispatcher, DEFAULT_ACTION, DEFAULT_PATTERN};
pub use env::{EnvReader, MockEnv, RealEnv};
pub use error::{DispatchError, Phase, Result};
pub use handler::{Action, Controller, Dispatched, Forward, HandlerBase, Instance};
pub use lifecycle::{run_action, run_controller};
pub use loader::{capitalize, ActionFactory, ControllerFactory, HandlerRegistry, UnitKind, UnitLocation};
pub use params::{Params, Residual};

pub use waypoint_mapper::{Defaults, MapperError, MapperRegistry, RouteMatch, Rules};
