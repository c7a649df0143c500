//! The dispatch engine.
//!
//! A [`Dispatcher`] ties a route mapper to a [`HandlerRegistry`]. One call to
//! [`Dispatcher::dispatch`] runs the whole pipeline:
//!
//! ```text
//! path info ──► mapper ──► controller / action / params
//!                               │
//!                 residual + query + body + extras + caller params
//!                               │
//!            controller mode ◄──┴──► bare-action mode
//!                               │
//!                 load unit ─► lifecycle ─► forwards (FIFO, recursive)
//!                               │
//!                           Dispatched
//! ```
//!
//! Forwarded handlers run in the same directory and skip matching. The
//! returned [`Dispatched`] is the last handler that ran.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};
use waypoint_mapper::{Defaults, MapperRegistry, Rules, SharedMapper, DEFAULT_MAPPER_ID};

use crate::config::DispatcherConfig;
use crate::env::{EnvReader, RealEnv, PATH_INFO};
use crate::error::{DispatchError, Result};
use crate::handler::{Dispatched, Forward, Instance};
use crate::lifecycle;
use crate::loader::{HandlerRegistry, UnitKind, UnitLocation};
use crate::params::{self, Params, Residual};

/// Pattern registered by [`Dispatcher::connect_default`].
pub const DEFAULT_PATTERN: &str = ":controller/:action/*params";

/// Default action for routes connected without explicit defaults.
pub const DEFAULT_ACTION: &str = "index";

/// What to run next.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// `unit` is the controller unit name, `action` the method name.
    Controller { unit: String, action: String },
    /// `unit` is the action unit name.
    Action { unit: String },
}

impl Target {
    fn controller(name: &str, action: &str) -> Self {
        Target::Controller {
            unit: UnitKind::Controller.unit_name(name),
            action: action.to_string(),
        }
    }

    fn action(name: &str) -> Self {
        Target::Action {
            unit: UnitKind::Action.unit_name(name),
        }
    }

    fn unit(&self) -> &str {
        match self {
            Target::Controller { unit, .. } | Target::Action { unit } => unit,
        }
    }

    /// Where `forward` leads from here.
    fn forward_to(&self, forward: &Forward) -> Self {
        match (&forward.controller, self) {
            (Some(controller), _) => Target::controller(controller, &forward.action),
            (None, Target::Controller { unit, .. }) => Target::Controller {
                unit: unit.clone(),
                action: forward.action.clone(),
            },
            (None, Target::Action { .. }) => Target::action(&forward.action),
        }
    }
}

/// Routes request paths to controllers and actions.
pub struct Dispatcher {
    mapper_id: Option<String>,
    mapper: Option<SharedMapper>,
    handlers: Arc<HandlerRegistry>,
    config: DispatcherConfig,
    env: Box<dyn EnvReader>,
    query: Params,
    body: Params,
}

impl Dispatcher {
    /// Creates a dispatcher using the mapper registered under `id`.
    ///
    /// Dispatchers created from the same registry with the same `id` share
    /// their routes.
    pub fn new(mappers: &MapperRegistry, id: &str, handlers: Arc<HandlerRegistry>) -> Self {
        Self {
            mapper_id: Some(id.to_string()),
            mapper: Some(mappers.get(id)),
            ..Self::detached(handlers)
        }
    }

    /// Creates a dispatcher bound to the mapper [`DEFAULT_MAPPER_ID`].
    pub fn with_default_mapper(mappers: &MapperRegistry, handlers: Arc<HandlerRegistry>) -> Self {
        Self::new(mappers, DEFAULT_MAPPER_ID, handlers)
    }

    /// Creates a dispatcher without a mapper.
    ///
    /// Only [`dispatch_controller`](Self::dispatch_controller) and
    /// [`dispatch_action`](Self::dispatch_action) work; routing calls fail
    /// with [`DispatchError::RouterInvalid`].
    pub fn detached(handlers: Arc<HandlerRegistry>) -> Self {
        Self {
            mapper_id: None,
            mapper: None,
            handlers,
            config: DispatcherConfig::default(),
            env: Box::new(RealEnv),
            query: Params::new(),
            body: Params::new(),
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the environment used to look up `PATH_INFO`.
    pub fn with_env(mut self, env: impl EnvReader + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn mapper(&self) -> Option<&SharedMapper> {
        self.mapper.as_ref()
    }

    pub fn mapper_id(&self) -> Option<&str> {
        self.mapper_id.as_deref()
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.config.directory = Some(directory.into());
        self
    }

    pub fn directory(&self) -> Option<&Path> {
        self.config.directory.as_deref()
    }

    pub fn set_path_info(&mut self, path: impl Into<String>) -> &mut Self {
        self.config.path_info = Some(path.into());
        self
    }

    /// The request path: the explicit one if set, otherwise `PATH_INFO` from
    /// the environment without its leading slashes.
    pub fn path_info(&self) -> String {
        match &self.config.path_info {
            Some(path) => path.clone(),
            None => self
                .env
                .var(PATH_INFO)
                .map(|v| v.trim_start_matches('/').to_string())
                .unwrap_or_default(),
        }
    }

    /// Parameters merged over everything a request produces.
    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.config.params = params;
        self
    }

    pub fn params(&self) -> &Params {
        &self.config.params
    }

    pub fn set_controller_directory_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.controller_directory = name.into();
        self
    }

    pub fn controller_directory_name(&self) -> &str {
        &self.config.controller_directory
    }

    pub fn set_action_directory_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.action_directory = name.into();
        self
    }

    pub fn action_directory_name(&self) -> &str {
        &self.config.action_directory
    }

    /// Query-string parameters of the current request.
    pub fn set_query(&mut self, query: Params) -> &mut Self {
        self.query = query;
        self
    }

    /// Body parameters of the current request.
    pub fn set_body(&mut self, body: Params) -> &mut Self {
        self.body = body;
        self
    }

    pub fn set_max_forward_depth(&mut self, depth: usize) -> &mut Self {
        self.config.max_forward_depth = depth;
        self
    }

    /// Registers a route.
    ///
    /// With empty `defaults` the route gets `controller` (the first segment
    /// when it is a literal, null otherwise), `action: "index"` and a null
    /// `params`.
    pub fn connect(&mut self, pattern: &str, defaults: Defaults, rules: Rules) -> Result<&mut Self> {
        let mapper = self.mapper.as_ref().ok_or(DispatchError::RouterInvalid)?;
        let defaults = if defaults.is_empty() {
            derived_defaults(pattern)
        } else {
            defaults
        };
        mapper.lock().connect(pattern, defaults, rules)?;
        Ok(self)
    }

    /// Registers `:controller/:action/*params` with derived defaults.
    pub fn connect_default(&mut self) -> Result<&mut Self> {
        self.connect(DEFAULT_PATTERN, Defaults::new(), Rules::new())
    }

    /// Registers a route assembled from a controller and an action part.
    pub fn connect_parts(&mut self, controller: Option<&str>, action: Option<&str>) -> Result<&mut Self> {
        let mut pattern = controller.unwrap_or_default().to_string();
        if let Some(action) = action {
            pattern.push('/');
            pattern.push_str(action);
        }
        self.connect(&pattern, Defaults::new(), Rules::new())
    }

    /// Dispatches the current path info using the configured directory.
    pub fn dispatch(&self) -> Result<Dispatched> {
        let directory = self
            .config
            .directory
            .clone()
            .ok_or_else(|| DispatchError::DirectoryNotFound(PathBuf::new()))?;
        self.dispatch_path(&directory)
    }

    /// Dispatches using `directory`, which also becomes the configured one.
    pub fn dispatch_in(&mut self, directory: impl Into<PathBuf>) -> Result<Dispatched> {
        let directory = directory.into();
        self.config.directory = Some(directory.clone());
        self.dispatch_path(&directory)
    }

    /// Runs `controller`'s `action` directly, without matching.
    ///
    /// `controller` is the logical name (`hoge`, not `HogeController`).
    pub fn dispatch_controller(
        &self,
        controller: &str,
        action: &str,
        params: Option<Params>,
        directory: Option<&Path>,
    ) -> Result<Dispatched> {
        let directory = self.resolve_directory(directory)?;
        self.run(
            Target::controller(controller, action),
            params.unwrap_or_default(),
            &directory,
            0,
        )
    }

    /// Runs the bare action `action` directly, without matching.
    pub fn dispatch_action(
        &self,
        action: &str,
        params: Option<Params>,
        directory: Option<&Path>,
    ) -> Result<Dispatched> {
        let directory = self.resolve_directory(directory)?;
        self.run(Target::action(action), params.unwrap_or_default(), &directory, 0)
    }

    fn dispatch_path(&self, directory: &Path) -> Result<Dispatched> {
        let directory = self.resolve_directory(Some(directory))?;
        let mapper = self.mapper.as_ref().ok_or(DispatchError::RouterInvalid)?;

        let path = self.path_info();
        let mut matched = mapper
            .lock()
            .match_path(&path)
            .ok_or_else(|| DispatchError::NoMatch(path.clone()))?;
        debug!(path = %path, "route matched");

        let controller = matched.take("controller");
        let action = matched.take("action").unwrap_or_default();
        let residual = matched.take("params").map(Residual::Path);

        let mut params = params::resolve(residual, &self.query, &self.body).unwrap_or_default();
        for (key, value) in matched {
            params.insert(key, value.map_or(Value::Null, Value::String));
        }
        params::overlay(&mut params, self.config.params.clone());
        trace!(?params, "parameters resolved");

        let target = match controller {
            Some(controller) => Target::controller(&controller, &action),
            None => Target::action(&action),
        };
        self.run(target, params, &directory, 0)
    }

    fn resolve_directory(&self, directory: Option<&Path>) -> Result<PathBuf> {
        let directory = directory
            .or(self.config.directory.as_deref())
            .ok_or_else(|| DispatchError::DirectoryNotFound(PathBuf::new()))?;
        if !directory.is_dir() {
            return Err(DispatchError::DirectoryNotFound(directory.to_path_buf()));
        }
        Ok(directory.to_path_buf())
    }

    /// Runs `target`, then every forward it queued.
    ///
    /// Every handler's parameters pass through NUL stripping here, whether
    /// they were routed, passed in directly or carried by a forward.
    fn run(
        &self,
        target: Target,
        mut params: Params,
        directory: &Path,
        depth: usize,
    ) -> Result<Dispatched> {
        params::strip_nul_bytes_in(&mut params);
        let mut dispatched = self.execute(&target, params, directory)?;
        let mut last = None;

        while let Some(forward) = dispatched.instance.next_forward() {
            let next = target.forward_to(&forward);
            if depth >= self.config.max_forward_depth {
                return Err(DispatchError::ForwardLoopDetected {
                    limit: self.config.max_forward_depth,
                    unit: next.unit().to_string(),
                });
            }

            let mut next_params = dispatched.params.clone();
            if let Some(extra) = forward.params {
                params::overlay(&mut next_params, extra);
            }
            debug!(from = target.unit(), to = next.unit(), depth = depth + 1, "forwarding");

            last = Some(self.run(next, next_params, directory, depth + 1)?);
        }

        Ok(last.unwrap_or(dispatched))
    }

    /// Loads and runs one handler, without following forwards.
    fn execute(&self, target: &Target, params: Params, directory: &Path) -> Result<Dispatched> {
        match target {
            Target::Controller { unit, action } => {
                let at = self.location(directory, &self.config.controller_directory);
                let factory = self.handlers.load_controller(unit, at)?;
                let mut controller = factory();
                if !controller.has_action(action) {
                    return Err(DispatchError::ActionNotFound {
                        controller: unit.clone(),
                        action: action.clone(),
                    });
                }

                debug!(unit = %unit, action = %action, "dispatching controller");
                lifecycle::run_controller(&mut *controller, unit, action, params.clone())?;
                Ok(Dispatched {
                    unit: unit.clone(),
                    action: Some(action.clone()),
                    params,
                    instance: Instance::Controller(controller),
                })
            }
            Target::Action { unit } => {
                let at = self.location(directory, &self.config.action_directory);
                let factory = self.handlers.load_action(unit, at)?;
                let mut action = factory();

                debug!(unit = %unit, "dispatching action");
                lifecycle::run_action(&mut *action, unit, params.clone())?;
                Ok(Dispatched {
                    unit: unit.clone(),
                    action: None,
                    params,
                    instance: Instance::Action(action),
                })
            }
        }
    }

    fn location<'a>(&'a self, directory: &'a Path, sub_directory: &'a str) -> UnitLocation<'a> {
        UnitLocation {
            base: directory,
            sub_directory,
            extension: &self.config.unit_extension,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mapper_id", &self.mapper_id)
            .field("handlers", &self.handlers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Defaults for a route connected without any: literal first segment as
/// controller, `index` as action.
fn derived_defaults(pattern: &str) -> Defaults {
    let controller = pattern
        .split('/')
        .find(|s| !s.is_empty())
        .filter(|s| !s.starts_with(':') && !s.starts_with('*'))
        .map(str::to_string);

    Defaults::new()
        .with_opt("controller", controller)
        .with("action", DEFAULT_ACTION)
        .with_null("params")
}
