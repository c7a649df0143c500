//! Handler registry and guarded loading.
//!
//! Handlers are compiled into the application and registered by unit name.
//! A registered handler only becomes dispatchable once its unit file exists
//! on disk at `<base>/<sub>/<Unit>.<ext>`; the first successful load marks
//! the unit as loaded for the life of the registry and later loads skip the
//! filesystem entirely. Handlers registered as preloaded need no file.
//!
//! ```text
//! HandlerRegistry::load("HogeController")
//!   → already loaded?          → reuse
//!   → security::check(path)    → IllegalCharacter
//!   → path is a regular file?  → NotFound
//!   → constructor registered?  → NotFound
//!   → mark loaded, return constructor
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::handler::{Action, Controller};
use crate::security;

/// Creates a fresh controller per dispatch.
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Creates a fresh action per dispatch.
pub type ActionFactory = Arc<dyn Fn() -> Box<dyn Action> + Send + Sync>;

/// The two kinds of handler unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Controller,
    Action,
}

impl UnitKind {
    /// Suffix appended to the logical name to form the unit name.
    pub fn suffix(&self) -> &'static str {
        match self {
            UnitKind::Controller => "Controller",
            UnitKind::Action => "Action",
        }
    }

    /// Builds the unit name: first letter upper-cased, suffix appended.
    ///
    /// ```rust
    /// use waypoint_dispatch::UnitKind;
    ///
    /// assert_eq!(UnitKind::Controller.unit_name("hoge"), "HogeController");
    /// assert_eq!(UnitKind::Action.unit_name("param"), "ParamAction");
    /// ```
    pub fn unit_name(&self, name: &str) -> String {
        let mut unit = capitalize(name);
        unit.push_str(self.suffix());
        unit
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Controller => write!(f, "controller"),
            UnitKind::Action => write!(f, "action"),
        }
    }
}

/// Upper-cases the first ASCII letter, leaving the rest untouched.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(name.len());
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
            out
        }
        None => String::new(),
    }
}

/// Where the loader looks for unit files.
#[derive(Debug, Clone, Copy)]
pub struct UnitLocation<'a> {
    pub base: &'a Path,
    pub sub_directory: &'a str,
    pub extension: &'a str,
}

impl UnitLocation<'_> {
    /// `<base>/<sub>/<unit>.<ext>`
    pub fn path_for(&self, unit: &str) -> PathBuf {
        self.base
            .join(self.sub_directory)
            .join(format!("{unit}.{}", self.extension))
    }
}

/// Registered handler constructors plus the set of loaded units.
///
/// Build it once, wrap it in an `Arc` and share it between dispatchers. The
/// loaded set only grows and is guarded by a mutex.
#[derive(Default)]
pub struct HandlerRegistry {
    controllers: HashMap<String, ControllerFactory>,
    actions: HashMap<String, ActionFactory>,
    loaded: Mutex<HashSet<String>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller under `name` (unit `<Name>Controller`).
    pub fn controller<F, C>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        let unit = UnitKind::Controller.unit_name(name);
        self.controllers.insert(
            unit,
            Arc::new(move || Box::new(factory()) as Box<dyn Controller>),
        );
        self
    }

    /// Registers an action under `name` (unit `<Name>Action`).
    pub fn action<F, A>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: Action + 'static,
    {
        let unit = UnitKind::Action.unit_name(name);
        self.actions.insert(
            unit,
            Arc::new(move || Box::new(factory()) as Box<dyn Action>),
        );
        self
    }

    /// Registers a controller that is loaded from the start.
    pub fn preloaded_controller<F, C>(self, name: &str, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        let unit = UnitKind::Controller.unit_name(name);
        let registry = self.controller(name, factory);
        registry.loaded.lock().insert(unit);
        registry
    }

    /// Registers an action that is loaded from the start.
    pub fn preloaded_action<F, A>(self, name: &str, factory: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: Action + 'static,
    {
        let unit = UnitKind::Action.unit_name(name);
        let registry = self.action(name, factory);
        registry.loaded.lock().insert(unit);
        registry
    }

    /// Whether `unit` has been loaded.
    pub fn is_loaded(&self, unit: &str) -> bool {
        self.loaded.lock().contains(unit)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }

    /// Loads the controller unit `unit`.
    pub fn load_controller(&self, unit: &str, at: UnitLocation<'_>) -> Result<ControllerFactory> {
        self.gate(unit, UnitKind::Controller, at)?;
        let factory = self
            .controllers
            .get(unit)
            .cloned()
            .ok_or_else(|| not_found(unit, at))?;
        self.mark_loaded(unit);
        Ok(factory)
    }

    /// Loads the action unit `unit`.
    pub fn load_action(&self, unit: &str, at: UnitLocation<'_>) -> Result<ActionFactory> {
        self.gate(unit, UnitKind::Action, at)?;
        let factory = self
            .actions
            .get(unit)
            .cloned()
            .ok_or_else(|| not_found(unit, at))?;
        self.mark_loaded(unit);
        Ok(factory)
    }

    /// Filesystem and security checks for units that are not loaded yet.
    fn gate(&self, unit: &str, kind: UnitKind, at: UnitLocation<'_>) -> Result<()> {
        if self.is_loaded(unit) {
            return Ok(());
        }

        let path = at.path_for(unit);
        security::check_unit_name(unit, &path)?;
        security::check(&path)?;
        if !path.is_file() {
            return Err(DispatchError::NotFound {
                unit: unit.to_string(),
                path,
            });
        }

        debug!(unit, %kind, path = %path.display(), "unit file found");
        Ok(())
    }

    fn mark_loaded(&self, unit: &str) {
        if self.loaded.lock().insert(unit.to_string()) {
            debug!(unit, "unit loaded");
        }
    }
}

fn not_found(unit: &str, at: UnitLocation<'_>) -> DispatchError {
    DispatchError::NotFound {
        unit: unit.to_string(),
        path: at.path_for(unit),
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("controllers", &self.controllers.len())
            .field("actions", &self.actions.len())
            .field("loaded", &self.loaded.lock().len())
            .finish()
    }
}
