//! The route table and the registry of named tables.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::route::{Defaults, Route, RouteMatch, Rules};

/// Identifier used when a caller does not name its mapper.
pub const DEFAULT_MAPPER_ID: &str = "__default__";

/// An ordered table of routes.
///
/// Routes are tried in registration order and the first match wins.
#[derive(Debug, Clone)]
pub struct Mapper {
    id: String,
    routes: Vec<Route>,
    script_name: Option<String>,
}

impl Mapper {
    /// Creates an empty mapper with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            routes: Vec::new(),
            script_name: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registers a route. Invalid patterns or rules leave the table unchanged.
    pub fn connect(&mut self, pattern: &str, defaults: Defaults, rules: Rules) -> Result<()> {
        let route = Route::new(pattern, defaults, &rules)?;
        debug!(mapper = %self.id, pattern, "route connected");
        self.routes.push(route);
        Ok(())
    }

    /// Matches `path` against the table.
    ///
    /// Leading and trailing slashes are ignored.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let normalized = path.trim_matches('/');
        let found = self
            .routes
            .iter()
            .find_map(|route| route.matches(normalized).map(|m| (route.pattern(), m)));

        match found {
            Some((pattern, m)) => {
                debug!(mapper = %self.id, path, pattern, "path matched");
                Some(m)
            }
            None => {
                debug!(mapper = %self.id, path, routes = self.routes.len(), "no route matched");
                None
            }
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Removes every route.
    pub fn reset(&mut self) {
        self.routes.clear();
    }

    /// Sets the front-controller script name used when generating URLs.
    pub fn set_script_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.script_name = Some(name.into());
        self
    }

    pub fn script_name(&self) -> Option<&str> {
        self.script_name.as_deref()
    }
}

/// A mapper shared by every holder of the same identifier.
pub type SharedMapper = Arc<Mutex<Mapper>>;

/// Hands out one [`Mapper`] per identifier.
///
/// Clones share the same table set. Dispatchers that must not see each
/// other's routes need distinct identifiers (or distinct registries).
///
/// ```
/// use waypoint_mapper::{Defaults, MapperRegistry, Rules};
///
/// let registry = MapperRegistry::new();
/// registry
///     .get("app")
///     .lock()
///     .connect(":controller/:action", Defaults::new(), Rules::new())
///     .unwrap();
///
/// assert_eq!(registry.get("app").lock().len(), 1);
/// assert!(registry.get("other").lock().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapperRegistry {
    mappers: Arc<Mutex<HashMap<String, SharedMapper>>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapper for `id`, creating it on first use.
    pub fn get(&self, id: &str) -> SharedMapper {
        let mut mappers = self.mappers.lock();
        mappers
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Mapper::new(id))))
            .clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mappers.lock().contains_key(id)
    }

    /// Drops the registry's handle to `id`; existing holders keep theirs.
    pub fn remove(&self, id: &str) -> Option<SharedMapper> {
        self.mappers.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.mappers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.lock().is_empty()
    }
}
