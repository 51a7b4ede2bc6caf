//! Routes and the policies they declare.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use policy::{Action, ResourceType};
use serde::Deserialize;

use crate::{Error, PolicyHandler, Requirement, Result, Scope};

/// A protected operation and its conjunctive policy predicates.
#[derive(Clone)]
pub struct Route {
    name: String,
    handlers: Vec<Arc<dyn PolicyHandler>>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Route {
    /// A route with no predicates; any authenticated principal passes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Add a declarative requirement.
    pub fn require(self, requirement: Requirement) -> Self {
        self.check(requirement)
    }

    /// Add any predicate.
    pub fn check(mut self, handler: impl PolicyHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[Arc<dyn PolicyHandler>] {
        &self.handlers
    }
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    #[serde(default)]
    require: Vec<Requirement>,
}

#[derive(Debug, Default, Deserialize)]
struct RouteFile {
    #[serde(default)]
    routes: BTreeMap<String, RouteEntry>,
}

/// Named routes, looked up per request.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// The user API and command-channel routes.
    pub fn standard() -> Self {
        use Action::*;
        use ResourceType::{Mcp, User};

        Self::empty()
            .with(Route::new("users.create").require(Requirement::new(Create, User)))
            .with(Route::new("users.list").require(Requirement::new(List, User)))
            .with(Route::new("users.read").require(Requirement::new(Read, User).by_param("id")))
            .with(Route::new("users.update").require(Requirement::new(Update, User).by_param("id")))
            .with(Route::new("users.delete").require(Requirement::new(Delete, User).by_param("id")))
            .with(
                Route::new("mcp.messages").require(Requirement::new(Read, Mcp).owned_by("userId")),
            )
    }

    /// Add or replace a route.
    pub fn with(mut self, route: Route) -> Self {
        self.routes.insert(route.name.clone(), route);
        self
    }

    /// Load route declarations from a TOML file, layered over the standard routes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Misconfigured(format!("failed to read routes: {e}")))?;
        Self::parse(&content)
    }

    /// Parse `[routes.<name>]` tables, layered over the standard routes.
    pub fn parse(toml: &str) -> Result<Self> {
        let file: RouteFile = toml::from_str(toml)
            .map_err(|e| Error::Misconfigured(format!("failed to parse routes: {e}")))?;
        Self::standard().extend(file.routes)
    }

    fn extend(mut self, entries: BTreeMap<String, RouteEntry>) -> Result<Self> {
        for (name, entry) in entries {
            let mut route = Route::new(name);
            for requirement in entry.require {
                validate(&route.name, &requirement)?;
                route = route.require(requirement);
            }
            self = self.with(route);
        }
        Ok(self)
    }

    /// Look up a route. Unknown routes are a programming error, never an implicit allow.
    pub fn get(&self, name: &str) -> Result<&Route> {
        self.routes
            .get(name)
            .ok_or_else(|| Error::Misconfigured(format!("unknown route: {name}")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

fn validate(route: &str, requirement: &Requirement) -> Result<()> {
    let empty = match &requirement.scope {
        None => false,
        Some(Scope::Param { param, attribute }) => {
            param.is_empty() || attribute.as_deref().is_some_and(str::is_empty)
        }
        Some(Scope::Owner { owner }) => owner.is_empty(),
    };
    if empty {
        return Err(Error::Misconfigured(format!(
            "route {route}: empty scope on {} {}",
            requirement.action, requirement.resource
        )));
    }
    Ok(())
}
