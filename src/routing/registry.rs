//! Route registration and dispatch-table construction.
//!
//! # Responsibilities
//! - Collect (path, handler) pairs before the server starts
//! - Reject conflicting registrations up front
//! - Freeze the collection into an immutable axum `Router`
//!
//! # Design Decisions
//! - Duplicate paths are an error at registration, not at startup
//! - Only literal paths are accepted, so freezing never hits axum's path panics
//! - Paths under a reserved prefix (static files) are refused
//! - Insertion order is preserved; it does not affect dispatch

use axum::{routing::MethodRouter, Router};

/// Why a route could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("route '{0}' is already registered")]
    Duplicate(String),

    #[error("route '{0}' must be an absolute literal path")]
    InvalidPath(String),

    #[error("route '{path}' falls under the reserved prefix '{prefix}'")]
    ReservedPrefix { path: String, prefix: String },
}

/// A registered route.
pub struct Route<S> {
    path: String,
    handler: MethodRouter<S>,
}

impl<S> Route<S> {
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Ordered collection of routes, read-only once frozen.
pub struct RouteRegistry<S> {
    routes: Vec<Route<S>>,
    reserved: Vec<String>,
}

impl<S> RouteRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            reserved: Vec::new(),
        }
    }

    /// Refuse future registrations at or below `prefix`.
    pub fn reserve_prefix(&mut self, prefix: impl Into<String>) {
        self.reserved.push(prefix.into());
    }

    /// Append a route.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: MethodRouter<S>,
    ) -> Result<(), RegistryError> {
        let path = path.into();

        if !is_literal_path(&path) {
            return Err(RegistryError::InvalidPath(path));
        }
        if let Some(prefix) = self.reserved.iter().find(|p| is_under(&path, p)) {
            return Err(RegistryError::ReservedPrefix {
                prefix: prefix.clone(),
                path,
            });
        }
        if self.routes.iter().any(|r| r.path == path) {
            return Err(RegistryError::Duplicate(path));
        }

        tracing::debug!(path = %path, "Route registered");
        self.routes.push(Route { path, handler });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<S>> {
        self.routes.iter()
    }

    /// Build the dispatch table, passing every handler through `wrap`.
    pub fn freeze<F>(&self, wrap: F) -> Router<S>
    where
        F: Fn(MethodRouter<S>) -> MethodRouter<S>,
    {
        self.routes.iter().fold(Router::new(), |router, route| {
            router.route(&route.path, wrap(route.handler.clone()))
        })
    }
}

impl<S> Default for RouteRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute, and free of anything axum would read as a capture or wildcard.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}

fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
