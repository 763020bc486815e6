//! In-memory route storage.

use std::sync::Mutex;

use crate::errors::CollaboratorError;
use crate::model::Route;
use crate::traits::RouteStore;

/// Keeps saved routes in memory, newest last. A route saved again under the
/// same id replaces the earlier copy.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    routes: Mutex<Vec<Route>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Route> {
        self.routes
            .lock()
            .ok()?
            .iter()
            .find(|route| route.id == id)
            .cloned()
    }
}

impl RouteStore for MemoryRouteStore {
    fn save_route(&self, route: &Route) -> Result<(), CollaboratorError> {
        let mut routes = self
            .routes
            .lock()
            .map_err(|err| CollaboratorError::Storage(err.to_string()))?;
        routes.retain(|saved| saved.id != route.id);
        routes.push(route.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn route(id: &str, distance: f64) -> Route {
        let now = Utc::now();
        Route {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            candidate_ids: vec!["a".to_string()],
            points: Vec::new(),
            segments: Vec::new(),
            total_distance: distance,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_save_and_get() {
        let store = MemoryRouteStore::new();
        store.save_route(&route("r1", 1.0)).unwrap();
        assert_eq!(store.get("r1").map(|r| r.total_distance), Some(1.0));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_resave_replaces() {
        let store = MemoryRouteStore::new();
        store.save_route(&route("r1", 1.0)).unwrap();
        store.save_route(&route("r2", 2.0)).unwrap();
        store.save_route(&route("r1", 3.0)).unwrap();
        let ids: Vec<_> = store.routes().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
        assert_eq!(store.get("r1").map(|r| r.total_distance), Some(3.0));
    }
}
