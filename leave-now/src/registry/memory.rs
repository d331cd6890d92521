//! In-memory route registry.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::{Coord, RegisteredRoute, RouteKey};

use super::RouteStore;
use super::error::RegistryError;

/// A new (stop, route) pairing to monitor.
///
/// Also the on-disk format of a routes file. Older entries stored `0.0`/`0.0`
/// for a stop whose location was never captured; both that and absent
/// fields mean "unknown location".
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRegistration {
    pub stop_id: String,
    pub stop_name: String,
    pub route_id: String,
    pub route_number: String,
    #[serde(default)]
    pub direction: Option<String>,
    pub city_code: u32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl RouteRegistration {
    /// The stop location, if one was recorded.
    pub fn stop_location(&self) -> Option<Coord> {
        let coord = Coord::new(self.latitude?, self.longitude?);
        let legacy_blank = coord.lat == 0.0 && coord.lon == 0.0;
        (coord.is_valid() && !legacy_blank).then_some(coord)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.stop_id.trim().is_empty() {
            return Err(RegistryError::Invalid("stop_id is empty"));
        }
        if self.route_id.trim().is_empty() && self.route_number.trim().is_empty() {
            return Err(RegistryError::Invalid("route_id and route_number are both empty"));
        }
        Ok(())
    }
}

/// Thread-safe in-memory registry.
///
/// Entries are never removed: deactivation flips `active` so the entry's key
/// stays stable.
#[derive(Clone, Default)]
pub struct MemoryRouteStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    routes: Vec<RegisteredRoute>,
    next_id: u64,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load registrations from a JSON array file.
    pub async fn load_json(path: impl AsRef<Path>, now: DateTime<Utc>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| RegistryError::Io {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let entries: Vec<RouteRegistration> =
            serde_json::from_str(&contents).map_err(|e| RegistryError::Json {
                message: format!("failed to parse {}: {}", path.display(), e),
            })?;

        let store = Self::new();
        for entry in entries {
            store.register(entry, now).await?;
        }
        Ok(store)
    }

    /// Register a new route.
    ///
    /// Fails if an active entry already monitors the same (stop, route).
    pub async fn register(
        &self,
        registration: RouteRegistration,
        now: DateTime<Utc>,
    ) -> Result<RegisteredRoute, RegistryError> {
        registration.validate()?;

        let mut inner = self.inner.write().await;

        let duplicate = inner.routes.iter().any(|r| {
            r.active && r.stop_id == registration.stop_id && r.route_id == registration.route_id
        });
        if duplicate {
            return Err(RegistryError::DuplicateActive {
                stop_id: registration.stop_id,
                route_id: registration.route_id,
            });
        }

        inner.next_id += 1;
        let route = RegisteredRoute {
            id: RouteKey(inner.next_id),
            stop_location: registration.stop_location(),
            stop_id: registration.stop_id,
            stop_name: registration.stop_name,
            route_id: registration.route_id,
            route_number: registration.route_number,
            direction: registration.direction,
            city_code: registration.city_code,
            created_at: now,
            active: true,
            alias: registration.alias,
        };
        inner.routes.push(route.clone());

        Ok(route)
    }

    /// Replace the user alias of a route.
    pub async fn set_alias(&self, key: RouteKey, alias: Option<String>) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let route = inner
            .routes
            .iter_mut()
            .find(|r| r.id == key)
            .ok_or(RegistryError::NotFound(key))?;
        route.alias = alias;
        Ok(())
    }

    /// Stop monitoring a route. The entry is kept, marked inactive.
    pub async fn deactivate(&self, key: RouteKey) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let route = inner
            .routes
            .iter_mut()
            .find(|r| r.id == key)
            .ok_or(RegistryError::NotFound(key))?;
        route.active = false;
        Ok(())
    }

    /// Look up a route by key, active or not.
    pub async fn get(&self, key: RouteKey) -> Option<RegisteredRoute> {
        let inner = self.inner.read().await;
        inner.routes.iter().find(|r| r.id == key).cloned()
    }

    /// Number of entries, including inactive ones.
    pub async fn len(&self) -> usize {
        self.inner.read().await.routes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.routes.is_empty()
    }
}

impl RouteStore for MemoryRouteStore {
    async fn list_active(&self) -> Result<Vec<RegisteredRoute>, RegistryError> {
        let inner = self.inner.read().await;
        Ok(inner.routes.iter().filter(|r| r.active).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn registration(stop: &str, route: &str) -> RouteRegistration {
        RouteRegistration {
            stop_id: stop.to_string(),
            stop_name: "Stop".to_string(),
            route_id: route.to_string(),
            route_number: "370".to_string(),
            direction: None,
            city_code: 12,
            latitude: Some(36.48),
            longitude: Some(127.289),
            alias: None,
        }
    }

    #[tokio::test]
    async fn register_and_list() {
        let store = MemoryRouteStore::new();
        let a = store.register(registration("S1", "R1"), now()).await.unwrap();
        let b = store.register(registration("S1", "R2"), now()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.stop_location, Some(Coord::new(36.48, 127.289)));
        assert_eq!(store.list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_active_rejected() {
        let store = MemoryRouteStore::new();
        store.register(registration("S1", "R1"), now()).await.unwrap();

        let err = store
            .register(registration("S1", "R1"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateActive { .. }));
    }

    #[tokio::test]
    async fn reregister_after_deactivate() {
        let store = MemoryRouteStore::new();
        let first = store.register(registration("S1", "R1"), now()).await.unwrap();
        store.deactivate(first.id).await.unwrap();

        let second = store.register(registration("S1", "R1"), now()).await.unwrap();
        assert_ne!(first.id, second.id);

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        // Soft delete keeps the old entry
        assert_eq!(store.len().await, 2);
        assert!(!store.get(first.id).await.unwrap().active);
    }

    #[tokio::test]
    async fn set_alias() {
        let store = MemoryRouteStore::new();
        let route = store.register(registration("S1", "R1"), now()).await.unwrap();

        store.set_alias(route.id, Some("commute".into())).await.unwrap();
        assert_eq!(
            store.get(route.id).await.unwrap().alias.as_deref(),
            Some("commute")
        );

        let err = store.set_alias(RouteKey(99), None).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(RouteKey(99))));
    }

    #[tokio::test]
    async fn legacy_zero_location_is_unknown() {
        let mut reg = registration("S1", "R1");
        reg.latitude = Some(0.0);
        reg.longitude = Some(0.0);
        assert_eq!(reg.stop_location(), None);

        reg.latitude = None;
        reg.longitude = Some(127.0);
        assert_eq!(reg.stop_location(), None);
    }

    #[tokio::test]
    async fn empty_stop_rejected() {
        let store = MemoryRouteStore::new();
        let err = store
            .register(registration("", "R1"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn load_bundled_routes_file() {
        let store = MemoryRouteStore::load_json("data/routes.json", now())
            .await
            .unwrap();
        let routes = store.list_active().await.unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_number, "370");
        assert!(routes[0].stop_location.is_some());
        assert_eq!(routes[1].stop_location, None);
    }

    #[tokio::test]
    async fn load_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let entry = r#"{"stop_id":"S","stop_name":"n","route_id":"R","route_number":"1","city_code":12}"#;
        std::fs::write(&path, format!("[{entry},{entry}]")).unwrap();

        let result = MemoryRouteStore::load_json(&path, now()).await;
        assert!(matches!(result, Err(RegistryError::DuplicateActive { .. })));
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let result = MemoryRouteStore::load_json("data/missing.json", now()).await;
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }
}
