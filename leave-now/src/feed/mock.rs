//! Mock feed for running without a service key.
//!
//! Loads sample arrival responses from JSON files and serves them as if
//! they were live API responses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::LiveArrival;

use super::TransitFeed;
use super::convert::parse_arrivals;
use super::error::FeedError;

/// Mock feed that serves raw response bodies keyed by stop ID.
///
/// Bodies go through the same decoding as live responses, so fixtures can
/// exercise error envelopes and odd payload shapes too.
#[derive(Clone, Default)]
pub struct MockFeed {
    bodies: Arc<RwLock<HashMap<String, String>>>,
}

impl MockFeed {
    /// Load every `{STOP_ID}.json` file in `data_dir`.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();
        let mut bodies = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| FeedError::Api {
            status: 0,
            message: format!("Failed to read mock data directory: {}", e),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| FeedError::Api {
                status: 0,
                message: format!("Failed to read directory entry: {}", e),
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(stop_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let body = std::fs::read_to_string(&path).map_err(|e| FeedError::Api {
                status: 0,
                message: format!("Failed to read {:?}: {}", path, e),
            })?;

            bodies.insert(stop_id.to_string(), body);
        }

        if bodies.is_empty() {
            return Err(FeedError::Api {
                status: 0,
                message: format!("No mock feed files found in {:?}", data_dir),
            });
        }

        Ok(Self {
            bodies: Arc::new(RwLock::new(bodies)),
        })
    }

    /// Build a mock from in-memory `(stop_id, body)` pairs.
    pub fn from_bodies<I, K, V>(bodies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let bodies = bodies
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            bodies: Arc::new(RwLock::new(bodies)),
        }
    }

    /// Replace the response served for `stop_id`.
    pub async fn set_body(&self, stop_id: impl Into<String>, body: impl Into<String>) {
        self.bodies.write().await.insert(stop_id.into(), body.into());
    }

    /// List stops available in the mock data.
    pub async fn available_stops(&self) -> Vec<String> {
        let bodies = self.bodies.read().await;
        let mut stops: Vec<String> = bodies.keys().cloned().collect();
        stops.sort();
        stops
    }
}

impl TransitFeed for MockFeed {
    async fn fetch_arrivals(
        &self,
        stop_id: &str,
        _city_code: u32,
    ) -> Result<Vec<LiveArrival>, FeedError> {
        let bodies = self.bodies.read().await;

        let body = bodies.get(stop_id).ok_or_else(|| FeedError::Api {
            status: 404,
            message: format!("No mock data for stop {}", stop_id),
        })?;

        parse_arrivals(body)
    }
}
