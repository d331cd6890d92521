//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};

use crate::domain::{Coord, PositionFix};
use crate::scheduler::CycleReport;
use crate::suppression::{Category, SuppressionError};

use super::dto::*;
use super::state::{AppState, SharedGate};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/outcomes", get(outcomes))
        .route("/position", post(update_position))
        .route("/suppression", get(suppression))
        .route("/dismiss/:category", post(dismiss))
        .route("/enable/:category", post(enable))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The last cycle's report.
async fn outcomes(State(state): State<AppState>) -> Result<Json<CycleReport>, AppError> {
    let latest = state.reports.borrow().clone();
    latest
        .map(|report| Json(report.as_ref().clone()))
        .ok_or_else(|| AppError::NotFound {
            message: "No poll cycle has run yet".to_string(),
        })
}

/// Publish a new position fix.
async fn update_position(
    State(state): State<AppState>,
    Json(req): Json<PositionRequest>,
) -> Result<StatusCode, AppError> {
    let coord = Coord::new(req.lat, req.lon);
    if !coord.is_valid() {
        return Err(AppError::BadRequest {
            message: format!("Invalid coordinates: {}, {}", req.lat, req.lon),
        });
    }

    let timestamp_ms = req
        .timestamp_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    state.position.publish(PositionFix { coord, timestamp_ms });

    Ok(StatusCode::NO_CONTENT)
}

/// Suppression state of every category.
async fn suppression(State(state): State<AppState>) -> Json<Vec<SuppressionStatus>> {
    let now = Utc::now();
    Json(
        Category::ALL
            .iter()
            .map(|c| status(&state.gate, *c, now))
            .collect(),
    )
}

/// Dismiss a category's alerts.
async fn dismiss(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<SuppressionStatus>, AppError> {
    let category: Category = category.parse()?;
    let now = Utc::now();
    let gate = Arc::clone(&state.gate);
    blocking(move || gate.dismiss(category, now)).await?;
    Ok(Json(status(&state.gate, category, now)))
}

/// Re-enable a category's alerts.
async fn enable(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<SuppressionStatus>, AppError> {
    let category: Category = category.parse()?;
    let gate = Arc::clone(&state.gate);
    blocking(move || gate.reenable(category)).await?;
    Ok(Json(status(&state.gate, category, Utc::now())))
}

/// Run a store write off the async worker threads.
async fn blocking(
    write: impl FnOnce() -> Result<(), SuppressionError> + Send + 'static,
) -> Result<(), AppError> {
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("suppression write task failed: {e}"),
        })?
        .map_err(AppError::from)
}

fn status(gate: &SharedGate, category: Category, now: DateTime<Utc>) -> SuppressionStatus {
    SuppressionStatus {
        category,
        suppressed: gate.is_suppressed(category, now),
        last_dismissed: gate.last_dismissed(category),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<SuppressionError> for AppError {
    fn from(e: SuppressionError) -> Self {
        match e {
            SuppressionError::UnknownCategory(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{}", message);
        } else {
            tracing::debug!(%status, "{}", message);
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionCell, PositionSource};
    use crate::suppression::{MemorySuppressionStore, SuppressionGate, SuppressionStore};
    use tokio::sync::watch;

    fn state() -> (AppState, watch::Sender<Option<Arc<CycleReport>>>) {
        let store: Box<dyn SuppressionStore> = Box::new(MemorySuppressionStore::new());
        let (tx, rx) = watch::channel(None);
        let state = AppState::new(
            PositionCell::new(),
            Arc::new(SuppressionGate::new(store)),
            rx,
        );
        (state, tx)
    }

    #[tokio::test]
    async fn health_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn outcomes_before_first_cycle() {
        let (state, _tx) = state();
        let err = outcomes(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn outcomes_returns_latest_report() {
        let (state, tx) = state();
        let started_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        tx.send_replace(Some(Arc::new(CycleReport {
            started_at,
            outcomes: vec![],
            skipped: None,
        })));

        let Json(report) = outcomes(State(state)).await.unwrap();
        assert_eq!(report.started_at, started_at);
    }

    #[tokio::test]
    async fn position_is_published() {
        let (state, _tx) = state();
        let req = PositionRequest {
            lat: 36.48,
            lon: 127.289,
            timestamp_ms: Some(42),
        };

        let status = update_position(State(state.clone()), Json(req)).await.unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        let fix = state.position.latest().unwrap();
        assert_eq!(fix.timestamp_ms, 42);
        assert_eq!(fix.coord, Coord::new(36.48, 127.289));
    }

    #[tokio::test]
    async fn invalid_position_rejected() {
        let (state, _tx) = state();
        let req = PositionRequest {
            lat: 123.0,
            lon: 127.289,
            timestamp_ms: None,
        };

        let err = update_position(State(state.clone()), Json(req))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(state.position.latest().is_none());
    }

    #[tokio::test]
    async fn dismiss_then_enable() {
        let (state, _tx) = state();

        let Json(dismissed) = dismiss(State(state.clone()), Path("bus".to_string()))
            .await
            .unwrap();
        assert_eq!(dismissed.category, Category::Bus);
        assert!(dismissed.suppressed);
        assert!(dismissed.last_dismissed.is_some());

        let Json(enabled) = enable(State(state.clone()), Path("BUS".to_string()))
            .await
            .unwrap();
        assert!(!enabled.suppressed);
        assert!(enabled.last_dismissed.is_none());
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl SuppressionStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<i64> {
            None
        }

        fn set(&self, _key: &str, _value: i64) -> Result<(), SuppressionError> {
            Err(SuppressionError::Io {
                message: "read-only".into(),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), SuppressionError> {
            Err(SuppressionError::Io {
                message: "read-only".into(),
            })
        }
    }

    #[tokio::test]
    async fn failed_dismiss_is_internal_error() {
        let (_, rx) = watch::channel(None);
        let store: Box<dyn SuppressionStore> = Box::new(ReadOnlyStore);
        let state = AppState::new(PositionCell::new(), Arc::new(SuppressionGate::new(store)), rx);

        let err = dismiss(State(state.clone()), Path("bus".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(!state.gate.is_suppressed(Category::Bus, Utc::now()));
    }

    #[tokio::test]
    async fn unknown_category_is_bad_request() {
        let (state, _tx) = state();
        let err = dismiss(State(state), Path("traffic".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suppression_lists_every_category() {
        let (state, _tx) = state();
        state
            .gate
            .dismiss(Category::Persistent, Utc::now())
            .unwrap();

        let Json(statuses) = suppression(State(state)).await;

        assert_eq!(statuses.len(), Category::ALL.len());
        let persistent = statuses
            .iter()
            .find(|s| s.category == Category::Persistent)
            .unwrap();
        assert!(persistent.suppressed);
        assert!(statuses
            .iter()
            .filter(|s| s.category != Category::Persistent)
            .all(|s| !s.suppressed));
    }
}
