//! Category-scoped alert muting after a user dismissal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::SuppressionError;
use super::store::SuppressionStore;

/// Alert categories that can be dismissed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bus,
    Weather,
    Persistent,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Bus, Category::Weather, Category::Persistent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bus => "bus",
            Category::Weather => "weather",
            Category::Persistent => "persistent",
        }
    }

    /// How long a dismissal mutes this category.
    pub fn window(&self) -> SuppressionWindow {
        match self {
            Category::Bus => SuppressionWindow::For(Duration::minutes(30)),
            Category::Weather => SuppressionWindow::For(Duration::minutes(60)),
            Category::Persistent => SuppressionWindow::Sticky,
        }
    }

    /// Store key holding this category's last dismissal time.
    pub fn store_key(&self) -> String {
        format!("lastDismiss.{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SuppressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bus" => Ok(Category::Bus),
            "weather" => Ok(Category::Weather),
            "persistent" => Ok(Category::Persistent),
            _ => Err(SuppressionError::UnknownCategory(s.to_string())),
        }
    }
}

/// Duration a dismissal stays in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionWindow {
    /// Muted until this much time has passed since the dismissal.
    For(Duration),
    /// Muted until explicitly re-enabled.
    Sticky,
}

/// Decides whether alerts of a category are currently muted.
#[derive(Debug)]
pub struct SuppressionGate<S> {
    store: S,
}

impl<S: SuppressionStore> SuppressionGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a user dismissal of `category` at `now`.
    pub fn dismiss(&self, category: Category, now: DateTime<Utc>) -> Result<(), SuppressionError> {
        self.store
            .set(&category.store_key(), now.timestamp_millis())?;
        tracing::info!(category = %category, "Alerts dismissed");
        Ok(())
    }

    /// Clear any dismissal of `category`. The only way to lift a sticky one.
    pub fn reenable(&self, category: Category) -> Result<(), SuppressionError> {
        self.store.remove(&category.store_key())?;
        tracing::info!(category = %category, "Alerts re-enabled");
        Ok(())
    }

    /// Time of the last dismissal, if any.
    pub fn last_dismissed(&self, category: Category) -> Option<DateTime<Utc>> {
        self.store
            .get(&category.store_key())
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Whether `category` is muted at `now`.
    pub fn is_suppressed(&self, category: Category, now: DateTime<Utc>) -> bool {
        let Some(last) = self.store.get(&category.store_key()) else {
            return false;
        };

        match category.window() {
            SuppressionWindow::Sticky => true,
            SuppressionWindow::For(window) => {
                now.timestamp_millis().saturating_sub(last) < window.num_milliseconds()
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
