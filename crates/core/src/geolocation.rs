//! One-shot position acquisition
//!
//! A `PositionSource` is the platform capability; `Geolocator` turns one
//! platform response into either a complete `GeoFix` or `LocationUnavailable`.

use crate::errors::{CheckInError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Raw platform coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location request timed out")]
    Timeout,

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Platform position capability
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Single request for the current position; no retry
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError>;
}

/// Position source with a configured fixed answer
#[derive(Debug, Clone)]
pub struct StaticPositionSource {
    position: Option<Coordinates>,
}

impl StaticPositionSource {
    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Some(Coordinates {
                latitude,
                longitude,
            }),
        }
    }

    /// A source that never produces a position
    pub fn unavailable() -> Self {
        Self { position: None }
    }

    pub fn from_config(position: Option<(f64, f64)>) -> Self {
        match position {
            Some((latitude, longitude)) => Self::fixed(latitude, longitude),
            None => Self::unavailable(),
        }
    }
}

#[async_trait]
impl PositionSource for StaticPositionSource {
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError> {
        self.position
            .ok_or_else(|| PositionError::Unavailable("no position configured".to_string()))
    }
}

/// A complete position reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub acquired_at: DateTime<Utc>,
}

impl GeoFix {
    fn from_coordinates(coords: Coordinates) -> Result<Self> {
        if !(-90.0..=90.0).contains(&coords.latitude) || !(-180.0..=180.0).contains(&coords.longitude) {
            return Err(CheckInError::LocationUnavailable {
                reason: format!(
                    "platform reported out-of-range position ({}, {})",
                    coords.latitude, coords.longitude
                ),
            });
        }

        Ok(Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            acquired_at: Utc::now(),
        })
    }
}

/// Acquires position fixes; holds no fix itself
#[derive(Clone)]
pub struct Geolocator {
    source: Arc<dyn PositionSource>,
}

impl Geolocator {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self { source }
    }

    /// Ask the platform once. Every call is independent of the previous ones.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<GeoFix> {
        match self.source.current_position().await {
            Ok(coords) => {
                let fix = GeoFix::from_coordinates(coords)?;
                debug!(latitude = fix.latitude, longitude = fix.longitude, "Position acquired");
                Ok(fix)
            }
            Err(e) => {
                warn!(error = %e, "Position acquisition failed");
                Err(CheckInError::LocationUnavailable {
                    reason: e.to_string(),
                })
            }
        }
    }
}
