//! Attendance read models and their all-or-nothing refresh
//!
//! `AggregateRefresh` fetches the summary and the record list concurrently
//! and produces one `AttendanceSnapshot` only when both legs succeed.
//! `AttendanceBoard` owns the published snapshot and replaces it whole.

use crate::errors::{CheckInError, RefreshLeg, Result};
use chrono::{DateTime, Utc};
use futures::future;
use officehub_common::metrics;
use officehub_common::models::{AttendanceRecord, AttendanceSummary};
use officehub_common::RemoteService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Summary and records fetched together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSnapshot {
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
    pub refreshed_at: DateTime<Utc>,
}

/// View model publishing whole snapshots to any number of readers
#[derive(Debug)]
pub struct AttendanceBoard {
    tx: watch::Sender<Option<Arc<AttendanceSnapshot>>>,
}

impl Default for AttendanceBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Last published snapshot, if any refresh has succeeded
    pub fn current(&self) -> Option<Arc<AttendanceSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AttendanceSnapshot>>> {
        self.tx.subscribe()
    }

    /// Replace summary and records in one step
    pub fn publish(&self, snapshot: Arc<AttendanceSnapshot>) {
        debug!(records = snapshot.records.len(), "Attendance board updated");
        self.tx.send_replace(Some(snapshot));
    }
}

/// Concurrent summary + records fetch with a single commit point
#[derive(Clone)]
pub struct AggregateRefresh {
    service: Arc<dyn RemoteService>,
}

impl AggregateRefresh {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self { service }
    }

    /// Fetch both read models. Fails as a whole if either leg fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AttendanceSnapshot> {
        let start = Instant::now();

        let (summary, records) =
            future::join(self.service.fetch_summary(), self.service.fetch_records()).await;

        let outcome = match (summary, records) {
            (Ok(summary), Ok(records)) => Ok(AttendanceSnapshot {
                summary,
                records,
                refreshed_at: Utc::now(),
            }),
            (Err(source), Ok(_)) => Err(CheckInError::RefreshFailed {
                leg: RefreshLeg::Summary,
                source,
            }),
            (Ok(_), Err(source)) => Err(CheckInError::RefreshFailed {
                leg: RefreshLeg::Records,
                source,
            }),
            (Err(source), Err(records_err)) => {
                debug!(error = %records_err, "Records fetch also failed");
                Err(CheckInError::RefreshFailed {
                    leg: RefreshLeg::Both,
                    source,
                })
            }
        };

        metrics::record_refresh(start.elapsed(), outcome.is_ok());
        if let Err(e) = &outcome {
            warn!(error = %e, "Attendance refresh failed; keeping previous data");
        }
        outcome
    }

    /// Refresh and publish to `board` on success; the board is untouched on failure
    pub async fn refresh_into(&self, board: &AttendanceBoard) -> Result<Arc<AttendanceSnapshot>> {
        let snapshot = Arc::new(self.refresh().await?);
        board.publish(snapshot.clone());
        Ok(snapshot)
    }
}
