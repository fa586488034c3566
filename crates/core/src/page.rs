//! Attendance page calling context
//!
//! Owns the current position fix and the attendance board, and turns every
//! failure into a user-facing `Notice` instead of an error.

use crate::capture::ConfirmedFrame;
use crate::errors::CheckInError;
use crate::geolocation::{GeoFix, Geolocator, PositionSource};
use crate::orchestrator::{CheckInOrchestrator, CheckInOutcome};
use crate::refresh::{AggregateRefresh, AttendanceBoard, AttendanceSnapshot};
use officehub_common::models::CheckInReceipt;
use officehub_common::RemoteService;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&CheckInError> for Notice {
    fn from(err: &CheckInError) -> Self {
        match err {
            CheckInError::RefreshFailed { .. } => Notice::warning(err.to_string()),
            _ => Notice::error(err.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

pub struct AttendancePage {
    locator: Geolocator,
    refresh: AggregateRefresh,
    orchestrator: CheckInOrchestrator,
    board: Arc<AttendanceBoard>,
    fix: Option<GeoFix>,
    notices: Vec<Notice>,
}

impl AttendancePage {
    pub fn new(service: Arc<dyn RemoteService>, positions: Arc<dyn PositionSource>) -> Self {
        let board = Arc::new(AttendanceBoard::new());
        Self {
            locator: Geolocator::new(positions),
            refresh: AggregateRefresh::new(service.clone()),
            orchestrator: CheckInOrchestrator::new(service, &board),
            board,
            fix: None,
            notices: Vec::new(),
        }
    }

    pub fn board(&self) -> &Arc<AttendanceBoard> {
        &self.board
    }

    pub fn snapshot(&self) -> Option<Arc<AttendanceSnapshot>> {
        self.board.current()
    }

    pub fn fix(&self) -> Option<&GeoFix> {
        self.fix.as_ref()
    }

    /// Take the notices raised since the last call
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Acquire position and load attendance data concurrently
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        let (fix, refreshed) = tokio::join!(self.locator.acquire(), self.refresh.refresh());

        self.apply_fix(fix);
        match refreshed {
            Ok(snapshot) => self.board.publish(Arc::new(snapshot)),
            Err(e) => self.notices.push(Notice::from(&e)),
        }
    }

    /// Reload attendance data without touching the fix
    pub async fn refresh(&mut self) {
        if let Err(e) = self.refresh.refresh_into(&self.board).await {
            self.notices.push(Notice::from(&e));
        }
    }

    /// Ask for a fresh fix; a failed attempt clears the previous one
    pub async fn locate(&mut self) -> Option<GeoFix> {
        let fix = self.locator.acquire().await;
        self.apply_fix(fix);
        self.fix
    }

    fn apply_fix(&mut self, fix: crate::errors::Result<GeoFix>) {
        match fix {
            Ok(fix) => self.fix = Some(fix),
            Err(e) => {
                self.fix = None;
                self.notices.push(Notice::from(&e));
            }
        }
    }

    /// Submit a confirmed frame with the currently held fix
    #[instrument(skip_all)]
    pub async fn check_in(&mut self, frame: ConfirmedFrame) -> Option<CheckInReceipt> {
        match self.orchestrator.submit(frame, self.fix.as_ref()).await {
            Ok(CheckInOutcome::Recorded { receipt, .. }) => {
                self.notices.push(Notice::success(receipt.message.clone()));
                Some(receipt)
            }
            Ok(CheckInOutcome::RecordedStale { receipt, warning }) => {
                self.notices.push(Notice::success(receipt.message.clone()));
                self.notices.push(Notice::from(&warning));
                Some(receipt)
            }
            Err(e) => {
                self.notices.push(Notice::from(&e));
                None
            }
        }
    }

    /// Report a capture-side failure the same way as any other
    pub fn report(&mut self, err: &CheckInError) {
        self.notices.push(Notice::from(err));
    }
}
