//! Check-in submission orchestration
//!
//! Combines a confirmed frame and the caller's current fix into one write,
//! then refreshes the attendance board. The refresh never starts before the
//! write is acknowledged, and a failed write leaves the board untouched.

use crate::capture::ConfirmedFrame;
use crate::errors::{CheckInError, Result};
use crate::geolocation::GeoFix;
use crate::refresh::{AggregateRefresh, AttendanceBoard, AttendanceSnapshot};
use officehub_common::metrics;
use officehub_common::models::{CheckInReceipt, CheckInSubmission};
use officehub_common::RemoteService;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

/// Result of a recorded check-in
#[derive(Debug)]
pub enum CheckInOutcome {
    /// Write and refresh both succeeded
    Recorded {
        receipt: CheckInReceipt,
        snapshot: Arc<AttendanceSnapshot>,
    },
    /// The write succeeded but the views could not be refreshed
    RecordedStale {
        receipt: CheckInReceipt,
        warning: CheckInError,
    },
}

impl CheckInOutcome {
    pub fn receipt(&self) -> &CheckInReceipt {
        match self {
            CheckInOutcome::Recorded { receipt, .. } | CheckInOutcome::RecordedStale { receipt, .. } => {
                receipt
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, CheckInOutcome::RecordedStale { .. })
    }
}

pub struct CheckInOrchestrator {
    service: Arc<dyn RemoteService>,
    refresh: AggregateRefresh,
    board: Weak<AttendanceBoard>,
}

impl CheckInOrchestrator {
    /// The board is held weakly; once its owner drops it, refresh results are discarded
    pub fn new(service: Arc<dyn RemoteService>, board: &Arc<AttendanceBoard>) -> Self {
        Self {
            refresh: AggregateRefresh::new(service.clone()),
            service,
            board: Arc::downgrade(board),
        }
    }

    /// Submit one check-in with the fix the caller currently holds
    #[instrument(skip_all, fields(has_fix = fix.is_some()))]
    pub async fn submit(&self, frame: ConfirmedFrame, fix: Option<&GeoFix>) -> Result<CheckInOutcome> {
        let Some(fix) = fix else {
            metrics::record_checkin("location_missing");
            return Err(CheckInError::LocationMissing);
        };

        let submission = CheckInSubmission {
            image: frame.into_image(),
            latitude: fix.latitude,
            longitude: fix.longitude,
        };

        let receipt = match self.service.submit_check_in(&submission).await {
            Ok(receipt) => receipt,
            Err(source) => {
                warn!(error = %source, "Check-in submission failed");
                metrics::record_checkin("submission_failed");
                return Err(CheckInError::SubmissionFailed { source });
            }
        };

        info!(
            attendance_id = %receipt.attendance_id,
            status = %receipt.status,
            face_verified = receipt.face_verified,
            location_verified = receipt.location_verified,
            "Check-in recorded"
        );

        match self.refresh.refresh().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                match self.board.upgrade() {
                    Some(board) => board.publish(snapshot.clone()),
                    None => debug!("Attendance board dropped; discarding refreshed data"),
                }
                metrics::record_checkin("recorded");
                Ok(CheckInOutcome::Recorded { receipt, snapshot })
            }
            Err(warning) => {
                metrics::record_checkin("recorded_stale");
                Ok(CheckInOutcome::RecordedStale { receipt, warning })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RefreshLeg;
    use crate::testing::{
        records_after_check_in, sample_records, sample_summary, MockRemoteService, Op,
    };
    use chrono::Utc;
    use officehub_common::models::StillImage;
    use tokio_test::{assert_err, assert_ok};

    fn frame() -> ConfirmedFrame {
        ConfirmedFrame::new(StillImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF]))
    }

    fn fix() -> GeoFix {
        GeoFix {
            latitude: 12.34,
            longitude: 56.78,
            acquired_at: Utc::now(),
        }
    }

    fn setup() -> (Arc<MockRemoteService>, Arc<AttendanceBoard>, CheckInOrchestrator) {
        let service = Arc::new(MockRemoteService::new());
        let board = Arc::new(AttendanceBoard::new());
        let orchestrator = CheckInOrchestrator::new(service.clone(), &board);
        (service, board, orchestrator)
    }

    #[tokio::test]
    async fn test_missing_fix_makes_no_calls() {
        let (service, board, orchestrator) = setup();

        let err = assert_err!(orchestrator.submit(frame(), None).await);
        assert!(matches!(err, CheckInError::LocationMissing));
        assert!(service.calls().is_empty());
        assert!(board.current().is_none());
    }

    #[tokio::test]
    async fn test_submit_then_refresh_in_order() {
        let (service, board, orchestrator) = setup();
        service.set_records(records_after_check_in());

        let outcome = assert_ok!(orchestrator.submit(frame(), Some(&fix())).await);
        assert!(!outcome.is_stale());
        assert_eq!(outcome.receipt().attendance_id, "42");

        let submissions = service.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].latitude, 12.34);
        assert_eq!(submissions[0].longitude, 56.78);
        assert_eq!(submissions[0].image.bytes, vec![0xFF, 0xD8, 0xFF]);

        let calls = service.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Op::SubmitCheckIn);
        assert_eq!(service.count(Op::FetchSummary), 1);
        assert_eq!(service.count(Op::FetchRecords), 1);

        let current = board.current().unwrap();
        assert_eq!(current.summary, sample_summary());
        assert_eq!(current.records, records_after_check_in());
        assert_ne!(current.records, sample_records());
    }

    #[tokio::test]
    async fn test_failed_submission_skips_refresh() {
        let (service, board, orchestrator) = setup();
        let before = AggregateRefresh::new(service.clone())
            .refresh_into(&board)
            .await
            .unwrap();
        let calls_before = service.calls().len();

        service.fail(Op::SubmitCheckIn);
        let err = assert_err!(orchestrator.submit(frame(), Some(&fix())).await);

        assert!(matches!(err, CheckInError::SubmissionFailed { .. }));
        assert_eq!(service.calls().len(), calls_before + 1);
        assert!(Arc::ptr_eq(&board.current().unwrap(), &before));
    }

    #[tokio::test]
    async fn test_failed_refresh_is_stale_warning() {
        let (service, board, orchestrator) = setup();
        service.fail(Op::FetchSummary);

        let outcome = assert_ok!(orchestrator.submit(frame(), Some(&fix())).await);
        match outcome {
            CheckInOutcome::RecordedStale { receipt, warning } => {
                assert_eq!(receipt.attendance_id, "42");
                assert!(matches!(
                    warning,
                    CheckInError::RefreshFailed { leg: RefreshLeg::Summary, .. }
                ));
            }
            other => panic!("expected stale outcome, got {:?}", other),
        }
        assert!(board.current().is_none());
    }

    #[tokio::test]
    async fn test_dropped_board_discards_refresh() {
        let (service, board, orchestrator) = setup();
        drop(board);

        let outcome = assert_ok!(orchestrator.submit(frame(), Some(&fix())).await);
        assert!(!outcome.is_stale());
        assert_eq!(service.count(Op::FetchRecords), 1);
    }
}
