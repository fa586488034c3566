//! Check-in error types

use officehub_common::errors::AppError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckInError>;

/// Which read-model fetch failed during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshLeg {
    Summary,
    Records,
    Both,
}

impl fmt::Display for RefreshLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefreshLeg::Summary => "summary",
            RefreshLeg::Records => "records",
            RefreshLeg::Both => "summary and records",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum CheckInError {
    #[error("Location unavailable: {reason}")]
    LocationUnavailable { reason: String },

    #[error("Camera unavailable: {reason}")]
    CaptureUnavailable { reason: String },

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Camera is already in use")]
    DeviceBusy,

    #[error("Location not available yet; allow location access and try again")]
    LocationMissing,

    #[error("Check-in failed: {source}")]
    SubmissionFailed { source: AppError },

    /// The write succeeded; only the local views are behind.
    #[error("Attendance data may be stale ({leg} refresh failed): {source}")]
    RefreshFailed { leg: RefreshLeg, source: AppError },

    #[error(transparent)]
    Service(#[from] AppError),
}

impl CheckInError {
    /// Failures the user can clear by retrying the same flow
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckInError::LocationUnavailable { .. }
            | CheckInError::CaptureUnavailable { .. }
            | CheckInError::DeviceBusy
            | CheckInError::LocationMissing => true,
            CheckInError::SubmissionFailed { source } | CheckInError::RefreshFailed { source, .. } => {
                source.is_transient()
            }
            CheckInError::InvalidState { .. } => false,
            CheckInError::Service(e) => e.is_transient(),
        }
    }
}
