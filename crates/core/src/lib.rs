//! OfficeHub Check-in Core
//!
//! The attendance check-in workflow on top of `officehub-common`:
//! - Position acquisition (`geolocation`)
//! - Capture workflow over an exclusive device (`capture`)
//! - Submission and post-write refresh (`orchestrator`, `refresh`)
//! - The attendance page calling context and its notices (`page`)
//! - Goals, skills, growth, and face enrollment (`progress`)
//! - Admin record management (`admin`)

pub mod admin;
pub mod capture;
pub mod errors;
pub mod geolocation;
pub mod orchestrator;
pub mod page;
pub mod progress;
pub mod refresh;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{register_organization, AdminConsole};
pub use capture::{
    CaptureDevice, CaptureDeviceHandle, CaptureState, CaptureSurface, ConfirmedFrame,
    ImageFileDevice,
};
pub use errors::{CheckInError, RefreshLeg, Result};
pub use geolocation::{GeoFix, Geolocator, PositionSource, StaticPositionSource};
pub use orchestrator::{CheckInOrchestrator, CheckInOutcome};
pub use page::{AttendancePage, Notice, NoticeLevel};
pub use progress::{enroll_faces, ProgressTracker, MIN_ENROLLMENT_IMAGES};
pub use refresh::{AggregateRefresh, AttendanceBoard, AttendanceSnapshot};
