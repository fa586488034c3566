//! Capture workflow over a live device stream
//!
//! `CaptureDeviceHandle` guards exclusive access to one device. Opening it
//! yields a `CaptureSurface`, which drives the idle / captured states and hands
//! a `ConfirmedFrame` to the caller on confirm.
//!
//! The device stream stays live while a frame is held; `retake` therefore
//! never needs to restart it. Closing or dropping the surface stops the stream.

use crate::errors::{CheckInError, Result};
use async_trait::async_trait;
use officehub_common::models::StillImage;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device stream is not running")]
    NotStreaming,

    #[error("device has not produced a frame yet")]
    NoFrame,

    #[error("device I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Platform capture capability
#[async_trait]
pub trait CaptureDevice: Send {
    async fn start(&mut self) -> std::result::Result<(), DeviceError>;

    /// Must not block; called from `Drop`
    fn stop(&mut self);

    /// Freeze the current stream frame into a still image
    async fn snapshot(&mut self) -> std::result::Result<StillImage, DeviceError>;
}

/// Device whose frames come from an image file on disk.
///
/// A missing or empty file means the stream has not produced a frame.
#[derive(Debug, Clone)]
pub struct ImageFileDevice {
    path: PathBuf,
    mime: String,
    streaming: bool,
}

impl ImageFileDevice {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
            streaming: false,
        }
    }
}

#[async_trait]
impl CaptureDevice for ImageFileDevice {
    async fn start(&mut self) -> std::result::Result<(), DeviceError> {
        self.streaming = true;
        debug!(path = %self.path.display(), "Image file stream started");
        Ok(())
    }

    fn stop(&mut self) {
        self.streaming = false;
    }

    async fn snapshot(&mut self) -> std::result::Result<StillImage, DeviceError> {
        if !self.streaming {
            return Err(DeviceError::NotStreaming);
        }

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(DeviceError::NoFrame),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Err(DeviceError::NoFrame);
        }

        Ok(StillImage::new(self.mime.clone(), bytes))
    }
}

type SharedDevice = Arc<Mutex<Box<dyn CaptureDevice>>>;

/// Exclusive gate in front of one capture device
#[derive(Clone)]
pub struct CaptureDeviceHandle {
    device: SharedDevice,
}

impl CaptureDeviceHandle {
    pub fn new(device: impl CaptureDevice + 'static) -> Self {
        Self {
            device: Arc::new(Mutex::new(Box::new(device))),
        }
    }

    /// Take the device and start its stream.
    ///
    /// Fails with `DeviceBusy` while another surface holds the device.
    pub async fn open(&self) -> Result<CaptureSurface> {
        let mut device = self
            .device
            .clone()
            .try_lock_owned()
            .map_err(|_| CheckInError::DeviceBusy)?;

        device
            .start()
            .await
            .map_err(|e| CheckInError::CaptureUnavailable {
                reason: e.to_string(),
            })?;

        debug!("Capture surface opened");
        Ok(CaptureSurface {
            device,
            state: CaptureState::Idle,
        })
    }
}

/// Workflow state; a frame exists only in `Captured`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Captured(StillImage),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Captured(_) => "captured",
        }
    }
}

/// A frame released by `confirm`, ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedFrame {
    image: StillImage,
}

impl ConfirmedFrame {
    pub(crate) fn new(image: StillImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &StillImage {
        &self.image
    }

    pub fn into_image(self) -> StillImage {
        self.image
    }
}

/// An open capture session holding the device exclusively
pub struct CaptureSurface {
    device: OwnedMutexGuard<Box<dyn CaptureDevice>>,
    state: CaptureState,
}

impl CaptureSurface {
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn held_frame(&self) -> Option<&StillImage> {
        match &self.state {
            CaptureState::Captured(image) => Some(image),
            CaptureState::Idle => None,
        }
    }

    /// Freeze one frame from the stream. State is unchanged on failure.
    pub async fn capture(&mut self) -> Result<()> {
        if let CaptureState::Captured(_) = self.state {
            return Err(CheckInError::InvalidState {
                operation: "capture",
                state: self.state.name(),
            });
        }

        let image = self.device.snapshot().await.map_err(|e| {
            warn!(error = %e, "Capture failed");
            CheckInError::CaptureUnavailable {
                reason: e.to_string(),
            }
        })?;

        if image.is_empty() {
            return Err(CheckInError::CaptureUnavailable {
                reason: DeviceError::NoFrame.to_string(),
            });
        }

        debug!(mime = %image.mime, bytes = image.bytes.len(), "Frame captured");
        self.state = CaptureState::Captured(image);
        Ok(())
    }

    /// Drop the held frame and go back to idle; a no-op when idle
    pub fn retake(&mut self) {
        if let CaptureState::Captured(_) = self.state {
            debug!("Frame discarded for retake");
            self.state = CaptureState::Idle;
        }
    }

    /// Release the held frame to the caller and reset to idle
    pub fn confirm(&mut self) -> Result<ConfirmedFrame> {
        match std::mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::Captured(image) => {
                info!(bytes = image.bytes.len(), "Frame confirmed");
                Ok(ConfirmedFrame::new(image))
            }
            CaptureState::Idle => Err(CheckInError::InvalidState {
                operation: "confirm",
                state: "idle",
            }),
        }
    }

    /// Stop the stream and release the device. A held frame is dropped unsent.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for CaptureSurface {
    fn drop(&mut self) {
        if let CaptureState::Captured(_) = self.state {
            debug!("Capture surface closed with an unconfirmed frame; discarding it");
        }
        self.state = CaptureState::Idle;
        self.device.stop();
        debug!("Capture surface closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Device that yields numbered frames once `ready` is set
    struct FakeDevice {
        ready: Arc<AtomicBool>,
        streaming: Arc<AtomicBool>,
        frames: AtomicUsize,
    }

    impl FakeDevice {
        fn new(ready: bool) -> (Self, Arc<AtomicBool>, Arc<AtomicBool>) {
            let ready = Arc::new(AtomicBool::new(ready));
            let streaming = Arc::new(AtomicBool::new(false));
            let device = Self {
                ready: ready.clone(),
                streaming: streaming.clone(),
                frames: AtomicUsize::new(0),
            };
            (device, ready, streaming)
        }
    }

    #[async_trait]
    impl CaptureDevice for FakeDevice {
        async fn start(&mut self) -> std::result::Result<(), DeviceError> {
            self.streaming.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.streaming.store(false, Ordering::SeqCst);
        }

        async fn snapshot(&mut self) -> std::result::Result<StillImage, DeviceError> {
            if !self.ready.load(Ordering::SeqCst) {
                return Err(DeviceError::NoFrame);
            }
            let n = self.frames.fetch_add(1, Ordering::SeqCst) as u8;
            Ok(StillImage::new("image/jpeg", vec![0xFF, 0xD8, n]))
        }
    }

    fn assert_frame_matches_state(surface: &CaptureSurface) {
        match surface.state() {
            CaptureState::Captured(image) => assert!(!image.is_empty()),
            CaptureState::Idle => assert!(surface.held_frame().is_none()),
        }
    }

    #[tokio::test]
    async fn test_frame_present_iff_captured_over_any_sequence() {
        let (device, _, _) = FakeDevice::new(true);
        let handle = CaptureDeviceHandle::new(device);
        let mut surface = handle.open().await.unwrap();

        // c = capture, r = retake, f = confirm
        let script = "ccrrffcfrcrccfffrcfcrf";
        for op in script.chars() {
            match op {
                'c' => {
                    let _ = surface.capture().await;
                }
                'r' => surface.retake(),
                _ => {
                    let _ = surface.confirm();
                }
            }
            assert_frame_matches_state(&surface);
        }
    }

    #[tokio::test]
    async fn test_capture_confirm_resets_to_idle() {
        let (device, _, _) = FakeDevice::new(true);
        let mut surface = CaptureDeviceHandle::new(device).open().await.unwrap();

        assert_ok!(surface.capture().await);
        assert_eq!(surface.state().name(), "captured");

        let frame = assert_ok!(surface.confirm());
        assert_eq!(frame.image().bytes, vec![0xFF, 0xD8, 0]);
        assert_eq!(surface.state(), &CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_confirm_from_idle_is_invalid_state() {
        let (device, _, _) = FakeDevice::new(true);
        let mut surface = CaptureDeviceHandle::new(device).open().await.unwrap();

        let err = assert_err!(surface.confirm());
        assert!(matches!(err, CheckInError::InvalidState { operation: "confirm", .. }));
        assert_eq!(surface.state(), &CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_capture_twice_is_invalid_state() {
        let (device, _, _) = FakeDevice::new(true);
        let mut surface = CaptureDeviceHandle::new(device).open().await.unwrap();

        surface.capture().await.unwrap();
        let held = surface.held_frame().cloned();

        let err = assert_err!(surface.capture().await);
        assert!(matches!(err, CheckInError::InvalidState { operation: "capture", .. }));
        assert_eq!(surface.held_frame().cloned(), held);
    }

    #[tokio::test]
    async fn test_capture_before_first_frame_stays_idle() {
        let (device, ready, _) = FakeDevice::new(false);
        let mut surface = CaptureDeviceHandle::new(device).open().await.unwrap();

        let err = assert_err!(surface.capture().await);
        assert!(matches!(err, CheckInError::CaptureUnavailable { .. }));
        assert_eq!(surface.state(), &CaptureState::Idle);

        ready.store(true, Ordering::SeqCst);
        assert_ok!(surface.capture().await);
    }

    #[tokio::test]
    async fn test_retake_discards_and_is_idempotent() {
        let (device, _, _) = FakeDevice::new(true);
        let mut surface = CaptureDeviceHandle::new(device).open().await.unwrap();

        surface.retake();
        assert_eq!(surface.state(), &CaptureState::Idle);

        surface.capture().await.unwrap();
        surface.retake();
        surface.retake();
        assert!(surface.held_frame().is_none());

        surface.capture().await.unwrap();
        assert_eq!(surface.held_frame().unwrap().bytes[2], 1);
    }

    #[tokio::test]
    async fn test_device_is_exclusive_until_close() {
        let (device, _, streaming) = FakeDevice::new(true);
        let handle = CaptureDeviceHandle::new(device);

        let mut first = handle.open().await.unwrap();
        assert!(streaming.load(Ordering::SeqCst));
        assert!(matches!(handle.open().await, Err(CheckInError::DeviceBusy)));

        // Closing with a held frame drops it and frees the device.
        first.capture().await.unwrap();
        first.close();
        assert!(!streaming.load(Ordering::SeqCst));

        let second = assert_ok!(handle.open().await);
        assert!(second.held_frame().is_none());
    }

    #[tokio::test]
    async fn test_dropped_surface_stops_stream() {
        let (device, _, streaming) = FakeDevice::new(true);
        let handle = CaptureDeviceHandle::new(device);

        let mut surface = handle.open().await.unwrap();
        surface.capture().await.unwrap();
        drop(surface);

        assert!(!streaming.load(Ordering::SeqCst));
        assert_ok!(handle.open().await);
    }

    #[tokio::test]
    async fn test_cancelled_capture_stops_stream() {
        let (device, _, streaming) = FakeDevice::new(true);
        let handle = CaptureDeviceHandle::new(device);

        let pending = tokio::time::timeout(std::time::Duration::from_millis(10), async {
            let mut surface = handle.open().await.unwrap();
            surface.capture().await.unwrap();
            std::future::pending::<()>().await;
        })
        .await;

        assert!(pending.is_err());
        assert!(!streaming.load(Ordering::SeqCst));
        let surface = assert_ok!(handle.open().await);
        assert!(surface.held_frame().is_none());
    }

    #[tokio::test]
    async fn test_image_file_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let handle = CaptureDeviceHandle::new(ImageFileDevice::new(&path, "image/png"));
        let mut surface = handle.open().await.unwrap();

        // Missing file: no frame yet
        assert!(matches!(
            surface.capture().await,
            Err(CheckInError::CaptureUnavailable { .. })
        ));

        std::fs::write(&path, b"").unwrap();
        assert!(surface.capture().await.is_err());

        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        surface.capture().await.unwrap();
        let frame = surface.confirm().unwrap();
        assert_eq!(frame.image().mime, "image/png");
        assert_eq!(frame.into_image().bytes.len(), 4);
    }

    #[tokio::test]
    async fn test_image_file_device_requires_stream() {
        let mut device = ImageFileDevice::new("/nonexistent/frame.jpg", "image/jpeg");
        assert!(matches!(device.snapshot().await, Err(DeviceError::NotStreaming)));
    }
}
