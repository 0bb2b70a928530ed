use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// Backends wrap an external vision model. The session treats a backend as
/// an opaque capability: given a frame, it produces a list of detections.
/// Model loading, accuracy, and inference latency are the backend's
/// concern; a single `detect` call may fail transiently without ending the
/// session.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true once the model is loaded and usable. A session cannot
    /// start while the backend reports not ready.
    fn ready(&self) -> bool;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
