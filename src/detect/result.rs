/// Axis-aligned box in frame pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One detected object in one frame. Produced and consumed within a single
/// detection cycle; never persisted.
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Class label as reported by the backend (e.g. "person").
    pub label: String,
    /// Confidence score in [0, 1].
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}
