//! Annotation compositing and the shared latest-overlay buffer.
//!
//! The detection cycle composites each frame with its bounding boxes and
//! publishes the result here. Snapshot capture and the recorder task read
//! the most recent composite; readers receive clones and never observe a
//! half-drawn frame. This is the explicit read-most-recent contract
//! between the cycle and the capture paths.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage};
use std::sync::{Arc, Mutex};

use crate::detect::{BoundingBox, Detection};
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 220, 60]);
const BOX_THICKNESS: u32 = 2;

/// One drawn box plus its display label.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub label: String,
}

/// Display label for a detection: uppercased class and integer percent.
pub fn label_for(detection: &Detection) -> String {
    format!(
        "{} {}%",
        detection.label.to_uppercase(),
        (detection.score * 100.0).round() as u32
    )
}

/// A frame composited with its annotation overlay.
#[derive(Clone)]
pub struct ComposedFrame {
    pub image: RgbImage,
    pub annotations: Vec<Annotation>,
    pub count: u32,
    pub wall_time: DateTime<Local>,
}

/// Draw bounding boxes over a frame, producing the annotated composite.
pub fn compose(frame: &Frame, detections: &[Detection]) -> Result<ComposedFrame> {
    let mut image = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{} RGB8", frame.width, frame.height))?;

    let annotations: Vec<Annotation> = detections
        .iter()
        .map(|d| Annotation {
            bbox: d.bbox,
            label: label_for(d),
        })
        .collect();

    for annotation in &annotations {
        draw_box(&mut image, &annotation.bbox);
    }

    Ok(ComposedFrame {
        image,
        annotations,
        count: detections.len() as u32,
        wall_time: frame.wall_time,
    })
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox) {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return;
    }
    let x0 = (bbox.x.max(0.0) as u32).min(w - 1);
    let y0 = (bbox.y.max(0.0) as u32).min(h - 1);
    let x1 = ((bbox.x + bbox.width).max(0.0) as u32).min(w - 1);
    let y1 = ((bbox.y + bbox.height).max(0.0) as u32).min(h - 1);

    for t in 0..BOX_THICKNESS {
        for x in x0..=x1 {
            image.put_pixel(x, (y0 + t).min(h - 1), BOX_COLOR);
            image.put_pixel(x, y1.saturating_sub(t), BOX_COLOR);
        }
        for y in y0..=y1 {
            image.put_pixel((x0 + t).min(w - 1), y, BOX_COLOR);
            image.put_pixel(x1.saturating_sub(t), y, BOX_COLOR);
        }
    }
}

/// Shared handle to the most recent composited frame.
#[derive(Clone, Default)]
pub struct OverlayBuffer {
    latest: Arc<Mutex<Option<ComposedFrame>>>,
}

impl OverlayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, composed: ComposedFrame) {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = Some(composed);
        }
    }

    /// Clone of the most recent composite, if any frame has been published.
    pub fn latest(&self) -> Option<ComposedFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }
}
