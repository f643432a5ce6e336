//! Per-frame detection types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with coordinates normalized to `[0, 1]`
/// relative to the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The whole frame.
    pub fn full_frame() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Fraction of this box that lies inside `zone`.
    ///
    /// Returns a value in `[0, 1]`; 0 when the boxes are disjoint or this
    /// box is degenerate.
    pub fn overlap_fraction(&self, zone: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(zone.x1);
        let iy1 = self.y1.max(zone.y1);
        let ix2 = self.x2.min(zone.x2);
        let iy2 = self.y2.min(zone.y2);

        if ix1 >= ix2 || iy1 >= iy2 {
            return 0.0;
        }

        let own_area = self.area();
        if own_area <= 0.0 {
            return 0.0;
        }

        ((ix2 - ix1) * (iy2 - iy1)) / own_area
    }
}

/// One classified object reported by the inference source for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label (e.g. "dog", "person").
    pub label: String,
    /// Classifier confidence in `[0, 1]`.
    pub score: f32,
    /// Location within the frame.
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            score,
            bbox,
        }
    }
}

/// Raw pixel payload of one acquisition, RGB8 row-major.
///
/// Pixels travel alongside the detections from the same capture so that a
/// saved frame can never show anything the classifier did not see.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self { width, height, rgb }
    }

    /// A uniformly filled buffer, used by synthetic sources.
    pub fn solid(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            rgb: vec![value; (width * height * 3) as usize],
        }
    }

    /// Whether the byte length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.rgb.len() == (self.width as usize) * (self.height as usize) * 3
    }
}

/// Summary of one analyzed frame, built from exactly one atomic acquisition.
///
/// Created by the analyzer, consumed by the gate and the status snapshot,
/// discarded at the end of the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// When the frame was captured.
    pub captured_at: DateTime<Utc>,
    /// Number of qualifying dog detections inside the watch zone.
    pub dog_count: u32,
    /// Highest confidence among the qualifying dog detections.
    pub max_dog_confidence: f32,
    /// Whether any qualifying human detection exists, regardless of count.
    pub human_present: bool,
}
