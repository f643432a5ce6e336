//! Turns one raw acquisition into a detection event.

use tracing::debug;

use dogwatch_models::{BoundingBox, DetectionEvent};

use crate::config::AgentConfig;
use crate::source::CapturedFrame;

/// Classifies one captured frame against the configured labels and
/// thresholds.
///
/// A detection counts when `score >= threshold` (inclusive). Dogs
/// additionally have to overlap the watch zone; humans count anywhere in
/// the frame, since the privacy rule cares about presence, not position.
pub struct DetectionAnalyzer {
    dog_label: String,
    human_label: String,
    dog_threshold: f32,
    human_threshold: f32,
    watch_zone: BoundingBox,
    zone_overlap_threshold: f32,
}

impl DetectionAnalyzer {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            dog_label: config.dog_label.clone(),
            human_label: config.human_label.clone(),
            dog_threshold: config.dog_threshold,
            human_threshold: config.human_threshold,
            watch_zone: config.watch_zone,
            zone_overlap_threshold: config.zone_overlap_threshold,
        }
    }

    /// Summarize one frame. Every qualifying dog counts independently;
    /// one qualifying human is enough to flag presence.
    pub fn analyze(&self, frame: &CapturedFrame) -> DetectionEvent {
        let mut dog_count = 0u32;
        let mut max_dog_confidence = 0.0f32;
        let mut human_present = false;

        for detection in &frame.detections {
            debug!(
                "Detection: label={:?} score={:.2}",
                detection.label, detection.score
            );

            if detection.label == self.human_label && detection.score >= self.human_threshold {
                human_present = true;
            }

            if detection.label == self.dog_label && detection.score >= self.dog_threshold {
                let overlap = detection.bbox.overlap_fraction(&self.watch_zone);
                if overlap >= self.zone_overlap_threshold {
                    dog_count += 1;
                    max_dog_confidence = max_dog_confidence.max(detection.score);
                }
            }
        }

        DetectionEvent {
            captured_at: frame.captured_at,
            dog_count,
            max_dog_confidence,
            human_present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dogwatch_models::Detection;

    fn analyzer() -> DetectionAnalyzer {
        DetectionAnalyzer::new(&AgentConfig::default())
    }

    fn frame(detections: Vec<Detection>) -> CapturedFrame {
        CapturedFrame::synthetic(Utc::now(), detections)
    }

    fn dog(score: f32) -> Detection {
        Detection::new("dog", score, BoundingBox::new(0.2, 0.2, 0.6, 0.6))
    }

    fn person(score: f32) -> Detection {
        Detection::new("person", score, BoundingBox::new(0.5, 0.1, 0.9, 0.9))
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let event = analyzer().analyze(&frame(vec![dog(0.50)]));
        assert_eq!(event.dog_count, 1);

        let event = analyzer().analyze(&frame(vec![dog(0.499)]));
        assert_eq!(event.dog_count, 0);
    }

    #[test]
    fn test_every_qualifying_dog_counts() {
        let event = analyzer().analyze(&frame(vec![dog(0.6), dog(0.9), dog(0.51), dog(0.2)]));
        assert_eq!(event.dog_count, 3);
        assert!((event.max_dog_confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_asymmetric_thresholds() {
        // 0.35 is below the dog threshold but above the human one: the
        // same confidence that would not count as a dog still suppresses.
        let event = analyzer().analyze(&frame(vec![dog(0.35), person(0.35)]));
        assert_eq!(event.dog_count, 0);
        assert!(event.human_present);
    }

    #[test]
    fn test_human_presence_ignores_count_and_position() {
        let far_corner = Detection::new("person", 0.31, BoundingBox::new(0.95, 0.95, 1.0, 1.0));
        let event = analyzer().analyze(&frame(vec![far_corner]));
        assert!(event.human_present);
    }

    #[test]
    fn test_unrelated_labels_are_ignored() {
        let cat = Detection::new("cat", 0.99, BoundingBox::new(0.2, 0.2, 0.6, 0.6));
        let event = analyzer().analyze(&frame(vec![cat]));
        assert_eq!(event.dog_count, 0);
        assert!(!event.human_present);
    }

    #[test]
    fn test_watch_zone_filters_dogs() {
        let mut config = AgentConfig::default();
        config.watch_zone = BoundingBox::new(0.0, 0.0, 0.5, 1.0);
        let analyzer = DetectionAnalyzer::new(&config);

        let inside = Detection::new("dog", 0.9, BoundingBox::new(0.1, 0.1, 0.4, 0.4));
        let outside = Detection::new("dog", 0.9, BoundingBox::new(0.6, 0.1, 0.9, 0.4));

        let event = analyzer.analyze(&frame(vec![inside, outside]));
        assert_eq!(event.dog_count, 1);
    }

    #[test]
    fn test_empty_frame() {
        let event = analyzer().analyze(&frame(Vec::new()));
        assert_eq!(event.dog_count, 0);
        assert_eq!(event.max_dog_confidence, 0.0);
        assert!(!event.human_present);
    }
}
