//! The privacy gate.
//!
//! Maps a detection event to the single decision the rest of the cycle
//! branches on. Human presence always wins over any number of simultaneous
//! dogs, so a frame containing a person can never be persisted or trigger
//! an alert. The decision is an exhaustive enum rather than a pair of
//! booleans: there is no representable state that both saves a frame and
//! reports a person.

use crate::detection::DetectionEvent;

/// Outcome of gating one detection event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Nothing qualifying in the frame.
    Idle,
    /// One or more dogs, no human. The only decision that permits
    /// persisting evidence and notifying.
    DogOnly { count: u32, confidence: f32 },
    /// A human is present (alone or alongside dogs). Nothing is stored
    /// or sent.
    HumanPresent,
}

impl GateDecision {
    /// Gate one event. Pure: no I/O, no side effects.
    pub fn evaluate(event: &DetectionEvent) -> Self {
        if event.human_present {
            return GateDecision::HumanPresent;
        }
        if event.dog_count > 0 {
            return GateDecision::DogOnly {
                count: event.dog_count,
                confidence: event.max_dog_confidence,
            };
        }
        GateDecision::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(dog_count: u32, max_dog_confidence: f32, human_present: bool) -> DetectionEvent {
        DetectionEvent {
            captured_at: Utc::now(),
            dog_count,
            max_dog_confidence,
            human_present,
        }
    }

    #[test]
    fn test_empty_frame_is_idle() {
        assert_eq!(GateDecision::evaluate(&event(0, 0.0, false)), GateDecision::Idle);
    }

    #[test]
    fn test_dogs_without_human() {
        assert_eq!(
            GateDecision::evaluate(&event(2, 0.91, false)),
            GateDecision::DogOnly {
                count: 2,
                confidence: 0.91
            }
        );
    }

    #[test]
    fn test_human_alone_wins() {
        assert_eq!(
            GateDecision::evaluate(&event(0, 0.0, true)),
            GateDecision::HumanPresent
        );
    }

    #[test]
    fn test_human_wins_over_dogs() {
        // Precedence is absolute regardless of dog count or confidence.
        for dogs in [1, 3, 10] {
            assert_eq!(
                GateDecision::evaluate(&event(dogs, 0.99, true)),
                GateDecision::HumanPresent
            );
        }
    }
}
