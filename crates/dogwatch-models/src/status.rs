//! The published status snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::DetectionEvent;

/// Immutable status snapshot published once per detection cycle.
///
/// The derived booleans are computed in the constructors from the same
/// detection event, so a snapshot claiming to record while a human is
/// present cannot be built field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Whether any qualifying dog was seen this cycle.
    pub dog_detected: bool,
    /// Whether any qualifying human was seen this cycle.
    pub human_detected: bool,
    /// Evidence capture for this cycle: dogs present and no human.
    pub recording_active: bool,
    /// Human present; nothing stored or sent this cycle.
    pub privacy_mode: bool,
    /// Number of qualifying dogs this cycle.
    pub dog_count: u32,
    /// Capture time of the most recent persisted dog frame.
    pub last_dog_seen: Option<DateTime<Utc>>,
    /// When this snapshot was generated.
    #[serde(rename = "timestamp")]
    pub generated_at: DateTime<Utc>,
}

impl SystemStatus {
    /// Snapshot for one analyzed frame.
    pub fn from_event(
        event: &DetectionEvent,
        last_dog_seen: Option<DateTime<Utc>>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let dog_detected = event.dog_count > 0;
        Self {
            dog_detected,
            human_detected: event.human_present,
            recording_active: dog_detected && !event.human_present,
            privacy_mode: event.human_present,
            dog_count: event.dog_count,
            last_dog_seen,
            generated_at,
        }
    }

    /// Snapshot for a cycle that produced no usable frame (acquisition
    /// failure or timeout). Equivalent to an idle observation.
    pub fn idle(last_dog_seen: Option<DateTime<Utc>>, generated_at: DateTime<Utc>) -> Self {
        Self {
            dog_detected: false,
            human_detected: false,
            recording_active: false,
            privacy_mode: false,
            dog_count: 0,
            last_dog_seen,
            generated_at,
        }
    }

    /// Snapshot published before the first cycle completes.
    pub fn startup(generated_at: DateTime<Utc>) -> Self {
        Self::idle(None, generated_at)
    }
}
