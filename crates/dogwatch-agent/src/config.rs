//! Agent configuration.

use std::time::Duration;

use dogwatch_models::BoundingBox;

/// Agent configuration.
///
/// Every knob has a default and an environment override, so deployments
/// tune thresholds and cadence without code changes. The human threshold
/// defaults below the dog threshold on purpose: a borderline person
/// sighting must suppress capture even at the cost of missing a dog frame.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Label the classifier uses for dogs
    pub dog_label: String,
    /// Label the classifier uses for humans
    pub human_label: String,
    /// Minimum confidence for a dog detection to count
    pub dog_threshold: f32,
    /// Minimum confidence for a human detection to count
    pub human_threshold: f32,
    /// Time between detection cycles
    pub capture_interval: Duration,
    /// Bound on one blocking sensor acquisition
    pub acquire_timeout: Duration,
    /// Minimum time between two outbound dog alerts
    pub notify_cooldown: Duration,
    /// Rolling bound on retained dog frames
    pub frame_capacity: usize,
    /// JPEG quality for persisted frames
    pub jpeg_quality: u8,
    /// Time between health heartbeats
    pub heartbeat_interval: Duration,
    /// Only dogs overlapping this zone count (full frame = disabled)
    pub watch_zone: BoundingBox,
    /// Fraction of a dog box that must overlap the watch zone
    pub zone_overlap_threshold: f32,
    /// Consecutive frame write failures before the loop gives up
    pub max_write_failures: u32,
    /// Directory for retained frames
    pub frame_dir: String,
    /// Path of the persisted status snapshot
    pub status_file: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            dog_label: "dog".to_string(),
            human_label: "person".to_string(),
            dog_threshold: 0.50,
            human_threshold: 0.30,
            capture_interval: Duration::from_millis(1000),
            acquire_timeout: Duration::from_secs(5),
            notify_cooldown: Duration::from_secs(60),
            frame_capacity: 10,
            jpeg_quality: 75,
            heartbeat_interval: Duration::from_secs(1800),
            watch_zone: BoundingBox::full_frame(),
            zone_overlap_threshold: 0.5,
            max_write_failures: 5,
            frame_dir: "./frames".to_string(),
            status_file: "./status.json".to_string(),
        }
    }
}

impl AgentConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dog_label: std::env::var("DOGWATCH_DOG_LABEL").unwrap_or(defaults.dog_label),
            human_label: std::env::var("DOGWATCH_HUMAN_LABEL").unwrap_or(defaults.human_label),
            dog_threshold: env_parsed("DOGWATCH_DOG_THRESHOLD", defaults.dog_threshold),
            human_threshold: env_parsed("DOGWATCH_HUMAN_THRESHOLD", defaults.human_threshold),
            capture_interval: Duration::from_millis(env_parsed(
                "DOGWATCH_CAPTURE_INTERVAL_MS",
                1000,
            )),
            acquire_timeout: Duration::from_secs(env_parsed("DOGWATCH_ACQUIRE_TIMEOUT_SECS", 5)),
            notify_cooldown: Duration::from_secs(env_parsed("DOGWATCH_NOTIFY_COOLDOWN_SECS", 60)),
            frame_capacity: env_parsed("DOGWATCH_MAX_KEPT_FRAMES", defaults.frame_capacity),
            jpeg_quality: env_parsed("DOGWATCH_JPEG_QUALITY", defaults.jpeg_quality),
            heartbeat_interval: Duration::from_secs(env_parsed(
                "DOGWATCH_HEARTBEAT_INTERVAL_SECS",
                1800,
            )),
            watch_zone: std::env::var("DOGWATCH_WATCH_ZONE")
                .ok()
                .and_then(|s| parse_zone(&s))
                .unwrap_or(defaults.watch_zone),
            zone_overlap_threshold: env_parsed(
                "DOGWATCH_ZONE_OVERLAP",
                defaults.zone_overlap_threshold,
            ),
            max_write_failures: env_parsed(
                "DOGWATCH_MAX_WRITE_FAILURES",
                defaults.max_write_failures,
            ),
            frame_dir: std::env::var("DOGWATCH_FRAME_DIR").unwrap_or(defaults.frame_dir),
            status_file: std::env::var("DOGWATCH_STATUS_FILE").unwrap_or(defaults.status_file),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse a zone given as `x1,y1,x2,y2` in normalized coordinates.
fn parse_zone(s: &str) -> Option<BoundingBox> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    if parts.len() != 4 {
        return None;
    }
    Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}
