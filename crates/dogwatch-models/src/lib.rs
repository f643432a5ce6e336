//! Shared data models for the DogWatch agent.
//!
//! This crate provides the types that flow through one detection cycle:
//! - Per-frame detections and the derived detection event
//! - The privacy gate decision
//! - The published status snapshot
//! - Frame record naming and parsing

pub mod detection;
pub mod frame;
pub mod gate;
pub mod status;

// Re-export common types
pub use detection::{BoundingBox, Detection, DetectionEvent, FrameBuffer};
pub use frame::{display_time, frame_file_name, parse_frame_time, FrameRecord};
pub use gate::GateDecision;
pub use status::SystemStatus;
