//! On-disk state for the DogWatch agent.
//!
//! This crate provides:
//! - `FrameStore`: bounded, time-ordered retention of evidence JPEGs
//! - `StatusPublisher`: the single current status snapshot, safe for
//!   concurrent readers, mirrored to a durable JSON file

pub mod error;
pub mod frame_store;
pub mod status_publisher;

pub use error::{StorageError, StorageResult};
pub use frame_store::FrameStore;
pub use status_publisher::StatusPublisher;
