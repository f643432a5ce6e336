//! Outbound notifications for the DogWatch agent.
//!
//! This crate provides:
//! - The `NotificationTransport` trait and the ntfy.sh implementation
//! - `NotificationThrottle`: cooldown-gated, fire-and-forget alert dispatch
//! - `HealthHeartbeat`: periodic liveness pings on a separate channel

pub mod error;
pub mod heartbeat;
pub mod throttle;
pub mod transport;

pub use error::{NotifyError, NotifyResult};
pub use heartbeat::HealthHeartbeat;
pub use throttle::NotificationThrottle;
pub use transport::{Channel, Notification, NotificationTransport, NtfyTransport, Priority};
