//! Cooldown-gated alert dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use dogwatch_models::GateDecision;

use crate::transport::{Notification, NotificationTransport};

/// Rate-limits outbound dog alerts.
///
/// Only `DogOnly` decisions can send, and only when at least the cooldown
/// has elapsed since the last dispatch. The last-sent time advances on a
/// dispatch attempt, not on suppression, so a burst of sightings produces
/// one alert per cooldown window.
///
/// Dispatch is a detached task: the detection cycle never waits on network
/// I/O, and a failed delivery is logged and dropped (at-most-once, no
/// retries, no queueing).
pub struct NotificationThrottle {
    transport: Arc<dyn NotificationTransport>,
    cooldown: chrono::Duration,
    last_sent: Option<DateTime<Utc>>,
}

impl NotificationThrottle {
    pub fn new(transport: Arc<dyn NotificationTransport>, cooldown: Duration) -> Self {
        Self {
            transport,
            cooldown: chrono::Duration::seconds(cooldown.as_secs() as i64),
            last_sent: None,
        }
    }

    /// Dispatch an alert for `decision` if the cooldown allows it.
    ///
    /// Returns whether a send was dispatched. Must only be called from the
    /// detection loop; `last_sent` is private state of this throttle.
    pub fn maybe_notify(&mut self, decision: &GateDecision, now: DateTime<Utc>) -> bool {
        let GateDecision::DogOnly { count, confidence } = decision else {
            return false;
        };

        if let Some(last) = self.last_sent {
            if now - last < self.cooldown {
                debug!("Alert suppressed, cooldown active since {}", last);
                return false;
            }
        }

        let notification = Notification::dog_alert(*count, *confidence, now);
        let transport = Arc::clone(&self.transport);

        tokio::spawn(async move {
            if let Err(e) = transport.send(&notification).await {
                error!("Alert delivery via {} failed: {}", transport.name(), e);
            }
        });

        info!("Dispatched dog alert ({} dogs)", count);
        self.last_sent = Some(now);
        true
    }
}
