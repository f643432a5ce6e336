//! Notification transport trait and the ntfy.sh implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use dogwatch_models::display_time;

use crate::error::{NotifyError, NotifyResult};

/// Delivery priority, mapped to the transport's own priority scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Default,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
        }
    }
}

/// Logical channel a notification rides on.
///
/// Alerts and heartbeats use separate topics so health monitoring keeps
/// working when the alert channel is noisy or muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Alert,
    Health,
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub channel: Channel,
}

impl Notification {
    /// Alert for a dog sighting.
    pub fn dog_alert(count: u32, confidence: f32, at: DateTime<Utc>) -> Self {
        let dogs_word = if count == 1 { "dog" } else { "dogs" };
        Self {
            title: "Dog alert".to_string(),
            body: format!(
                "{count} {dogs_word} detected at {} ({:.0}% confidence)",
                display_time(at),
                confidence * 100.0
            ),
            priority: Priority::Default,
            tags: vec!["dog".to_string()],
            channel: Channel::Alert,
        }
    }

    /// Low-priority liveness ping.
    pub fn heartbeat(at: DateTime<Utc>) -> Self {
        Self {
            title: "DogWatch heartbeat".to_string(),
            body: format!("DogWatch running as of {}", display_time(at)),
            priority: Priority::Low,
            tags: vec!["heartbeat".to_string()],
            channel: Channel::Health,
        }
    }
}

/// Best-effort, at-most-once delivery of notifications.
///
/// Implementations deliver asynchronously and do not retry; a failed send
/// is the caller's to log and drop.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> NotifyResult<()>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}

/// ntfy.sh transport: one POST per notification, message text as the body,
/// metadata in headers.
pub struct NtfyTransport {
    client: reqwest::Client,
    server: String,
    alert_topic: String,
    health_topic: String,
}

impl NtfyTransport {
    pub fn new(
        server: impl Into<String>,
        alert_topic: impl Into<String>,
        health_topic: impl Into<String>,
    ) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            server: server.into().trim_end_matches('/').to_string(),
            alert_topic: alert_topic.into(),
            health_topic: health_topic.into(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> NotifyResult<Self> {
        let server =
            std::env::var("NTFY_SERVER").unwrap_or_else(|_| "https://ntfy.sh".to_string());
        let alert_topic = std::env::var("NTFY_TOPIC")
            .map_err(|_| NotifyError::config_error("NTFY_TOPIC not set"))?;
        let health_topic = std::env::var("NTFY_HEALTH_TOPIC")
            .map_err(|_| NotifyError::config_error("NTFY_HEALTH_TOPIC not set"))?;

        Self::new(server, alert_topic, health_topic)
    }

    fn topic(&self, channel: Channel) -> &str {
        match channel {
            Channel::Alert => &self.alert_topic,
            Channel::Health => &self.health_topic,
        }
    }
}

#[async_trait]
impl NotificationTransport for NtfyTransport {
    async fn send(&self, notification: &Notification) -> NotifyResult<()> {
        let url = format!("{}/{}", self.server, self.topic(notification.channel));

        let response = self
            .client
            .post(&url)
            .header("Title", &notification.title)
            .header("Priority", notification.priority.as_str())
            .header("Tags", notification.tags.join(","))
            .body(notification.body.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        debug!("Delivered notification to {}", url);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ntfy"
    }
}
