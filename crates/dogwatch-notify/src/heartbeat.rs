//! Periodic liveness heartbeat.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

use crate::transport::{Notification, NotificationTransport};

/// Sends a low-priority liveness notification on its own schedule,
/// decoupled from the detection cadence and from the alert channel.
///
/// Runs indefinitely as a spawned task until the shutdown signal flips.
pub struct HealthHeartbeat {
    transport: Arc<dyn NotificationTransport>,
    interval: Duration,
}

impl HealthHeartbeat {
    pub fn new(transport: Arc<dyn NotificationTransport>, interval: Duration) -> Self {
        Self { transport, interval }
    }

    /// Send one heartbeat immediately.
    pub async fn beat_now(&self) {
        match self.transport.send(&Notification::heartbeat(Utc::now())).await {
            Ok(()) => info!("Health heartbeat sent"),
            Err(e) => error!("Heartbeat delivery via {} failed: {}", self.transport.name(), e),
        }
    }

    /// Send a startup heartbeat, then one per interval until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting health heartbeat (interval: {:?})", self.interval);
        self.beat_now().await;

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Health heartbeat stopped");
                        return;
                    }
                }
                _ = ticker.tick() => {
                    self.beat_now().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyResult;
    use crate::transport::Channel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationTransport for CountingTransport {
        async fn send(&self, notification: &Notification) -> NotifyResult<()> {
            assert_eq!(notification.channel, Channel::Health);
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_beat_now_sends_on_health_channel() {
        let transport = Arc::new(CountingTransport {
            sent: AtomicUsize::new(0),
        });
        let heartbeat =
            HealthHeartbeat::new(Arc::clone(&transport) as Arc<dyn NotificationTransport>, Duration::from_secs(1800));

        heartbeat.beat_now().await;
        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_beats_on_schedule_and_stops() {
        let transport = Arc::new(CountingTransport {
            sent: AtomicUsize::new(0),
        });
        let heartbeat =
            HealthHeartbeat::new(Arc::clone(&transport) as Arc<dyn NotificationTransport>, Duration::from_secs(60));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(heartbeat.run(shutdown_rx));

        // Startup beat plus two scheduled ticks.
        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(transport.sent.load(Ordering::SeqCst), 3);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
