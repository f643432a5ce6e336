//! The detection loop driver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use dogwatch_models::{GateDecision, SystemStatus};
use dogwatch_notify::NotificationThrottle;
use dogwatch_storage::{FrameStore, StatusPublisher};

use crate::analyzer::DetectionAnalyzer;
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::source::InferenceSource;

/// Runs the acquire → analyze → gate → act pipeline, one cycle per tick.
///
/// This is the only writer of the frame store, the throttle state and
/// `last_dog_seen`; the serving side reads through the snapshot publisher
/// and the store's listing. Each cycle ends with a status publish, whatever
/// the decision was, so the snapshot's age never exceeds one interval
/// while the loop is healthy.
pub struct DetectionLoop {
    config: AgentConfig,
    source: Box<dyn InferenceSource>,
    analyzer: DetectionAnalyzer,
    frames: Arc<FrameStore>,
    status: Arc<StatusPublisher>,
    throttle: NotificationThrottle,
    last_dog_seen: Option<DateTime<Utc>>,
    write_failures: u32,
}

impl DetectionLoop {
    pub fn new(
        config: AgentConfig,
        source: Box<dyn InferenceSource>,
        frames: Arc<FrameStore>,
        status: Arc<StatusPublisher>,
        throttle: NotificationThrottle,
        last_dog_seen: Option<DateTime<Utc>>,
    ) -> Self {
        let analyzer = DetectionAnalyzer::new(&config);
        Self {
            config,
            source,
            analyzer,
            frames,
            status,
            throttle,
            last_dog_seen,
            write_failures: 0,
        }
    }

    /// Run cycles until the shutdown signal flips or a fatal error occurs.
    ///
    /// Shutdown is observed between cycles only; an in-flight cycle always
    /// runs to completion.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> AgentResult<()> {
        info!(
            "Detection loop running (source: {}, interval: {:?})",
            self.source.name(),
            self.config.capture_interval
        );

        let mut ticker = interval(self.config.capture_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signal received, stopping detection loop");
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {
                    self.run_cycle(Utc::now()).await?;
                }
            }
        }
    }

    /// Run one cycle at `now`. Transient failures are absorbed here and
    /// surface only in the logs; the returned error is fatal.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> AgentResult<GateDecision> {
        let acquired = match timeout(self.config.acquire_timeout, self.source.acquire()).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::SourceTimeout(self.config.acquire_timeout)),
        };

        let frame = match acquired {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame acquisition failed: {}", e);
                self.publish_idle(now).await;
                return Ok(GateDecision::Idle);
            }
        };

        let event = self.analyzer.analyze(&frame);
        let decision = GateDecision::evaluate(&event);

        match decision {
            GateDecision::HumanPresent => {
                // Privacy mode: the frame is dropped with the cycle, and
                // nothing downstream of the gate can see its pixels.
                debug!("Human detected, frame discarded");
            }
            GateDecision::DogOnly { count, confidence } => {
                match self.frames.insert(&frame.pixels, event.captured_at).await {
                    Ok(record) => {
                        self.write_failures = 0;
                        self.last_dog_seen = Some(event.captured_at);
                        info!(
                            "{} {} detected ({:.0}% confidence), frame saved: {}",
                            count,
                            if count == 1 { "dog" } else { "dogs" },
                            confidence * 100.0,
                            record.name
                        );
                    }
                    Err(e) => {
                        self.write_failures += 1;
                        error!(
                            "Frame persistence failed ({} consecutive): {}",
                            self.write_failures, e
                        );
                        if self.write_failures >= self.config.max_write_failures {
                            return Err(AgentError::FrameWritesExhausted(self.write_failures));
                        }
                    }
                }

                self.throttle.maybe_notify(&decision, now);
            }
            GateDecision::Idle => {}
        }

        let status = SystemStatus::from_event(&event, self.last_dog_seen, now);
        if let Err(e) = self.status.publish(status).await {
            warn!("Status persistence failed: {}", e);
        }

        Ok(decision)
    }

    /// Publish an idle-equivalent snapshot for a cycle that produced no
    /// usable frame.
    async fn publish_idle(&self, now: DateTime<Utc>) {
        let status = SystemStatus::idle(self.last_dog_seen, now);
        if let Err(e) = self.status.publish(status).await {
            warn!("Status persistence failed: {}", e);
        }
    }
}
