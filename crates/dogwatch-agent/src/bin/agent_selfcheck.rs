//! Pipeline self-check: runs a scripted scenario through the full
//! detection pipeline against a temporary directory and verifies the
//! privacy and retention invariants hold.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use dogwatch_agent::{AgentConfig, CapturedFrame, DetectionLoop, ScriptedSource};
use dogwatch_models::{BoundingBox, Detection, GateDecision};
use dogwatch_notify::{Notification, NotificationThrottle, NotificationTransport, NotifyResult};
use dogwatch_storage::{FrameStore, StatusPublisher};

struct StdoutTransport;

#[async_trait]
impl NotificationTransport for StdoutTransport {
    async fn send(&self, notification: &Notification) -> NotifyResult<()> {
        println!("agent-selfcheck: would send {:?}", notification.body);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let workdir = tempfile::tempdir()?;
    println!(
        "agent-selfcheck: starting in {}",
        workdir.path().display()
    );

    let config = AgentConfig {
        frame_dir: workdir.path().join("frames").display().to_string(),
        status_file: workdir.path().join("status.json").display().to_string(),
        ..AgentConfig::default()
    };

    let base = Utc::now();
    let dog = Detection::new("dog", 0.9, BoundingBox::new(0.2, 0.2, 0.6, 0.6));
    let person = Detection::new("person", 0.4, BoundingBox::new(0.5, 0.1, 0.9, 0.9));

    let source = ScriptedSource::new(vec![
        CapturedFrame::synthetic(base, vec![dog.clone()]),
        CapturedFrame::synthetic(base + Duration::seconds(1), vec![dog, person]),
        CapturedFrame::synthetic(base + Duration::seconds(2), vec![]),
    ]);

    let frames = Arc::new(
        FrameStore::open(&config.frame_dir, config.frame_capacity, config.jpeg_quality).await?,
    );
    let status = Arc::new(StatusPublisher::open(&config.status_file).await);
    let throttle = NotificationThrottle::new(Arc::new(StdoutTransport), config.notify_cooldown);

    let mut detection = DetectionLoop::new(
        config,
        Box::new(source),
        Arc::clone(&frames),
        Arc::clone(&status),
        throttle,
        None,
    );

    let decisions = [
        detection.run_cycle(base).await?,
        detection.run_cycle(base + Duration::seconds(1)).await?,
        detection.run_cycle(base + Duration::seconds(2)).await?,
    ];

    anyhow::ensure!(
        matches!(decisions[0], GateDecision::DogOnly { .. }),
        "expected a dog-only first cycle, got {:?}",
        decisions[0]
    );
    anyhow::ensure!(
        decisions[1] == GateDecision::HumanPresent,
        "expected human precedence on the second cycle, got {:?}",
        decisions[1]
    );
    anyhow::ensure!(
        decisions[2] == GateDecision::Idle,
        "expected an idle third cycle, got {:?}",
        decisions[2]
    );

    let kept = frames.count().await?;
    anyhow::ensure!(kept == 1, "expected exactly 1 retained frame, found {kept}");

    let snapshot = status.current().await;
    println!(
        "agent-selfcheck: final status {}",
        serde_json::to_string_pretty(&snapshot)?
    );

    println!("agent-selfcheck: ok");
    Ok(())
}
