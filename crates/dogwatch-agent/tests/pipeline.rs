//! End-to-end pipeline tests: scripted source through analyzer, gate,
//! store, throttle and status publisher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::watch;

use dogwatch_agent::{AgentConfig, AgentError, CapturedFrame, DetectionLoop, ScriptedSource};
use dogwatch_models::{BoundingBox, Detection, FrameBuffer, GateDecision};
use dogwatch_notify::{Notification, NotificationThrottle, NotificationTransport, NotifyResult};
use dogwatch_storage::{FrameStore, StatusPublisher};

struct RecordingTransport {
    sent: AtomicUsize,
    bodies: Mutex<Vec<String>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(&self, notification: &Notification) -> NotifyResult<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(notification.body.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct Harness {
    detection: DetectionLoop,
    frames: Arc<FrameStore>,
    status: Arc<StatusPublisher>,
    transport: Arc<RecordingTransport>,
    _workdir: tempfile::TempDir,
}

async fn harness(config_overrides: impl FnOnce(&mut AgentConfig), frames: Vec<CapturedFrame>) -> Harness {
    let workdir = tempfile::tempdir().unwrap();

    let mut config = AgentConfig::default();
    config.frame_dir = workdir.path().join("frames").display().to_string();
    config.status_file = workdir.path().join("status.json").display().to_string();
    config_overrides(&mut config);

    let store = Arc::new(
        FrameStore::open(&config.frame_dir, config.frame_capacity, config.jpeg_quality)
            .await
            .unwrap(),
    );
    let status = Arc::new(StatusPublisher::open(&config.status_file).await);
    let transport = RecordingTransport::new();
    let throttle =
        NotificationThrottle::new(Arc::clone(&transport) as Arc<dyn NotificationTransport>, config.notify_cooldown);

    let detection = DetectionLoop::new(
        config,
        Box::new(ScriptedSource::new(frames)),
        Arc::clone(&store),
        Arc::clone(&status),
        throttle,
        None,
    );

    Harness {
        detection,
        frames: store,
        status,
        transport,
        _workdir: workdir,
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 14, 12, 0, 0).unwrap()
}

fn dog(score: f32) -> Detection {
    Detection::new("dog", score, BoundingBox::new(0.2, 0.2, 0.6, 0.6))
}

fn person(score: f32) -> Detection {
    Detection::new("person", score, BoundingBox::new(0.5, 0.1, 0.9, 0.9))
}

async fn settle() {
    // Alert dispatch is a detached task; let it run before counting.
    tokio::time::sleep(StdDuration::from_millis(20)).await;
}

/// A qualifying dog and a qualifying human in the same frame: the human
/// wins, nothing is persisted or sent, and the status reports privacy
/// mode.
#[tokio::test]
async fn test_human_precedence_over_dog() {
    let t0 = base_time();
    let mut h = harness(
        |_| {},
        vec![CapturedFrame::synthetic(t0, vec![dog(0.9), person(0.35)])],
    )
    .await;

    let decision = h.detection.run_cycle(t0).await.unwrap();
    assert_eq!(decision, GateDecision::HumanPresent);

    settle().await;
    assert_eq!(h.frames.count().await.unwrap(), 0);
    assert_eq!(h.transport.sent(), 0);

    let status = h.status.current().await;
    assert!(status.privacy_mode);
    assert!(status.human_detected);
    assert!(!status.recording_active);
    assert!(status.dog_detected);
    assert_eq!(status.last_dog_seen, None);
}

/// The privacy invariant holds for every dog count, including zero.
#[tokio::test]
async fn test_no_evidence_for_any_human_frame() {
    let t0 = base_time();
    let mut script = Vec::new();
    for n in 0..4u32 {
        let mut detections = vec![person(0.95)];
        for _ in 0..n {
            detections.push(dog(0.99));
        }
        script.push(CapturedFrame::synthetic(t0 + Duration::seconds(n as i64), detections));
    }

    let mut h = harness(|_| {}, script).await;
    for n in 0..4 {
        let decision = h
            .detection
            .run_cycle(t0 + Duration::seconds(n))
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::HumanPresent);
    }

    settle().await;
    assert_eq!(h.frames.count().await.unwrap(), 0);
    assert_eq!(h.transport.sent(), 0);
}

/// Cooldown scenario: alert at t=0, suppressed at t=30 (frame still
/// saved), alert again at t=61.
#[tokio::test]
async fn test_notification_cooldown_across_cycles() {
    let t0 = base_time();
    let mut h = harness(
        |config| config.notify_cooldown = StdDuration::from_secs(60),
        vec![
            CapturedFrame::synthetic(t0, vec![dog(0.90)]),
            CapturedFrame::synthetic(t0 + Duration::seconds(30), vec![dog(0.80)]),
            CapturedFrame::synthetic(t0 + Duration::seconds(61), vec![dog(0.70)]),
        ],
    )
    .await;

    h.detection.run_cycle(t0).await.unwrap();
    settle().await;
    assert_eq!(h.transport.sent(), 1);

    h.detection
        .run_cycle(t0 + Duration::seconds(30))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.transport.sent(), 1, "send inside cooldown window");
    assert_eq!(h.frames.count().await.unwrap(), 2, "suppression still saves the frame");

    h.detection
        .run_cycle(t0 + Duration::seconds(61))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.transport.sent(), 2);

    let status = h.status.current().await;
    assert_eq!(status.last_dog_seen, Some(t0 + Duration::seconds(61)));
}

/// Retention scenario: 15 dog cycles against capacity 10 leave exactly
/// the 10 most recent frames.
#[tokio::test]
async fn test_frame_retention_bound_through_loop() {
    let t0 = base_time();
    let script = (0..15)
        .map(|i| CapturedFrame::synthetic(t0 + Duration::seconds(i), vec![dog(0.9)]))
        .collect();

    let mut h = harness(
        |config| {
            config.frame_capacity = 10;
            config.notify_cooldown = StdDuration::from_secs(3600);
        },
        script,
    )
    .await;

    for i in 0..15 {
        h.detection
            .run_cycle(t0 + Duration::seconds(i))
            .await
            .unwrap();
    }

    let listed = h.frames.list(100).await.unwrap();
    assert_eq!(listed.len(), 10);
    assert_eq!(listed[0].captured_at, t0 + Duration::seconds(14));
    assert_eq!(listed[9].captured_at, t0 + Duration::seconds(5));
}

/// A failed acquisition is an idle-equivalent cycle: the loop survives
/// and still publishes a snapshot that keeps the last sighting.
#[tokio::test]
async fn test_acquisition_failure_publishes_idle_status() {
    let t0 = base_time();
    let mut h = harness(
        |_| {},
        vec![CapturedFrame::synthetic(t0, vec![dog(0.9)])],
    )
    .await;

    h.detection.run_cycle(t0).await.unwrap();

    // Script exhausted: the source now fails every acquire.
    let decision = h
        .detection
        .run_cycle(t0 + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(decision, GateDecision::Idle);

    let status = h.status.current().await;
    assert!(!status.dog_detected);
    assert_eq!(status.last_dog_seen, Some(t0));
    assert_eq!(status.generated_at, t0 + Duration::seconds(1));
}

/// Persistently failing frame writes become fatal after the configured
/// number of consecutive failures.
#[tokio::test]
async fn test_repeated_write_failures_are_fatal() {
    let t0 = base_time();
    let broken = |at: DateTime<Utc>| CapturedFrame {
        captured_at: at,
        detections: vec![dog(0.9)],
        pixels: FrameBuffer::new(640, 480, vec![0; 3]),
    };

    let mut h = harness(
        |config| config.max_write_failures = 2,
        vec![broken(t0), broken(t0 + Duration::seconds(1))],
    )
    .await;

    // First failure is tolerated.
    h.detection.run_cycle(t0).await.unwrap();

    let err = h
        .detection
        .run_cycle(t0 + Duration::seconds(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::FrameWritesExhausted(2)));
}

/// A successful write resets the consecutive-failure budget.
#[tokio::test]
async fn test_write_failure_budget_resets_on_success() {
    let t0 = base_time();
    let broken = |at: DateTime<Utc>| CapturedFrame {
        captured_at: at,
        detections: vec![dog(0.9)],
        pixels: FrameBuffer::new(640, 480, vec![0; 3]),
    };

    let mut h = harness(
        |config| config.max_write_failures = 2,
        vec![
            broken(t0),
            CapturedFrame::synthetic(t0 + Duration::seconds(1), vec![dog(0.9)]),
            broken(t0 + Duration::seconds(2)),
        ],
    )
    .await;

    h.detection.run_cycle(t0).await.unwrap();
    h.detection
        .run_cycle(t0 + Duration::seconds(1))
        .await
        .unwrap();
    // Back to one consecutive failure, not two.
    h.detection
        .run_cycle(t0 + Duration::seconds(2))
        .await
        .unwrap();
}

/// The loop runs on its cadence and stops on the shutdown signal.
#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let t0 = base_time();
    let script = (0..3)
        .map(|i| CapturedFrame::synthetic(t0 + Duration::seconds(i), vec![dog(0.9)]))
        .collect();

    let mut h = harness(
        |config| config.capture_interval = StdDuration::from_millis(10),
        script,
    )
    .await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let store = Arc::clone(&h.frames);

    let task = tokio::spawn(async move { h.detection.run(shutdown_rx).await });

    tokio::time::sleep(StdDuration::from_millis(300)).await;
    shutdown_tx.send(true).unwrap();

    task.await.unwrap().unwrap();
    // All three scripted dog frames made it through before the script ran
    // dry; later cycles were idle-equivalent failures, not fatal.
    assert_eq!(store.count().await.unwrap(), 3);
}
