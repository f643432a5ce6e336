//! The inference source seam.
//!
//! The camera and its on-chip accelerator live behind `InferenceSource`.
//! One `acquire` call yields detections and pixels from the same capture;
//! the loop never pairs metadata from one frame with pixels from another,
//! which is what keeps a person walking into view between two calls from
//! leaking into a saved frame.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use dogwatch_models::{BoundingBox, Detection, FrameBuffer};

use crate::error::{AgentError, AgentResult};

const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

/// One atomic acquisition: detections plus the pixels they were computed
/// from.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub captured_at: DateTime<Utc>,
    pub detections: Vec<Detection>,
    pub pixels: FrameBuffer,
}

impl CapturedFrame {
    /// A frame with the given detections and a synthetic pixel buffer.
    pub fn synthetic(captured_at: DateTime<Utc>, detections: Vec<Detection>) -> Self {
        Self {
            captured_at,
            detections,
            pixels: FrameBuffer::solid(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, 96),
        }
    }
}

/// Source of atomic frame acquisitions.
///
/// Implementations block until a frame is available; the detection loop
/// bounds each call with a timeout. The structured layout of the
/// accelerator's raw output is an implementation concern: sources hand
/// over plain `Detection` values.
#[async_trait]
pub trait InferenceSource: Send + Sync {
    /// Acquire one frame.
    async fn acquire(&mut self) -> AgentResult<CapturedFrame>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Build the configured source.
///
/// `DOGWATCH_SOURCE` selects it: `idle` (default) or `replay:<path>`.
/// Hardware camera backends plug in here as additional variants.
pub async fn build_source() -> AgentResult<Box<dyn InferenceSource>> {
    let selector = std::env::var("DOGWATCH_SOURCE").unwrap_or_else(|_| "idle".to_string());

    if selector == "idle" {
        return Ok(Box::new(IdleSource));
    }

    if let Some(path) = selector.strip_prefix("replay:") {
        return Ok(Box::new(ReplaySource::from_json_file(path).await?));
    }

    Err(AgentError::config_error(format!(
        "unknown DOGWATCH_SOURCE {selector:?} (expected \"idle\" or \"replay:<path>\")"
    )))
}

/// Source that always reports an empty frame. The stand-in when no camera
/// backend is configured: the full pipeline runs, every cycle gates to
/// idle.
pub struct IdleSource;

#[async_trait]
impl InferenceSource for IdleSource {
    async fn acquire(&mut self) -> AgentResult<CapturedFrame> {
        Ok(CapturedFrame::synthetic(Utc::now(), Vec::new()))
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

#[derive(Debug, Deserialize)]
struct ScenarioDetection {
    label: String,
    score: f32,
    bbox: [f32; 4],
}

#[derive(Debug, Deserialize)]
struct ScenarioFrame {
    #[serde(default)]
    detections: Vec<ScenarioDetection>,
}

/// Source that replays a JSON scenario file, cycling through its frames.
/// Useful for demos and for exercising the pipeline without hardware.
///
/// Format: `[{"detections": [{"label": "dog", "score": 0.9,
/// "bbox": [0.1, 0.1, 0.4, 0.4]}]}, ...]`
#[derive(Debug)]
pub struct ReplaySource {
    frames: Vec<Vec<Detection>>,
    next: usize,
}

impl ReplaySource {
    pub async fn from_json_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let scenario: Vec<ScenarioFrame> = serde_json::from_slice(&bytes)?;

        if scenario.is_empty() {
            return Err(AgentError::config_error("replay scenario has no frames"));
        }

        let frames = scenario
            .into_iter()
            .map(|frame| {
                frame
                    .detections
                    .into_iter()
                    .map(|d| {
                        Detection::new(
                            d.label,
                            d.score,
                            BoundingBox::new(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]),
                        )
                    })
                    .collect()
            })
            .collect();

        Ok(Self { frames, next: 0 })
    }
}

#[async_trait]
impl InferenceSource for ReplaySource {
    async fn acquire(&mut self) -> AgentResult<CapturedFrame> {
        let detections = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        Ok(CapturedFrame::synthetic(Utc::now(), detections))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Source driven by a prepared queue of frames; errors once exhausted.
/// The integration suite and the self-check binary feed it scripted
/// scenarios.
pub struct ScriptedSource {
    frames: VecDeque<CapturedFrame>,
}

impl ScriptedSource {
    pub fn new(frames: impl Into<VecDeque<CapturedFrame>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

#[async_trait]
impl InferenceSource for ScriptedSource {
    async fn acquire(&mut self) -> AgentResult<CapturedFrame> {
        self.frames
            .pop_front()
            .ok_or_else(|| AgentError::source("script exhausted"))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
