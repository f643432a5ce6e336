//! DogWatch detection agent.
//!
//! This crate provides:
//! - The `InferenceSource` seam to the camera/accelerator
//! - The detection analyzer and per-cycle driver loop
//! - Agent configuration
//! - The single-process binary wiring loop, API server and heartbeat

pub mod analyzer;
pub mod config;
pub mod detection_loop;
pub mod error;
pub mod source;

pub use analyzer::DetectionAnalyzer;
pub use config::AgentConfig;
pub use detection_loop::DetectionLoop;
pub use error::{AgentError, AgentResult};
pub use source::{build_source, CapturedFrame, IdleSource, InferenceSource, ReplaySource, ScriptedSource};
