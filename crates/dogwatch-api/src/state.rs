//! Application state.

use std::sync::Arc;

use dogwatch_storage::{FrameStore, StatusPublisher};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Both stores are owned by the detection side; the API holds read-only
/// handles and never writes through them.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub status: Arc<StatusPublisher>,
    pub frames: Arc<FrameStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, status: Arc<StatusPublisher>, frames: Arc<FrameStore>) -> Self {
        Self {
            config,
            status,
            frames,
        }
    }
}
