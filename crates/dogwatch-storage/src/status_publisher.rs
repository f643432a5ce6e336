//! Atomic publication of the current status snapshot.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use dogwatch_models::SystemStatus;

use crate::error::StorageResult;

/// Holds the single current status snapshot.
///
/// The snapshot is replaced wholesale under a write guard and cloned out
/// under a read guard, so a concurrent reader observes either the previous
/// complete snapshot or the new one, never a mix. Each publish is also
/// mirrored to a JSON file via write-temp-then-rename; a restarted process
/// resumes from that file instead of reporting a blank state.
pub struct StatusPublisher {
    path: PathBuf,
    current: RwLock<SystemStatus>,
}

impl StatusPublisher {
    /// Open the publisher, resuming from a previously persisted snapshot
    /// when one exists and parses.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<SystemStatus>(&bytes) {
                Ok(status) => {
                    info!(
                        "Resuming status from {} (generated {})",
                        path.display(),
                        status.generated_at
                    );
                    status
                }
                Err(e) => {
                    warn!("Discarding unreadable status file {}: {}", path.display(), e);
                    SystemStatus::startup(Utc::now())
                }
            },
            Err(_) => SystemStatus::startup(Utc::now()),
        };

        Self {
            path,
            current: RwLock::new(initial),
        }
    }

    /// Replace the current snapshot and persist it.
    ///
    /// The in-memory snapshot is swapped before the file write, so readers
    /// keep getting a complete, current snapshot even when persistence
    /// fails; the caller only logs the error.
    pub async fn publish(&self, status: SystemStatus) -> StorageResult<()> {
        {
            let mut current = self.current.write().await;
            *current = status.clone();
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&status)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Published status snapshot ({})", status.generated_at);
        Ok(())
    }

    /// Clone of the complete current snapshot.
    pub async fn current(&self) -> SystemStatus {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use dogwatch_models::DetectionEvent;
    use std::sync::Arc;

    fn snapshot(dog_count: u32, human_present: bool, at: DateTime<Utc>) -> SystemStatus {
        let event = DetectionEvent {
            captured_at: at,
            dog_count,
            max_dog_confidence: if dog_count > 0 { 0.8 } else { 0.0 },
            human_present,
        };
        SystemStatus::from_event(&event, None, at)
    }

    #[tokio::test]
    async fn test_publish_then_current() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = StatusPublisher::open(dir.path().join("status.json")).await;

        let now = Utc::now();
        publisher.publish(snapshot(1, false, now)).await.unwrap();

        let current = publisher.current().await;
        assert!(current.dog_detected);
        assert_eq!(current.generated_at, now);
    }

    #[tokio::test]
    async fn test_restart_resumes_last_known_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let now = Utc::now();

        {
            let publisher = StatusPublisher::open(&path).await;
            publisher.publish(snapshot(2, false, now)).await.unwrap();
        }

        let publisher = StatusPublisher::open(&path).await;
        let resumed = publisher.current().await;
        assert_eq!(resumed.dog_count, 2);
        assert_eq!(resumed.generated_at, now);
    }

    #[tokio::test]
    async fn test_corrupt_status_file_falls_back_to_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, b"{not json").unwrap();

        let publisher = StatusPublisher::open(&path).await;
        let current = publisher.current().await;
        assert!(!current.dog_detected && !current.privacy_mode);
    }

    /// 100 concurrent readers during continuous writes each observe a
    /// complete snapshot: the derived booleans stay consistent and every
    /// clone serializes to a full JSON object.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_never_see_torn_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(StatusPublisher::open(dir.path().join("status.json")).await);

        let writer = {
            let publisher = Arc::clone(&publisher);
            tokio::spawn(async move {
                let base = Utc::now();
                for i in 0..200u32 {
                    let at = base + Duration::milliseconds(i as i64);
                    let status = snapshot(i % 3, i % 2 == 0, at);
                    publisher.publish(status).await.unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..100 {
            let publisher = Arc::clone(&publisher);
            readers.push(tokio::spawn(async move {
                for _ in 0..20 {
                    let status = publisher.current().await;
                    assert_eq!(
                        status.recording_active,
                        status.dog_detected && !status.human_detected
                    );
                    assert_eq!(status.privacy_mode, status.human_detected);

                    let json = serde_json::to_string(&status).unwrap();
                    let parsed: SystemStatus = serde_json::from_str(&json).unwrap();
                    assert_eq!(parsed, status);
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
