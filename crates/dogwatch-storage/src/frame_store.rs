//! Bounded on-disk retention of evidence frames.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info, warn};

use dogwatch_models::{frame_file_name, parse_frame_time, FrameBuffer, FrameRecord};

use crate::error::{StorageError, StorageResult};

/// Bounded, time-ordered store of dog frames.
///
/// The directory is the source of truth: each frame is one JPEG whose name
/// encodes its capture time. Writes go through a temporary sibling and an
/// atomic rename, so a failed insert never surfaces a partial file to
/// `list`. After every successful insert the oldest frames are evicted
/// until the count is back within capacity.
///
/// The detection loop is the only writer; the serving side only calls
/// `list` and reads the files it returns.
pub struct FrameStore {
    dir: PathBuf,
    capacity: usize,
    jpeg_quality: u8,
}

impl FrameStore {
    /// Open (and create if needed) the store directory.
    ///
    /// Leftovers from an interrupted run — stale temporary files, frames
    /// beyond capacity — are cleaned up here, so a restart self-corrects
    /// before the first insert.
    pub async fn open(
        dir: impl AsRef<Path>,
        capacity: usize,
        jpeg_quality: u8,
    ) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let store = Self {
            dir,
            capacity: capacity.max(1),
            jpeg_quality,
        };

        store.remove_stale_temp_files().await;
        store.prune().await?;

        Ok(store)
    }

    /// Directory holding the frame files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Configured retention bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Persist one captured frame, then evict down to capacity.
    pub async fn insert(
        &self,
        pixels: &FrameBuffer,
        captured_at: DateTime<Utc>,
    ) -> StorageResult<FrameRecord> {
        if !pixels.is_well_formed() {
            return Err(StorageError::invalid_frame(format!(
                "buffer length {} does not match {}x{} RGB8",
                pixels.rgb.len(),
                pixels.width,
                pixels.height
            )));
        }

        let jpeg = self.encode_jpeg(pixels)?;

        let name = frame_file_name(captured_at);
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        tokio::fs::write(&tmp, &jpeg).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Persisted frame {} ({} bytes)", name, jpeg.len());

        // Eviction failure leaves at most a transient over-capacity state;
        // the next insert (or restart) corrects it.
        if let Err(e) = self.prune().await {
            warn!("Frame eviction failed, will retry next insert: {}", e);
        }

        Ok(FrameRecord {
            name,
            path,
            captured_at,
        })
    }

    /// List retained frames, newest first, at most `limit` entries.
    pub async fn list(&self, limit: usize) -> StorageResult<Vec<FrameRecord>> {
        let mut records = self.scan().await?;
        records.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        records.truncate(limit);
        Ok(records)
    }

    /// Number of retained frames.
    pub async fn count(&self) -> StorageResult<usize> {
        Ok(self.scan().await?.len())
    }

    fn encode_jpeg(&self, pixels: &FrameBuffer) -> StorageResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        encoder
            .encode(&pixels.rgb, pixels.width, pixels.height, image::ColorType::Rgb8)
            .map_err(|e| StorageError::encode_failed(e.to_string()))?;
        Ok(out)
    }

    /// Collect every file that follows the frame naming convention.
    /// Anything else in the directory is ignored.
    async fn scan(&self) -> StorageResult<Vec<FrameRecord>> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(captured_at) = parse_frame_time(&name) {
                records.push(FrameRecord {
                    name,
                    path: entry.path(),
                    captured_at,
                });
            }
        }

        Ok(records)
    }

    /// Evict oldest frames until the count is within capacity.
    async fn prune(&self) -> StorageResult<()> {
        let mut records = self.scan().await?;
        if records.len() <= self.capacity {
            return Ok(());
        }

        records.sort_by(|a, b| a.captured_at.cmp(&b.captured_at));
        let excess = records.len() - self.capacity;

        for record in records.into_iter().take(excess) {
            match tokio::fs::remove_file(&record.path).await {
                Ok(()) => info!("Evicted frame {}", record.name),
                // Already gone (e.g. raced with a previous interrupted
                // eviction); the bound still holds.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    async fn remove_stale_temp_files(&self) {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") {
                if tokio::fs::remove_file(entry.path()).await.is_ok() {
                    debug!("Removed stale temp file {}", name);
                }
            }
        }
    }
}
