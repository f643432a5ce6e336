//! Frame record naming.
//!
//! Persisted dog frames are named `dog_<YYYYMMDD>_<HHMMSS>.jpg`. The capture
//! time is encoded in the name and parsed back for display and for ordering,
//! so the store needs no index file.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const FRAME_PREFIX: &str = "dog_";
const FRAME_SUFFIX: &str = ".jpg";
const FRAME_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One persisted evidence frame. Owned exclusively by the frame store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// File name, e.g. `dog_20250114_183042.jpg`.
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Capture time parsed from the name.
    pub captured_at: DateTime<Utc>,
}

/// File name for a frame captured at `ts`.
pub fn frame_file_name(ts: DateTime<Utc>) -> String {
    format!("{FRAME_PREFIX}{}{FRAME_SUFFIX}", ts.format(FRAME_TIME_FORMAT))
}

/// Parse the capture time out of a frame file name.
///
/// Returns `None` for anything that does not follow the naming convention,
/// which also serves as the validity check for serving frame files by name.
pub fn parse_frame_time(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_prefix(FRAME_PREFIX)?.strip_suffix(FRAME_SUFFIX)?;
    let naive = NaiveDateTime::parse_from_str(stem, FRAME_TIME_FORMAT).ok()?;
    Some(naive.and_utc())
}

/// Human-readable capture time, `YYYY-MM-DD HH:MM:SS`.
pub fn display_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_name_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 14, 18, 30, 42).unwrap();
        let name = frame_file_name(ts);
        assert_eq!(name, "dog_20250114_183042.jpg");
        assert_eq!(parse_frame_time(&name), Some(ts));
    }

    #[test]
    fn test_display_time() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 14, 18, 30, 42).unwrap();
        assert_eq!(display_time(ts), "2025-01-14 18:30:42");
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        for name in [
            "cat_20250114_183042.jpg",
            "dog_20250114_183042.png",
            "dog_20250114.jpg",
            "dog_2025011x_183042.jpg",
            "../etc/passwd",
            "dog_20250114_183042.jpg.tmp",
            "",
        ] {
            assert!(parse_frame_time(name).is_none(), "accepted {name:?}");
        }
    }
}
