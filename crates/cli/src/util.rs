//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolve a source file argument to its canonical path
pub fn canonical_source(file: &Path) -> Result<PathBuf> {
    if !file.is_file() {
        anyhow::bail!("Source file not found: {}", file.display());
    }
    file.canonicalize()
        .with_context(|| format!("Failed to resolve source file: {}", file.display()))
}

/// Read the source file as text
pub fn read_source(file: &Path) -> Result<String> {
    std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read source file: {}", file.display()))
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts_ms: u64) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let datetime = UNIX_EPOCH + Duration::from_millis(ts_ms);

    match SystemTime::now().duration_since(datetime) {
        Ok(elapsed) => {
            let seconds = elapsed.as_secs();
            if seconds < 60 {
                format!("{} seconds ago", seconds)
            } else if seconds < 3600 {
                format!("{} minutes ago", seconds / 60)
            } else if seconds < 86400 {
                format!("{} hours ago", seconds / 3600)
            } else {
                format!("{} days ago", seconds / 86400)
            }
        }
        Err(_) => "in the future".to_string(),
    }
}

/// Format a run duration ("850ms", "2.31s")
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0ms");
        assert_eq!(format_elapsed(Duration::from_millis(850)), "850ms");
        assert_eq!(format_elapsed(Duration::from_millis(2310)), "2.31s");
    }

    #[test]
    fn test_format_relative_time() {
        use std::time::{SystemTime, UNIX_EPOCH};

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        assert!(format_relative_time(now_ms).contains("seconds ago"));
        assert!(format_relative_time(now_ms - 3600 * 1000).contains("hour"));
        assert!(format_relative_time(now_ms - 2 * 86400 * 1000).contains("days"));
        assert_eq!(format_relative_time(now_ms + 3600 * 1000), "in the future");
    }

    #[test]
    fn test_canonical_source_missing() {
        let err = canonical_source(Path::new("/definitely/not/here.py")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
