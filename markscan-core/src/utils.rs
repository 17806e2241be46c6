//! Utility functions for formatting and path handling.
//!
//! General-purpose helpers shared by the scanners, the clip exporter and the
//! CLI: frame-rate parsing, time formatting and safe file names.

use std::path::Path;

/// File extensions (case-insensitive) treated as video input.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm"];

/// Checks if the given path is an existing file with a video extension.
#[must_use]
pub fn is_valid_video_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
}

/// Parses an ffprobe frame rate ("30", "29.97", "30000/1001").
/// Returns `None` unless the result is finite and positive.
#[must_use]
pub fn parse_frame_rate(frame_rate: &str) -> Option<f64> {
    let value = match frame_rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            num / den
        }
        None => frame_rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Formats seconds with two decimals, the precision handed to the trimmer.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.2}")
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// File name without extension, used to namespace output directories.
pub fn file_stem_safe(path: &Path) -> crate::CoreResult<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| {
            crate::CoreError::PathError(format!("Failed to get file stem for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Formats a scale factor the way it appears in output names (five decimals).
#[must_use]
pub fn format_scale(scale: f64) -> String {
    format!("{scale:.5}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_video_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "b.MKV", "c.Mov", "d.txt"] {
            std::fs::File::create(dir.path().join(name)).unwrap();
        }

        assert!(is_valid_video_file(&dir.path().join("a.mp4")));
        assert!(is_valid_video_file(&dir.path().join("b.MKV")));
        assert!(is_valid_video_file(&dir.path().join("c.Mov")));
        assert!(!is_valid_video_file(&dir.path().join("d.txt")));
        assert!(!is_valid_video_file(&dir.path().join("missing.mp4")));
        assert!(!is_valid_video_file(dir.path()));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30"), Some(30.0));
        assert_eq!(parse_frame_rate("29.97"), Some(29.97));
        assert_eq!(parse_frame_rate("30000/1001"), Some(30000.0 / 1001.0));
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("invalid"), None);
        assert_eq!(parse_frame_rate("30/0"), None);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("0"), None);
        assert_eq!(parse_frame_rate("-25"), None);
    }

    #[test]
    fn test_format_seconds_two_decimals() {
        assert_eq!(format_seconds(0.0), "0.00");
        assert_eq!(format_seconds(100.0 / 30.0), "3.33");
        assert_eq!(format_seconds(311.0 / 30.0), "10.37");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3661.0), "01:01:01");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_file_stem_safe() {
        assert_eq!(file_stem_safe(Path::new("/videos/short.mp4")).unwrap(), "short");
        assert_eq!(file_stem_safe(Path::new("frame_320.jpg")).unwrap(), "frame_320");
        assert!(file_stem_safe(Path::new("/")).is_err());
    }

    #[test]
    fn test_format_scale() {
        assert_eq!(format_scale(0.42738), "0.42738");
        assert_eq!(format_scale(0.5), "0.50000");
    }
}
