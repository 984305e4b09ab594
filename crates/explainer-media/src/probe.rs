//! FFprobe duration queries.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probe a media file for its duration in seconds.
///
/// FFprobe is asked to print the bare `format.duration` value and nothing else.
pub async fn probe_duration(ffprobe: impl AsRef<Path>, path: impl AsRef<Path>) -> MediaResult<f64> {
    let (ffprobe, path) = (ffprobe.as_ref(), path.as_ref());

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which(ffprobe)
        .map_err(|_| MediaError::FfprobeNotFound(ffprobe.display().to_string()))?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe exited with status {:?}", output.status.code()),
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        ));
    }

    let duration = parse_duration_output(&String::from_utf8_lossy(&output.stdout))?;
    debug!(path = %path.display(), duration, "Probed duration");
    Ok(duration)
}

/// Parse the bare seconds value FFprobe prints.
pub fn parse_duration_output(stdout: &str) -> MediaResult<f64> {
    let raw = stdout.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(MediaError::InvalidDuration(raw.to_string())),
    }
}
