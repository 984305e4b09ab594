//! Locations of the external FFmpeg binaries.

use std::path::PathBuf;

use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Paths to `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl MediaTools {
    /// Use the given names or paths without checking them.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Resolve both binaries through `PATH` (or as given, if absolute).
    pub fn resolve(ffmpeg: &str, ffprobe: &str) -> MediaResult<Self> {
        Ok(Self {
            ffmpeg: check_ffmpeg(ffmpeg)?,
            ffprobe: check_ffprobe(ffprobe)?,
        })
    }

    /// Resolve when possible, otherwise keep the configured names and let
    /// the first invocation report the problem.
    pub fn resolve_or_configured(ffmpeg: &str, ffprobe: &str) -> Self {
        match Self::resolve(ffmpeg, ffprobe) {
            Ok(tools) => tools,
            Err(e) => {
                warn!("{}; rendering will fail until it is installed", e);
                Self::new(ffmpeg, ffprobe)
            }
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::FfmpegNotFound(program.to_string()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::FfprobeNotFound(program.to_string()))
}
