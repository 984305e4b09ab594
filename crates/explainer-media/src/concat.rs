//! Joining audio files with the concat demuxer.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::input::InputPlan;

/// Render the concat demuxer list for `files`.
pub fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("file '{}'\n", f.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

/// Concatenate same-codec audio files into `output` without re-encoding.
///
/// The list file is written next to `output` and removed afterwards, whether
/// or not FFmpeg succeeded.
pub async fn concat_audio(
    ffmpeg: impl Into<PathBuf>,
    files: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();
    if files.is_empty() {
        return Err(MediaError::validation("no audio files to concatenate"));
    }

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list(files)).await?;
    debug!(files = files.len(), list = %list_path.display(), "Concatenating audio");

    let mut plan = InputPlan::new();
    plan.concat_list(&list_path);
    let cmd = FfmpegCommand::new(plan, output).stream_copy();
    let result = FfmpegRunner::new(ffmpeg).run(&cmd).await;

    if let Err(e) = tokio::fs::remove_file(&list_path).await {
        warn!("Failed to remove concat list {}: {}", list_path.display(), e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&[
            PathBuf::from("/tmp/scene_001.mp3"),
            PathBuf::from("/tmp/it's/scene_002.mp3"),
        ]);
        assert_eq!(
            list,
            "file '/tmp/scene_001.mp3'\nfile '/tmp/it'\\''s/scene_002.mp3'\n"
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = concat_audio("ffmpeg", &[], dir.path().join("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("combined.mp3");
        let result = concat_audio(
            "no-such-ffmpeg-binary",
            &[dir.path().join("scene_001.mp3")],
            &output,
        )
        .await;
        assert!(matches!(result, Err(MediaError::FfmpegNotFound(_))));
        assert!(!output.with_extension("concat.txt").exists());
    }
}
