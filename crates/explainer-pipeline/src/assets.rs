//! On-disk storage for uploaded characters, backgrounds and music.

use std::path::{Path, PathBuf};

use explainer_models::ContextStyle;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

pub const ALLOWED_IMAGE_TYPES: [&str; 4] = [".jpeg", ".jpg", ".png", ".webp"];
pub const ALLOWED_AUDIO_TYPES: [&str; 4] = [".m4a", ".mp3", ".ogg", ".wav"];
pub const MAX_FILE_SIZE_MB: u64 = 50;

const MAX_NAME_CHARS: usize = 50;

/// Asset directory layout:
///
/// ```text
/// {root}/characters/{character_id}/{pose}{ext}
/// {root}/backgrounds/{style|general}/{name}{ext}
/// {root}/music/{style|general}/{name}{ext}
/// ```
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    max_file_bytes: u64,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }

    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_file_bytes = mb * 1024 * 1024;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the three top-level directories.
    pub async fn ensure_dirs(&self) -> PipelineResult<()> {
        for dir in ["characters", "backgrounds", "music"] {
            tokio::fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    /// Lowercased extension of an allowed image name, dot included.
    pub fn validate_image_name(filename: &str) -> PipelineResult<String> {
        validate_extension(filename, "image", &ALLOWED_IMAGE_TYPES)
    }

    pub fn validate_audio_name(filename: &str) -> PipelineResult<String> {
        validate_extension(filename, "audio", &ALLOWED_AUDIO_TYPES)
    }

    pub fn check_size(&self, len: usize) -> PipelineResult<()> {
        if len as u64 > self.max_file_bytes {
            return Err(PipelineError::validation(format!(
                "File too large: {} bytes. Maximum: {} MB",
                len,
                self.max_file_bytes / (1024 * 1024)
            )));
        }
        if len == 0 {
            return Err(PipelineError::validation("File is empty"));
        }
        Ok(())
    }

    /// Store a pose image, replacing an earlier upload of the same pose.
    pub async fn save_character_pose(
        &self,
        character_id: i64,
        pose: &str,
        filename: &str,
        bytes: &[u8],
    ) -> PipelineResult<PathBuf> {
        let ext = Self::validate_image_name(filename)?;
        self.check_size(bytes.len())?;
        let pose = sanitize_name(pose);
        if pose.is_empty() {
            return Err(PipelineError::validation("Pose name is required"));
        }

        let dir = self.character_dir(character_id);
        // A pose re-uploaded with another extension must not leave the old file behind
        for other in ALLOWED_IMAGE_TYPES.iter().filter(|e| **e != ext) {
            let stale = dir.join(format!("{pose}{other}"));
            if tokio::fs::try_exists(&stale).await.unwrap_or(false) {
                tokio::fs::remove_file(&stale).await?;
            }
        }
        self.write(dir.join(format!("{pose}{ext}")), bytes).await
    }

    pub async fn save_background(
        &self,
        style: Option<ContextStyle>,
        name: &str,
        filename: &str,
        bytes: &[u8],
    ) -> PipelineResult<PathBuf> {
        let ext = Self::validate_image_name(filename)?;
        self.check_size(bytes.len())?;
        let path = self
            .styled_dir("backgrounds", style)
            .join(format!("{}{}", sanitize_name(name), ext));
        self.write(path, bytes).await
    }

    pub async fn save_music(
        &self,
        style: Option<ContextStyle>,
        name: &str,
        filename: &str,
        bytes: &[u8],
    ) -> PipelineResult<PathBuf> {
        let ext = Self::validate_audio_name(filename)?;
        self.check_size(bytes.len())?;
        let path = self
            .styled_dir("music", style)
            .join(format!("{}{}", sanitize_name(name), ext));
        self.write(path, bytes).await
    }

    /// Delete a stored file. Returns `false` if it was already gone.
    ///
    /// Paths that resolve outside the asset root are refused.
    pub async fn delete_file(&self, path: impl AsRef<Path>) -> PipelineResult<bool> {
        let path = path.as_ref();
        let resolved = match tokio::fs::canonicalize(path).await {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let root = tokio::fs::canonicalize(&self.root).await?;
        if !resolved.starts_with(&root) {
            return Err(PipelineError::validation(
                "Cannot delete files outside assets directory",
            ));
        }
        tokio::fs::remove_file(&resolved).await?;
        info!(path = %resolved.display(), "Deleted asset");
        Ok(true)
    }

    /// Pose names with an image on disk for a character, sorted.
    pub async fn character_poses(&self, character_id: i64) -> PipelineResult<Vec<String>> {
        let dir = self.character_dir(character_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut poses = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_image = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| Self::validate_image_name(n).is_ok());
            if let (true, Some(stem)) = (is_image, path.file_stem().and_then(|s| s.to_str())) {
                poses.push(stem.to_string());
            }
        }
        poses.sort();
        Ok(poses)
    }

    fn character_dir(&self, character_id: i64) -> PathBuf {
        self.root.join("characters").join(character_id.to_string())
    }

    fn styled_dir(&self, kind: &str, style: Option<ContextStyle>) -> PathBuf {
        self.root
            .join(kind)
            .join(style.map(|s| s.as_str()).unwrap_or("general"))
    }

    async fn write(&self, path: PathBuf, bytes: &[u8]) -> PipelineResult<PathBuf> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved asset");
        Ok(path)
    }
}

/// Keep ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_NAME_CHARS)
        .collect()
}

fn validate_extension(filename: &str, kind: &str, allowed: &[&str]) -> PipelineResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    if allowed.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(PipelineError::validation(format!(
            "Invalid {kind} type: {ext}. Allowed: {}",
            allowed.join(", ")
        )))
    }
}
