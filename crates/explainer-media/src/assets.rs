//! Character pose images handed to the renderer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use explainer_models::CharacterRole;

use crate::error::{MediaError, MediaResult};

pub const POSE_NEUTRAL: &str = "neutral";
pub const POSE_TALKING: &str = "talking";
pub const POSE_STANDING: &str = "standing";
pub const POSE_MOUTH_OPEN: &str = "mouth_open";
pub const POSE_MOUTH_CLOSED: &str = "mouth_closed";

/// Pose name to image path for one character.
///
/// Paths are checked for existence on insert; image content is not inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoseSet {
    poses: BTreeMap<String, PathBuf>,
}

impl PoseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pose whose image must already exist on disk.
    pub fn insert(&mut self, pose: impl Into<String>, path: impl AsRef<Path>) -> MediaResult<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        self.poses.insert(pose.into(), path.to_path_buf());
        Ok(())
    }

    pub fn has(&self, pose: &str) -> bool {
        self.poses.contains_key(pose)
    }

    pub fn get(&self, pose: &str) -> Option<&Path> {
        self.poses.get(pose).map(PathBuf::as_path)
    }

    /// First pose in name order.
    pub fn first(&self) -> Option<(&str, &Path)> {
        self.poses
            .iter()
            .next()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// First of `candidates` present in the set.
    pub fn find_any<'a>(&'a self, candidates: &[&str]) -> Option<(&'a str, &'a Path)> {
        candidates.iter().find_map(|name| {
            self.poses
                .get_key_value(*name)
                .map(|(k, v)| (k.as_str(), v.as_path()))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.poses.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

/// Pose sets for both roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterAssetSet {
    roles: BTreeMap<CharacterRole, PoseSet>,
}

impl CharacterAssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poses for a role. Empty sets are dropped.
    pub fn set(&mut self, role: CharacterRole, poses: PoseSet) {
        if poses.is_empty() {
            self.roles.remove(&role);
        } else {
            self.roles.insert(role, poses);
        }
    }

    pub fn with(mut self, role: CharacterRole, poses: PoseSet) -> Self {
        self.set(role, poses);
        self
    }

    pub fn poses(&self, role: CharacterRole) -> Option<&PoseSet> {
        self.roles.get(&role)
    }

    /// True when no role has any image.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
