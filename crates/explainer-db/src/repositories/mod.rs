//! Repositories, one per table group.

pub mod asset_repo;
pub mod character_repo;
pub mod project_repo;
pub mod scene_repo;

pub use asset_repo::AssetRepo;
pub use character_repo::CharacterRepo;
pub use project_repo::ProjectRepo;
pub use scene_repo::SceneRepo;
