//! Request handlers.

use serde::Serialize;

pub mod assets;
pub mod characters;
pub mod health;
pub mod projects;
pub mod settings;
mod upload;

pub use health::*;

/// Acknowledgement body for actions that have no resource to return.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn new(status: &'static str) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
