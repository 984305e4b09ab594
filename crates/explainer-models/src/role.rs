//! Dialogue roles and content styles.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One of the two fixed dialogue participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CharacterRole {
    /// Asks the questions a viewer would ask
    Questioner,
    /// Answers them
    Explainer,
}

impl CharacterRole {
    /// Both roles, questioner first.
    pub const ALL: [CharacterRole; 2] = [CharacterRole::Questioner, CharacterRole::Explainer];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterRole::Questioner => "questioner",
            CharacterRole::Explainer => "explainer",
        }
    }
}

impl std::fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CharacterRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "questioner" => Ok(CharacterRole::Questioner),
            "explainer" => Ok(CharacterRole::Explainer),
            other => Err(ModelError::unknown("character role", other)),
        }
    }
}

/// Tone of the generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ContextStyle {
    Motivation,
    Finance,
    Tech,
    #[default]
    Educational,
}

impl ContextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStyle::Motivation => "motivation",
            ContextStyle::Finance => "finance",
            ContextStyle::Tech => "tech",
            ContextStyle::Educational => "educational",
        }
    }

    /// Short tone guidance injected into the script prompt.
    pub fn tone(&self) -> &'static str {
        match self {
            ContextStyle::Motivation => "energetic and inspiring, with a personal call to action",
            ContextStyle::Finance => "clear and practical, grounded in concrete numbers",
            ContextStyle::Tech => "curious and precise, explaining jargon as it appears",
            ContextStyle::Educational => "friendly and patient, building from first principles",
        }
    }
}

impl std::fmt::Display for ContextStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContextStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motivation" => Ok(ContextStyle::Motivation),
            "finance" => Ok(ContextStyle::Finance),
            "tech" => Ok(ContextStyle::Tech),
            "educational" => Ok(ContextStyle::Educational),
            other => Err(ModelError::unknown("context style", other)),
        }
    }
}
