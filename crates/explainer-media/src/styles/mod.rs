//! Character overlay strategies.
//!
//! Each render style draws the two characters differently but shares the
//! same contract: pick which poses of a role to draw, declare those images
//! through the shared [`InputPlan`], then emit overlay stages into the
//! [`FilterGraph`] gated by the role's [`SpeakingCondition`].

use std::path::Path;

use explainer_models::{Canvas, CharacterRole, RenderStyle, TimingWindow};

use crate::assets::{CharacterAssetSet, PoseSet};
use crate::graph::{CaptionStyle, FilterGraph, SpeakingCondition};
use crate::input::{InputIndex, InputPlan};

pub mod animated;
pub mod lip_sync;
pub mod pose_switch;
pub mod text_only;

/// How the output length is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// `-shortest`: stop when the voiceover ends
    Shortest,
    /// `-t <duration>`: stop at the measured narration length
    DurationCap,
}

/// Where characters sit on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub char_height: u32,
    /// Questioner's distance from the left edge
    pub left_x: u32,
    /// Explainer's distance from the right edge
    pub right_inset: u32,
    /// Gap between the character's feet and the bottom edge
    pub bottom_offset: u32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            char_height: 600,
            left_x: 50,
            right_inset: 450,
            bottom_offset: 300,
        }
    }
}

impl OverlayLayout {
    /// Top-left corner of a role's image.
    pub fn position(&self, role: CharacterRole, canvas: Canvas) -> (i64, i64) {
        let y = canvas.height as i64 - self.char_height as i64 - self.bottom_offset as i64;
        let x = match role {
            CharacterRole::Questioner => self.left_x as i64,
            CharacterRole::Explainer => canvas.width as i64 - self.right_inset as i64,
        };
        (x, y)
    }
}

/// Poses picked for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseChoice<'a> {
    /// Idle pose while silent, active pose while speaking
    Toggle {
        idle: (&'a str, &'a Path),
        active: (&'a str, &'a Path),
    },
    /// One pose shown for the whole video
    Single(&'a str, &'a Path),
}

/// A chosen pose after its image has been declared as an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseInput {
    pub pose: String,
    pub index: InputIndex,
}

/// Declared inputs for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredPoses {
    Toggle { idle: PoseInput, active: PoseInput },
    Single(PoseInput),
}

impl DeclaredPoses {
    /// Declare the chosen images, in idle-then-active order.
    pub fn declare(choice: PoseChoice<'_>, plan: &mut InputPlan) -> Self {
        let mut declare_one = |(pose, path): (&str, &Path)| PoseInput {
            pose: pose.to_string(),
            index: plan.looped_image(path),
        };
        match choice {
            PoseChoice::Toggle { idle, active } => DeclaredPoses::Toggle {
                idle: declare_one(idle),
                active: declare_one(active),
            },
            PoseChoice::Single(pose, path) => DeclaredPoses::Single(declare_one((pose, path))),
        }
    }

    pub fn indices(&self) -> Vec<InputIndex> {
        match self {
            DeclaredPoses::Toggle { idle, active } => vec![idle.index, active.index],
            DeclaredPoses::Single(single) => vec![single.index],
        }
    }
}

/// Everything a strategy needs to draw one role.
#[derive(Debug, Clone, Copy)]
pub struct RoleContext<'a> {
    pub role: CharacterRole,
    pub poses: &'a DeclaredPoses,
    pub speaking: &'a SpeakingCondition,
    pub canvas: Canvas,
}

impl RoleContext<'_> {
    /// Prepare a declared pose image and return its label.
    pub fn prepare(&self, graph: &mut FilterGraph, pose: &PoseInput, height: u32) -> String {
        graph.prepare_image(pose.index, height, &format!("{}_{}", self.role, pose.pose))
    }
}

/// A way of drawing the two characters.
pub trait CharacterOverlay: Send + Sync {
    /// Style this strategy implements.
    fn style(&self) -> RenderStyle;

    /// Caption appearance used with this strategy.
    fn caption_style(&self) -> CaptionStyle {
        CaptionStyle::default()
    }

    fn layout(&self) -> OverlayLayout {
        OverlayLayout::default()
    }

    fn end_condition(&self) -> EndCondition {
        EndCondition::Shortest
    }

    /// Pick the poses to draw for a role, or `None` to draw nothing.
    fn choose<'a>(&self, poses: &'a PoseSet) -> Option<PoseChoice<'a>>;

    /// Emit the overlay stages for one role.
    fn draw(&self, graph: &mut FilterGraph, ctx: &RoleContext<'_>);
}

/// Create the strategy for a render style.
pub fn create_overlay(style: RenderStyle) -> Box<dyn CharacterOverlay> {
    match style {
        RenderStyle::TextOnly => Box::new(text_only::TextOnlyOverlay),
        RenderStyle::PoseSwitch => Box::new(pose_switch::PoseSwitchOverlay),
        RenderStyle::Animated => Box::new(animated::AnimatedOverlay),
        RenderStyle::LipSync => Box::new(lip_sync::LipSyncOverlay),
    }
}

/// Declare and draw both roles' characters.
///
/// Roles without images, or whose images the strategy does not use, add no
/// inputs and no stages.
pub fn overlay_characters(
    overlay: &dyn CharacterOverlay,
    assets: &CharacterAssetSet,
    windows: &[TimingWindow],
    canvas: Canvas,
    plan: &mut InputPlan,
    graph: &mut FilterGraph,
) -> Vec<InputIndex> {
    let mut declared = Vec::new();
    for role in CharacterRole::ALL {
        let Some(choice) = assets.poses(role).and_then(|poses| overlay.choose(poses)) else {
            continue;
        };
        let poses = DeclaredPoses::declare(choice, plan);
        let speaking = SpeakingCondition::for_role(windows, role);
        overlay.draw(
            graph,
            &RoleContext {
                role,
                poses: &poses,
                speaking: &speaking,
                canvas,
            },
        );
        declared.extend(poses.indices());
    }
    declared
}

/// Idle/active pair if both exist, otherwise the first single pose found.
pub(crate) fn choose_pair_or_single<'a>(
    poses: &'a PoseSet,
    pairs: &[(&[&str], &[&str])],
    single: &[&str],
) -> Option<PoseChoice<'a>> {
    for (idle, active) in pairs {
        if let (Some(idle), Some(active)) = (poses.find_any(idle), poses.find_any(active)) {
            return Some(PoseChoice::Toggle { idle, active });
        }
    }
    poses
        .find_any(single)
        .or_else(|| poses.first())
        .map(|(pose, path)| PoseChoice::Single(pose, path))
}
