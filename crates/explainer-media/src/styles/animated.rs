//! Single pose with procedural motion.

use explainer_models::RenderStyle;

use super::{
    choose_pair_or_single, CharacterOverlay, DeclaredPoses, EndCondition, OverlayLayout, PoseChoice,
    RoleContext,
};
use crate::assets::{PoseSet, POSE_NEUTRAL, POSE_STANDING, POSE_TALKING};
use crate::graph::{Backdrop, CaptionStyle, FilterGraph};

const SINGLE: &[&str] = &[POSE_NEUTRAL, POSE_STANDING, POSE_TALKING];

/// Gentle vertical bob while idle, 5px at 0.5Hz.
const IDLE_BOB: &str = "5*sin(t*PI)";
/// Faster, larger bob while speaking, 15px at 3Hz.
const TALK_BOB: &str = "15*sin(t*6*PI)";
/// Horizontal shake while speaking, 3px at 6Hz.
const TALK_SHAKE: &str = "3*sin(t*12*PI)";

/// Draws one pose per role and animates its position, livelier while speaking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimatedOverlay;

impl AnimatedOverlay {
    /// Overlay position expressions for a speaking condition `s`.
    fn motion(x: i64, y: i64, s: &str) -> (String, String) {
        (
            format!("{x}+({s})*({TALK_SHAKE})"),
            format!("{y}+({s})*({TALK_BOB})+(1-({s}))*({IDLE_BOB})"),
        )
    }
}

impl CharacterOverlay for AnimatedOverlay {
    fn style(&self) -> RenderStyle {
        RenderStyle::Animated
    }

    fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            wrap_width: 38,
            name_font_size: 36,
            body_font_size: 40,
            name_color: "0xFFD700".to_string(),
            name_offset: 300,
            body_offset: 240,
            backdrop: Some(Backdrop {
                height: 320,
                color: "black@0.6".to_string(),
            }),
            ..CaptionStyle::default()
        }
    }

    fn layout(&self) -> OverlayLayout {
        OverlayLayout {
            char_height: 600,
            left_x: 100,
            right_inset: 500,
            bottom_offset: 350,
        }
    }

    fn end_condition(&self) -> EndCondition {
        EndCondition::DurationCap
    }

    fn choose<'a>(&self, poses: &'a PoseSet) -> Option<PoseChoice<'a>> {
        choose_pair_or_single(poses, &[], SINGLE)
    }

    fn draw(&self, graph: &mut FilterGraph, ctx: &RoleContext<'_>) {
        let layout = self.layout();
        let pose = match ctx.poses {
            DeclaredPoses::Single(pose) => pose,
            DeclaredPoses::Toggle { idle, .. } => idle,
        };
        let img = ctx.prepare(graph, pose, layout.char_height);
        let (x, y) = layout.position(ctx.role, ctx.canvas);
        let (x_expr, y_expr) = Self::motion(x, y, &ctx.speaking.expression());
        graph.overlay(&img, &x_expr, &y_expr, None);
    }
}
