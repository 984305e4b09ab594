//! Mouth-flap lip sync.

use explainer_models::RenderStyle;

use super::{
    choose_pair_or_single, CharacterOverlay, DeclaredPoses, EndCondition, OverlayLayout, PoseChoice,
    RoleContext,
};
use crate::assets::{
    PoseSet, POSE_MOUTH_CLOSED, POSE_MOUTH_OPEN, POSE_NEUTRAL, POSE_STANDING, POSE_TALKING,
};
use crate::graph::{Backdrop, CaptionStyle, FilterGraph};

const CLOSED: &[&str] = &[POSE_MOUTH_CLOSED, POSE_NEUTRAL, POSE_STANDING];
const OPEN: &[&str] = &[POSE_MOUTH_OPEN, POSE_TALKING];
const SINGLE: &[&str] = &[POSE_MOUTH_CLOSED, POSE_NEUTRAL, POSE_STANDING, POSE_TALKING];

/// Mouth toggles per second while speaking.
pub const LIP_SYNC_HZ: u32 = 8;

/// Alternates open and closed mouth poses while a role speaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct LipSyncOverlay;

impl LipSyncOverlay {
    /// Non-zero during the open half of each mouth cycle.
    fn open_phase() -> String {
        format!("lt(mod(t*{LIP_SYNC_HZ},1),0.5)")
    }

    /// Closed mouth: whenever silent, plus the closed half-cycle while speaking.
    fn closed_enable(s: &str) -> String {
        format!("(1-({s}))+({s})*(1-{})", Self::open_phase())
    }

    fn open_enable(s: &str) -> String {
        format!("({s})*{}", Self::open_phase())
    }
}

impl CharacterOverlay for LipSyncOverlay {
    fn style(&self) -> RenderStyle {
        RenderStyle::LipSync
    }

    fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            wrap_width: 36,
            name_font_size: 38,
            body_font_size: 42,
            name_color: "0xFFD700".to_string(),
            name_offset: 320,
            body_offset: 260,
            backdrop: Some(Backdrop {
                height: 340,
                color: "black@0.75".to_string(),
            }),
            ..CaptionStyle::default()
        }
    }

    fn layout(&self) -> OverlayLayout {
        OverlayLayout {
            char_height: 550,
            left_x: 80,
            right_inset: 480,
            bottom_offset: 380,
        }
    }

    fn end_condition(&self) -> EndCondition {
        EndCondition::DurationCap
    }

    fn choose<'a>(&self, poses: &'a PoseSet) -> Option<PoseChoice<'a>> {
        choose_pair_or_single(poses, &[(CLOSED, OPEN)], SINGLE)
    }

    fn draw(&self, graph: &mut FilterGraph, ctx: &RoleContext<'_>) {
        let layout = self.layout();
        let (x, y) = layout.position(ctx.role, ctx.canvas);
        let s = ctx.speaking.expression();
        let sway_x = format!("{x}+8*sin(t*4)");
        let sway_y = format!("{y}+6*sin(t*3)");

        match ctx.poses {
            DeclaredPoses::Toggle { idle, active } => {
                let closed = ctx.prepare(graph, idle, layout.char_height);
                let open = ctx.prepare(graph, active, layout.char_height);
                graph.overlay(&closed, &sway_x, &sway_y, Some(&Self::closed_enable(&s)));
                let open_y = format!("{sway_y}+({s})*4*sin(t*12)");
                graph.overlay(&open, &sway_x, &open_y, Some(&Self::open_enable(&s)));
            }
            DeclaredPoses::Single(pose) => {
                let img = ctx.prepare(graph, pose, layout.char_height);
                graph.overlay(&img, &sway_x, &sway_y, None);
            }
        }
    }
}
