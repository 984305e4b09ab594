//! Captions only.

use explainer_models::RenderStyle;

use super::{CharacterOverlay, PoseChoice, RoleContext};
use crate::assets::PoseSet;
use crate::graph::{Backdrop, CaptionStyle, FilterGraph};

/// Draws no characters, only captions over the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOnlyOverlay;

impl CharacterOverlay for TextOnlyOverlay {
    fn style(&self) -> RenderStyle {
        RenderStyle::TextOnly
    }

    fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            backdrop: Some(Backdrop {
                height: 320,
                color: "black@0.5".to_string(),
            }),
            ..CaptionStyle::default()
        }
    }

    fn choose<'a>(&self, _poses: &'a PoseSet) -> Option<PoseChoice<'a>> {
        None
    }

    fn draw(&self, _graph: &mut FilterGraph, _ctx: &RoleContext<'_>) {}
}
