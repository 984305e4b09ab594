//! Idle/talking pose switching.

use explainer_models::RenderStyle;

use super::{choose_pair_or_single, CharacterOverlay, DeclaredPoses, PoseChoice, RoleContext};
use crate::assets::{
    PoseSet, POSE_MOUTH_CLOSED, POSE_MOUTH_OPEN, POSE_NEUTRAL, POSE_STANDING, POSE_TALKING,
};
use crate::graph::FilterGraph;

const IDLE: &[&str] = &[POSE_NEUTRAL, POSE_STANDING];
const ACTIVE: &[&str] = &[POSE_TALKING];
const MOUTH_IDLE: &[&str] = &[POSE_MOUTH_CLOSED];
const MOUTH_ACTIVE: &[&str] = &[POSE_MOUTH_OPEN];
const SINGLE: &[&str] = &[POSE_TALKING, POSE_NEUTRAL, POSE_STANDING];

/// Shows the talking pose during a role's lines and the neutral pose otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseSwitchOverlay;

impl CharacterOverlay for PoseSwitchOverlay {
    fn style(&self) -> RenderStyle {
        RenderStyle::PoseSwitch
    }

    fn choose<'a>(&self, poses: &'a PoseSet) -> Option<PoseChoice<'a>> {
        choose_pair_or_single(poses, &[(IDLE, ACTIVE), (MOUTH_IDLE, MOUTH_ACTIVE)], SINGLE)
    }

    fn draw(&self, graph: &mut FilterGraph, ctx: &RoleContext<'_>) {
        let layout = self.layout();
        let (x, y) = layout.position(ctx.role, ctx.canvas);
        let (x, y) = (x.to_string(), y.to_string());

        match ctx.poses {
            DeclaredPoses::Toggle { idle, active } => {
                let idle_img = ctx.prepare(graph, idle, layout.char_height);
                let active_img = ctx.prepare(graph, active, layout.char_height);
                graph.overlay(&idle_img, &x, &y, Some(&ctx.speaking.silent_expression()));
                graph.overlay(&active_img, &x, &y, Some(&ctx.speaking.expression()));
            }
            DeclaredPoses::Single(pose) => {
                let img = ctx.prepare(graph, pose, layout.char_height);
                graph.overlay(&img, &x, &y, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SpeakingCondition;
    use crate::input::InputPlan;
    use crate::styles::test_support::{pose_set, windows};
    use explainer_models::{Canvas, CharacterRole};

    fn draw_role(names: &[&str], role: CharacterRole) -> String {
        let dir = tempfile::tempdir().unwrap();
        let poses = pose_set(dir.path(), "x", names);
        let mut plan = InputPlan::new();
        let bg = plan.looped_image("bg.png");
        let mut graph = FilterGraph::with_background(bg, Canvas::default());
        let declared = DeclaredPoses::declare(PoseSwitchOverlay.choose(&poses).unwrap(), &mut plan);
        let speaking = SpeakingCondition::for_role(&windows(), role);
        PoseSwitchOverlay.draw(
            &mut graph,
            &RoleContext {
                role,
                poses: &declared,
                speaking: &speaking,
                canvas: Canvas::default(),
            },
        );
        graph.finish()
    }

    #[test]
    fn test_neutral_and_talking_toggle() {
        let graph = draw_role(&[POSE_NEUTRAL, POSE_TALKING], CharacterRole::Explainer);
        assert!(graph.contains("[1:v]scale=-1:600:flags=lanczos,format=rgba[img_explainer_neutral]"));
        assert!(graph.contains("[2:v]scale=-1:600:flags=lanczos,format=rgba[img_explainer_talking]"));
        assert!(graph.contains(
            "[bg][img_explainer_neutral]overlay=x='630':y='1020':format=auto:enable='1-(between(t,3.000,8.000))'[ov0]"
        ));
        assert!(graph.contains(
            "[ov0][img_explainer_talking]overlay=x='630':y='1020':format=auto:enable='between(t,3.000,8.000)'[ov1]"
        ));
    }

    #[test]
    fn test_mouth_poses_also_toggle() {
        let graph = draw_role(&[POSE_MOUTH_CLOSED, POSE_MOUTH_OPEN], CharacterRole::Questioner);
        assert!(graph.contains("enable='1-(between(t,0.000,3.000))'"));
        assert!(graph.contains("enable='between(t,0.000,3.000)'"));
    }

    #[test]
    fn test_single_pose_is_unconditional() {
        let graph = draw_role(&[POSE_NEUTRAL], CharacterRole::Questioner);
        assert!(graph.contains("[bg][img_questioner_neutral]overlay=x='50':y='1020':format=auto[ov0]"));
        assert!(!graph.contains("enable="));
    }

    #[test]
    fn test_single_prefers_talking_then_first() {
        let dir = tempfile::tempdir().unwrap();
        let poses = pose_set(dir.path(), "x", &["waving", POSE_TALKING]);
        assert!(matches!(
            PoseSwitchOverlay.choose(&poses),
            Some(PoseChoice::Single(POSE_TALKING, _))
        ));
        let poses = pose_set(dir.path(), "y", &["waving", "pointing"]);
        assert!(matches!(
            PoseSwitchOverlay.choose(&poses),
            Some(PoseChoice::Single("pointing", _))
        ));
    }
}
