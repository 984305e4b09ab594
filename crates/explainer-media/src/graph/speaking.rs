use explainer_models::{CharacterRole, TimingWindow};

use super::caption::fmt_time;

/// Windows that touch closer than this are merged.
const MERGE_EPSILON: f64 = 1e-6;

/// Time expression that is non-zero while a role is speaking.
///
/// Built as a sum of `between(t,start,end)` terms. Consecutive windows of the
/// same role are merged first, so at most one term is true at any instant and
/// the sum is always 0 or 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakingCondition {
    spans: Vec<(f64, f64)>,
}

impl SpeakingCondition {
    /// Collect and merge the windows belonging to `role`.
    pub fn for_role(windows: &[TimingWindow], role: CharacterRole) -> Self {
        let mut own: Vec<(f64, f64)> = windows
            .iter()
            .filter(|w| w.role == role && w.end > w.start)
            .map(|w| (w.start, w.end))
            .collect();
        own.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut spans: Vec<(f64, f64)> = Vec::with_capacity(own.len());
        for (start, end) in own {
            match spans.last_mut() {
                Some(last) if start <= last.1 + MERGE_EPSILON => last.1 = last.1.max(end),
                _ => spans.push((start, end)),
            }
        }
        Self { spans }
    }

    pub fn spans(&self) -> &[(f64, f64)] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether the role is speaking at time `t`.
    pub fn is_speaking(&self, t: f64) -> bool {
        self.spans.iter().any(|(s, e)| t >= *s && t <= *e)
    }

    /// `between(t,s0,e0)+between(t,s1,e1)+...`, or `0` when the role never speaks.
    pub fn expression(&self) -> String {
        if self.spans.is_empty() {
            return "0".to_string();
        }
        self.spans
            .iter()
            .map(|(s, e)| format!("between(t,{},{})", fmt_time(*s), fmt_time(*e)))
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Complement of [`Self::expression`].
    pub fn silent_expression(&self) -> String {
        format!("1-({})", self.expression())
    }
}
