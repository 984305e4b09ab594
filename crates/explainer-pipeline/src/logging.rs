//! Structured job logging utilities.
//!
//! Every background task logs its lifecycle through a [`JobLogger`] so
//! entries share the `project_id` and `operation` fields.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{error, info, warn, Span};

/// Progress is logged once per quarter.
const PROGRESS_STEP_PERCENT: f64 = 25.0;

/// Job logger for one background task on one project.
#[derive(Debug, Clone)]
pub struct JobLogger {
    project_id: i64,
    operation: &'static str,
}

impl JobLogger {
    /// Create a logger for `operation` (e.g. "generate_script", "render").
    pub fn new(project_id: i64, operation: &'static str) -> Self {
        Self {
            project_id,
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            project_id = self.project_id,
            operation = self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            project_id = self.project_id,
            operation = self.operation,
            "Job progress: {}", message
        );
    }

    /// Callback that logs a percentage each time it crosses a new quarter.
    pub fn progress_reporter(&self) -> impl Fn(f64) + Send + 'static {
        let logger = self.clone();
        let milestones = ProgressMilestones::default();
        move |percent| {
            if let Some(reached) = milestones.advance(percent) {
                logger.log_progress(&format!("{reached:.0}%"));
            }
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            project_id = self.project_id,
            operation = self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            project_id = self.project_id,
            operation = self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str, duration_ms: u128) {
        info!(
            project_id = self.project_id,
            operation = self.operation,
            duration_ms = duration_ms as u64,
            "Job completed: {}", message
        );
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Span covering the whole task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            project_id = self.project_id,
            operation = self.operation
        )
    }
}

/// Remembers the highest progress quarter already reported.
#[derive(Debug, Default)]
pub struct ProgressMilestones {
    last_step: AtomicU8,
}

impl ProgressMilestones {
    /// The percentage to report when `percent` enters a quarter not seen before.
    pub fn advance(&self, percent: f64) -> Option<f64> {
        let step = progress_step(percent);
        let previous = self.last_step.fetch_max(step, Ordering::Relaxed);
        (step > previous).then(|| f64::from(step) * PROGRESS_STEP_PERCENT)
    }
}

fn progress_step(percent: f64) -> u8 {
    if !percent.is_finite() {
        return 0;
    }
    (percent.clamp(0.0, 100.0) / PROGRESS_STEP_PERCENT).floor() as u8
}
