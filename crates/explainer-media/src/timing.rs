//! Dialogue timing.
//!
//! Turns a script plus a narration duration into one contiguous window per
//! line. Two modes are supported:
//! - proportional: each line gets a share of the total equal to its share of
//!   the script's characters
//! - measured: windows follow the per-line audio segments produced by the
//!   voiceover step
//!
//! Whichever mode is used, the windows start at 0, end exactly at the total
//! duration and never overlap or leave gaps.

use explainer_models::{AudioSegment, DialogueLine, TimingWindow};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Which data the windows were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    Proportional,
    Measured,
}

/// Compute windows, preferring measured segments when they cover every line.
pub fn compute_windows(
    lines: &[DialogueLine],
    total_duration: f64,
    segments: Option<&[AudioSegment]>,
) -> MediaResult<(Vec<TimingWindow>, TimingMode)> {
    if let Some(segments) = segments {
        if let Some(windows) = measured_windows(lines, total_duration, segments)? {
            return Ok((windows, TimingMode::Measured));
        }
        debug!(
            lines = lines.len(),
            segments = segments.len(),
            "Audio segments do not cover every line, falling back to proportional timing"
        );
    }
    Ok((
        proportional_windows(lines, total_duration)?,
        TimingMode::Proportional,
    ))
}

/// Allocate `total_duration` across lines in proportion to their character count.
pub fn proportional_windows(
    lines: &[DialogueLine],
    total_duration: f64,
) -> MediaResult<Vec<TimingWindow>> {
    validate_duration(total_duration)?;
    if lines.is_empty() {
        return Err(MediaError::validation("cannot time an empty script"));
    }

    let total_chars: usize = lines.iter().map(DialogueLine::char_len).sum();
    if total_chars == 0 {
        return Err(MediaError::validation(
            "cannot time a script whose lines contain no text",
        ));
    }

    let mut windows = Vec::with_capacity(lines.len());
    let mut cursor = 0.0;
    for (i, line) in lines.iter().enumerate() {
        let end = if i + 1 == lines.len() {
            total_duration
        } else {
            let share = total_duration * (line.char_len() as f64 / total_chars as f64);
            (cursor + share).min(total_duration)
        };
        windows.push(TimingWindow::new(cursor, end, line.speaker_role));
        cursor = end;
    }
    Ok(windows)
}

/// Build windows from measured segments.
///
/// Returns `Ok(None)` when the segments do not match the lines one to one by
/// scene number, so the caller can fall back to proportional timing.
pub fn measured_windows(
    lines: &[DialogueLine],
    total_duration: f64,
    segments: &[AudioSegment],
) -> MediaResult<Option<Vec<TimingWindow>>> {
    validate_duration(total_duration)?;
    if lines.is_empty() {
        return Err(MediaError::validation("cannot time an empty script"));
    }
    if segments.len() != lines.len() {
        return Ok(None);
    }

    let mut durations = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(segment) = segments
            .iter()
            .find(|s| s.scene_number == line.scene_number)
        else {
            return Ok(None);
        };
        if !segment.duration_seconds.is_finite() || segment.duration_seconds < 0.0 {
            return Ok(None);
        }
        durations.push(segment.duration_seconds);
    }

    // Segments are laid end to end in the combined file, so cumulative sums
    // reproduce their start offsets without trusting stored start times.
    let mut windows = Vec::with_capacity(lines.len());
    let mut cursor = 0.0_f64;
    for (i, (line, duration)) in lines.iter().zip(durations).enumerate() {
        let end = if i + 1 == lines.len() {
            total_duration
        } else {
            (cursor + duration).min(total_duration)
        };
        windows.push(TimingWindow::new(cursor, end, line.speaker_role));
        cursor = end;
    }
    Ok(Some(windows))
}

fn validate_duration(total_duration: f64) -> MediaResult<()> {
    if !total_duration.is_finite() || total_duration < 0.0 {
        return Err(MediaError::validation(format!(
            "invalid narration duration: {}",
            total_duration
        )));
    }
    Ok(())
}
