use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{CaptureError, CaptureResult};

/// One render of the scene at a timeline position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedSample {
    /// Timeline position in seconds.
    pub time_secs: f64,
    /// Reuse the current sort order instead of re-sorting.
    pub skip_sort: bool,
    /// Add the capture to the blur sum. `false` in a blur group marks the warm-up render.
    pub accumulate: bool,
}

/// One exported frame and the renders that produce it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedFrame {
    /// Export frame number handed to the sink.
    pub index: FrameIndex,
    /// Renders in order.
    pub samples: Vec<PlannedSample>,
}

impl PlannedFrame {
    /// Return `true` when the frame is averaged from accumulated samples.
    pub fn is_blurred(&self) -> bool {
        self.samples.iter().any(|s| s.accumulate)
    }
}

/// Every frame an export will produce, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportPlan {
    /// Frames in strictly increasing index order.
    pub frames: Vec<PlannedFrame>,
}

impl ExportPlan {
    /// Number of exported frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when nothing will be exported.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of renders across all frames.
    pub fn total_samples(&self) -> usize {
        self.frames.iter().map(|f| f.samples.len()).sum()
    }

    /// Return `true` when any frame needs a blur accumulator.
    pub fn needs_accumulator(&self) -> bool {
        self.frames.iter().any(PlannedFrame::is_blurred)
    }
}

fn single(time_secs: f64) -> PlannedSample {
    PlannedSample {
        time_secs,
        skip_sort: false,
        accumulate: false,
    }
}

/// One frame at the scene's current time.
pub fn image_plan(current_time: f64) -> ExportPlan {
    ExportPlan {
        frames: vec![PlannedFrame {
            index: FrameIndex(0),
            samples: vec![single(current_time)],
        }],
    }
}

/// Resample the timeline frames `range` at the output rate `fps`.
///
/// Yields `floor(duration * fps) + 1` frames starting at the range's first frame.
pub fn video_plan(range: FrameRange, timeline_fps: Fps, fps: Fps) -> CaptureResult<ExportPlan> {
    if range.is_empty() {
        return Err(CaptureError::validation("video export range is empty"));
    }
    timeline_fps.validate()?;
    fps.validate()?;

    let last = range.end.0 - 1;
    let start_secs = timeline_fps.frames_to_secs(range.start.0);
    let duration = timeline_fps.frames_to_secs(last) - start_secs;
    // Nudge so exact multiples survive float error.
    let count = (duration * fps.as_f64() + 1e-9).floor() as u64 + 1;

    let frames = (0..count)
        .map(|k| PlannedFrame {
            index: FrameIndex(k),
            samples: vec![single(start_secs + fps.frames_to_secs(k))],
        })
        .collect();
    Ok(ExportPlan { frames })
}

/// Renders for one blur group over the timeline positions `times`.
///
/// A lone frame is sorted and accumulated on its own. Larger groups render the first frame as a
/// warm-up (not accumulated, no sort), sort on the second, and reuse that order for the rest.
pub fn blur_group(times: &[f64]) -> Vec<PlannedSample> {
    if let [t] = times {
        return vec![PlannedSample {
            time_secs: *t,
            skip_sort: false,
            accumulate: true,
        }];
    }
    times
        .iter()
        .enumerate()
        .map(|(i, &time_secs)| PlannedSample {
            time_secs,
            skip_sort: i != 1,
            accumulate: i != 0,
        })
        .collect()
}

/// Chunk timeline frames `range` into blur groups of `samples` frames each.
///
/// Group `g` is exported as frame `range.start + g`; `samples == 1` disables blur.
pub fn sequence_plan(
    range: FrameRange,
    timeline_fps: Fps,
    samples: u32,
) -> CaptureResult<ExportPlan> {
    if range.is_empty() {
        return Err(CaptureError::validation("sequence export range is empty"));
    }
    if samples == 0 {
        return Err(CaptureError::validation(
            "motion blur sample count must be >= 1",
        ));
    }
    timeline_fps.validate()?;

    let source: Vec<u64> = range.iter().map(|f| f.0).collect();
    let frames = source
        .chunks(samples as usize)
        .enumerate()
        .map(|(g, group)| {
            let times: Vec<f64> = group
                .iter()
                .map(|&f| timeline_fps.frames_to_secs(f))
                .collect();
            PlannedFrame {
                index: FrameIndex(range.start.0 + g as u64),
                samples: if samples == 1 {
                    vec![single(times[0])]
                } else {
                    blur_group(&times)
                },
            }
        })
        .collect();
    Ok(ExportPlan { frames })
}

#[cfg(test)]
#[path = "../../tests/unit/export/plan.rs"]
mod tests;
