use std::sync::Mutex;

/// Which export operation is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Single PNG still.
    Image,
    /// Encoded video file.
    Video,
    /// Directory of numbered stills.
    Sequence,
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Sequence => "sequence",
        })
    }
}

/// Stage of a running export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportStage {
    /// Offscreen session entered, nothing rendered yet.
    SessionActive,
    /// Timeline moved, camera updated, waiting for sorting.
    PreparingFrame,
    /// Rendering and reading back.
    Capturing,
    /// Adding a sample to the motion blur sum.
    Accumulating,
    /// Handing the finished frame to the sink.
    Encoding,
    /// Flushing the sink and restoring the renderer.
    Finalizing,
}

/// Host UI surface for export progress.
///
/// There is no abort hook here: a running export is stopped through
/// [`crate::CancelFlag`].
pub trait ProgressReporter: Send + Sync {
    /// An export started.
    fn started(&self, kind: ExportKind);

    /// `percent` is in `[0, 100]`.
    fn progress(&self, percent: f64, stage: ExportStage, label: &str);

    /// The export failed; `message` is user-facing.
    fn failed(&self, message: &str);

    /// The export ended, successfully or not.
    fn finished(&self, kind: ExportKind);
}

/// Reporter that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn started(&self, kind: ExportKind) {
        tracing::info!(%kind, "export started");
    }

    fn progress(&self, percent: f64, stage: ExportStage, label: &str) {
        tracing::debug!(percent = format!("{percent:.1}"), ?stage, "{label}");
    }

    fn failed(&self, message: &str) {
        tracing::error!("export failed: {message}");
    }

    fn finished(&self, kind: ExportKind) {
        tracing::info!(%kind, "export finished");
    }
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn started(&self, _kind: ExportKind) {}
    fn progress(&self, _percent: f64, _stage: ExportStage, _label: &str) {}
    fn failed(&self, _message: &str) {}
    fn finished(&self, _kind: ExportKind) {}
}

/// Event captured by [`RecordingProgress`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// See [`ProgressReporter::started`].
    Started(ExportKind),
    /// See [`ProgressReporter::progress`].
    Progress {
        /// Percent complete.
        percent: f64,
        /// Stage at the time of the report.
        stage: ExportStage,
    },
    /// See [`ProgressReporter::failed`].
    Failed(String),
    /// See [`ProgressReporter::finished`].
    Finished(ExportKind),
}

/// Reporter that keeps every event, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    /// Percent values reported for `stage`, in order.
    pub fn percents(&self, stage: ExportStage) -> Vec<f64> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { percent, stage: s } if *s == stage => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, event: ProgressEvent) {
        self.lock().push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn started(&self, kind: ExportKind) {
        self.push(ProgressEvent::Started(kind));
    }

    fn progress(&self, percent: f64, stage: ExportStage, _label: &str) {
        self.push(ProgressEvent::Progress { percent, stage });
    }

    fn failed(&self, message: &str) {
        self.push(ProgressEvent::Failed(message.to_string()));
    }

    fn finished(&self, kind: ExportKind) {
        self.push(ProgressEvent::Finished(kind));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/progress.rs"]
mod tests;
