use crate::foundation::core::CameraPose;
use crate::host::scene::{Scene, SortSignal};
use std::time::Duration;

/// How long to wait for a sort-complete signal before assuming the sort was a no-op.
pub const SORT_FALLBACK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Per-call sort statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortReport {
    /// Point clouds asked to sort.
    pub clouds: usize,
    /// Clouds that signalled completion.
    pub completed: usize,
    /// Clouds whose wait hit the fallback timeout.
    pub timed_out: usize,
    /// Clouds that reported an idle sorter up front.
    pub idle: usize,
}

/// What [`FramePreparer::prepare`] did after moving the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// The camera has not moved since the last sort; the order is still valid.
    PoseUnchanged,
    /// The caller asked to reuse the previous order.
    SortSkipped,
    /// Every visible point cloud was sorted (or timed out).
    Sorted(SortReport),
}

/// Moves the scene to a timeline position and waits for depth sorting to settle.
#[derive(Clone, Debug)]
pub struct FramePreparer {
    sorted_pose: Option<CameraPose>,
    force_sort: bool,
    sort_timeout: Duration,
}

impl Default for FramePreparer {
    fn default() -> Self {
        Self::new(SORT_FALLBACK_TIMEOUT)
    }
}

impl FramePreparer {
    /// Create a preparer whose first call always sorts.
    pub fn new(sort_timeout: Duration) -> Self {
        Self {
            sorted_pose: None,
            force_sort: true,
            sort_timeout,
        }
    }

    /// Make the next non-skipped call sort even if the camera has not moved.
    pub fn force_next_sort(&mut self) {
        self.force_sort = true;
    }

    /// Set the timeline to `time_secs`, apply the camera, and sort if needed.
    ///
    /// The pose is compared against the last pose that was actually sorted, so a pose reached
    /// while `skip_sort` was set still gets sorted on the next regular call.
    pub async fn prepare<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        time_secs: f64,
        skip_sort: bool,
    ) -> PrepareOutcome {
        scene.set_time(time_secs);
        scene.update_camera(0.0);
        let pose = scene.camera_pose();

        if !self.force_sort && self.sorted_pose == Some(pose) {
            return PrepareOutcome::PoseUnchanged;
        }
        if skip_sort {
            return PrepareOutcome::SortSkipped;
        }

        let signals: Vec<SortSignal> = scene
            .visible_point_clouds()
            .into_iter()
            .map(|cloud| scene.request_sort(cloud))
            .collect();
        let report = await_sorts(signals, self.sort_timeout).await;
        if report.timed_out > 0 {
            tracing::warn!(
                timed_out = report.timed_out,
                clouds = report.clouds,
                timeout_ms = self.sort_timeout.as_millis() as u64,
                "sort completion not signalled; continuing after timeout"
            );
        }

        self.sorted_pose = Some(pose);
        self.force_sort = false;
        PrepareOutcome::Sorted(report)
    }
}

enum SortWait {
    Completed,
    TimedOut,
    Idle,
}

async fn await_sorts(signals: Vec<SortSignal>, timeout: Duration) -> SortReport {
    let mut report = SortReport {
        clouds: signals.len(),
        ..SortReport::default()
    };

    let waits = signals.into_iter().map(|signal| async move {
        match signal {
            SortSignal::Idle => SortWait::Idle,
            SortSignal::Pending(rx) => match tokio::time::timeout(timeout, rx).await {
                // A dropped sender means the sorter went away; nothing more will change.
                Ok(_) => SortWait::Completed,
                Err(_) => SortWait::TimedOut,
            },
        }
    });

    for wait in futures::future::join_all(waits).await {
        match wait {
            SortWait::Completed => report.completed += 1,
            SortWait::TimedOut => report.timed_out += 1,
            SortWait::Idle => report.idle += 1,
        }
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/capture/prepare.rs"]
mod tests;
