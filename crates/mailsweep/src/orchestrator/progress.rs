use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scan,
    Unsubscribe,
}

/// Progress after one item of a run has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: Stage,
    /// One-based index of the item just handled.
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Receives progress updates. Called synchronously, once per item.
pub trait ProgressReporter {
    fn report(&self, progress: Progress);
}

/// No-op reporter for callers that don't track progress.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _progress: Progress) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(Progress),
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}
