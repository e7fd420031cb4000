//! Cosmetic step animation shown while a document is being analyzed.
//!
//! Nothing here observes the real request. The cursor only moves on timer ticks.

use std::time::Duration;

use shared::domain::AnalysisStep;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

pub const STEP_INTERVAL: Duration = Duration::from_millis(800);

const STEP_LABELS: [&str; 6] = [
    "Uploading and parsing document structure",
    "Extracting text and identifying key sections",
    "Analyzing parties and stakeholders",
    "Identifying terms, conditions, and obligations",
    "Assessing legal risks and compliance issues",
    "Generating comprehensive summary and insights",
];

pub const STEP_COUNT: usize = STEP_LABELS.len();

/// Fresh catalogue with every flag cleared.
pub fn analysis_steps() -> Vec<AnalysisStep> {
    STEP_LABELS
        .iter()
        .zip(1u32..)
        .map(|(label, id)| AnalysisStep::pending(id, *label))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCursor {
    next: usize,
}

impl StepCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self, steps: &[AnalysisStep]) -> bool {
        self.next >= steps.len()
    }

    /// Applies one tick: steps before the cursor become completed, the step at
    /// the cursor becomes current. Returns `false` once the catalogue is
    /// exhausted, leaving `steps` untouched.
    pub fn advance(&mut self, steps: &mut [AnalysisStep]) -> bool {
        if self.is_exhausted(steps) {
            return false;
        }

        for (index, step) in steps.iter_mut().enumerate() {
            step.completed = index < self.next;
            step.current = index == self.next;
        }
        self.next += 1;
        true
    }
}

pub fn completed_count(steps: &[AnalysisStep]) -> usize {
    steps.iter().filter(|step| step.completed).count()
}

/// Fires `on_tick` every `period`, at most `ticks` times, first fire one
/// period after spawning. Stops early when `on_tick` returns `false`.
pub fn spawn_ticker<F>(period: Duration, ticks: usize, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut(usize) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for index in 0..ticks {
            timer.tick().await;
            if !on_tick(index) {
                tracing::debug!(tick = index, "progress ticker receiver gone");
                break;
            }
        }
    })
}
