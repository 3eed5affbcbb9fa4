//! Progress reporting for the initialization routine.
//!
//! The routine emits completion fractions in `[0.0, 1.0]` with a stage label.
//! Consumers (the egui controller, tests) implement [`ProgressSink`].

use std::fmt;
use std::sync::mpsc::Sender;

use crate::session::ModelKey;

/// Share of the progress budget spent on the baseline max-accuracy evaluation.
pub const BASELINE_SHARE: f32 = 0.5;

/// Step the routine is about to run or has just completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    EvaluateMax,
    /// Dataset and model construction for `key`; `position` is `(replica + 1, replicas)`.
    InitModel {
        key: ModelKey,
        position: Option<(usize, usize)>,
    },
    InitTraining {
        key: ModelKey,
        position: Option<(usize, usize)>,
    },
    Finished,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStage::EvaluateMax => f.write_str("evaluate max accuracy"),
            InitStage::InitModel { key, position } => {
                write!(f, "init model_{}", key.model)?;
                write_position(f, *position)
            }
            InitStage::InitTraining { key, position } => {
                write!(f, "init training model_{}", key.model)?;
                write_position(f, *position)
            }
            InitStage::Finished => f.write_str("setup finished"),
        }
    }
}

fn write_position(f: &mut fmt::Formatter<'_>, position: Option<(usize, usize)>) -> fmt::Result {
    match position {
        Some((current, total)) => write!(f, " [{current}/{total}]"),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub fraction: f32,
    pub stage: InitStage,
}

/// Receiver of progress updates.
pub trait ProgressSink {
    fn report(&mut self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressUpdate),
{
    fn report(&mut self, update: ProgressUpdate) {
        self(update)
    }
}

impl ProgressSink for Sender<ProgressUpdate> {
    fn report(&mut self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _update: ProgressUpdate) {}
}

/// Portion of the progress bar owned by one configured model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSlice {
    pub start: f32,
    pub end: f32,
}

impl ProgressSlice {
    /// Slice for the 1-based model `index` out of `count` models.
    ///
    /// The models split the budget left after the baseline evenly.
    pub fn for_model(index: usize, count: usize) -> Self {
        let count = count.max(1) as f32;
        let rest = 1.0 - BASELINE_SHARE;
        Self {
            start: BASELINE_SHARE + rest * (index.saturating_sub(1) as f32) / count,
            end: BASELINE_SHARE + rest * (index as f32) / count,
        }
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    /// Point at `numerator / denominator` of the way through the slice.
    pub fn at(&self, numerator: f32, denominator: f32) -> f32 {
        if denominator <= 0.0 {
            return self.end;
        }
        (self.start + self.span() * numerator / denominator).clamp(self.start, self.end)
    }

    /// Progress once replica `replica` of `replicas` has been constructed.
    pub fn after_build(&self, replica: usize, replicas: usize) -> f32 {
        self.at(replica as f32 + 0.5, replicas as f32)
    }

    /// Progress once replica `replica` of `replicas` has finished its training init.
    pub fn after_training(&self, replica: usize, replicas: usize) -> f32 {
        self.at(replica as f32 + 1.0, replicas as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_tile_the_second_half() {
        let count = 3;
        let mut previous_end = BASELINE_SHARE;
        for index in 1..=count {
            let slice = ProgressSlice::for_model(index, count);
            assert!((slice.start - previous_end).abs() < 1e-6);
            previous_end = slice.end;
        }
        assert_eq!(ProgressSlice::for_model(count, count).end, 1.0);
    }

    #[test]
    fn replica_steps_are_monotonic() {
        let slice = ProgressSlice::for_model(2, 2);
        let mut last = slice.start;
        for replica in 0..7 {
            let built = slice.after_build(replica, 7);
            let trained = slice.after_training(replica, 7);
            assert!(built >= last);
            assert!(trained >= built);
            last = trained;
        }
        assert!((last - slice.end).abs() < 1e-6);
    }

    #[test]
    fn stage_labels_include_replica_position() {
        let stage = InitStage::InitTraining {
            key: ModelKey::replica(2, 0),
            position: Some((1, 3)),
        };
        assert_eq!(stage.to_string(), "init training model_2 [1/3]");
        let stage = InitStage::InitModel {
            key: ModelKey::single(1),
            position: None,
        };
        assert_eq!(stage.to_string(), "init model_1");
    }

    #[test]
    fn closures_act_as_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |update: ProgressUpdate| seen.push(update.fraction);
            sink.report(ProgressUpdate {
                fraction: 0.25,
                stage: InitStage::EvaluateMax,
            });
        }
        assert_eq!(seen, vec![0.25]);
    }

    #[test]
    fn senders_forward_updates() {
        let (mut tx, rx) = std::sync::mpsc::channel::<ProgressUpdate>();
        tx.report(ProgressUpdate {
            fraction: 1.0,
            stage: InitStage::Finished,
        });
        drop(tx);
        let received: Vec<ProgressUpdate> = rx.iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].stage, InitStage::Finished);
    }
}
