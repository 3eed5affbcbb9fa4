//! Evaluation metrics for the built-in classifier.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Out-of-range indices are ignored.
    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

/// Share of correct predictions; 0.0 for an empty matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let correct: u64 = (0..cm.n_classes).map(|c| cm.get(c, c) as u64).sum();
    let total = cm.total();
    if total == 0 {
        0.0
    } else {
        correct as f32 / total as f32
    }
}
