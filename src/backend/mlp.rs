//! Single hidden layer MLP with dropout kept active at inference (MC dropout).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::settings::LearnerSettings;

/// Hyperparameters for [`MlpClassifier::train`].
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub hidden_size: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub l2_penalty: f32,
    pub dropout: f32,
    /// Stochastic forward passes averaged per prediction.
    pub mc_passes: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self::from(&LearnerSettings::default())
    }
}

impl From<&LearnerSettings> for TrainOptions {
    fn from(settings: &LearnerSettings) -> Self {
        Self {
            hidden_size: settings.hidden_size,
            epochs: settings.epochs,
            batch_size: settings.batch_size,
            learning_rate: settings.learning_rate,
            l2_penalty: 1e-4,
            dropout: settings.dropout,
            mc_passes: settings.mc_passes,
        }
    }
}

/// Rows to train on, borrowed from a dataset.
pub struct TrainSet<'a> {
    pub rows: Vec<&'a [f32]>,
    pub targets: Vec<usize>,
    pub n_classes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MlpClassifier {
    input_len: usize,
    hidden_size: usize,
    n_classes: usize,
    dropout: f32,
    mc_passes: usize,
    weights1: Vec<f32>,
    bias1: Vec<f32>,
    weights2: Vec<f32>,
    bias2: Vec<f32>,
    feature_mean: Vec<f32>,
    feature_std: Vec<f32>,
}

impl MlpClassifier {
    pub fn train(
        set: &TrainSet<'_>,
        options: &TrainOptions,
        rng: &mut impl Rng,
    ) -> Result<Self, String> {
        if set.rows.len() != set.targets.len() {
            return Err("Mismatched X/Y lengths".to_string());
        }
        if set.rows.is_empty() {
            return Err("Empty training set".to_string());
        }
        if set.n_classes < 2 {
            return Err("Need at least 2 classes".to_string());
        }
        let d = set.rows[0].len();
        if set.rows.iter().any(|row| row.len() != d) {
            return Err("Rows have different lengths".to_string());
        }
        let hidden = options.hidden_size.max(1);
        let n_classes = set.n_classes;
        let dropout = options.dropout.clamp(0.0, 0.9);
        let (feature_mean, feature_std) = feature_mean_std(&set.rows, d);

        let mut model = Self {
            input_len: d,
            hidden_size: hidden,
            n_classes,
            dropout,
            mc_passes: options.mc_passes.max(1),
            weights1: (0..hidden * d)
                .map(|_| (rng.random::<f32>() - 0.5) * 0.1)
                .collect(),
            bias1: vec![0.0; hidden],
            weights2: (0..n_classes * hidden)
                .map(|_| (rng.random::<f32>() - 0.5) * 0.1)
                .collect(),
            bias2: vec![0.0; n_classes],
            feature_mean,
            feature_std,
        };

        let mut indices: Vec<usize> = (0..set.rows.len()).collect();
        let mut hidden_pre = vec![0.0f32; hidden];
        let mut hidden_act = vec![0.0f32; hidden];
        let mut probs = vec![0.0f32; n_classes];
        for _epoch in 0..options.epochs {
            indices.shuffle(rng);
            for batch in indices.chunks(options.batch_size.max(1)) {
                let mut d_w1 = vec![0.0f32; model.weights1.len()];
                let mut d_b1 = vec![0.0f32; hidden];
                let mut d_w2 = vec![0.0f32; model.weights2.len()];
                let mut d_b2 = vec![0.0f32; n_classes];

                for &idx in batch {
                    let x = model.normalize(set.rows[idx]);
                    model.forward(&x, &mut hidden_pre, &mut hidden_act, &mut probs, Some(&mut *rng));
                    let y = set.targets[idx];
                    if y >= n_classes {
                        continue;
                    }
                    let mut d_hidden = vec![0.0f32; hidden];
                    for c in 0..n_classes {
                        let target = if c == y { 1.0 } else { 0.0 };
                        let dz2 = probs[c] - target;
                        d_b2[c] += dz2;
                        let base = c * hidden;
                        for h in 0..hidden {
                            d_w2[base + h] += dz2 * hidden_act[h];
                            d_hidden[h] += dz2 * model.weights2[base + h];
                        }
                    }
                    for h in 0..hidden {
                        if hidden_pre[h] <= 0.0 || hidden_act[h] == 0.0 {
                            continue;
                        }
                        d_b1[h] += d_hidden[h];
                        let base = h * d;
                        for i in 0..d {
                            d_w1[base + i] += d_hidden[h] * x[i];
                        }
                    }
                }

                let scale = options.learning_rate / batch.len() as f32;
                let l2 = options.l2_penalty;
                for (w, g) in model.weights1.iter_mut().zip(&d_w1) {
                    *w -= scale * (g + l2 * *w);
                }
                for (b, g) in model.bias1.iter_mut().zip(&d_b1) {
                    *b -= scale * g;
                }
                for (w, g) in model.weights2.iter_mut().zip(&d_w2) {
                    *w -= scale * (g + l2 * *w);
                }
                for (b, g) in model.bias2.iter_mut().zip(&d_b2) {
                    *b -= scale * g;
                }
            }
        }
        Ok(model)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class probabilities averaged over `mc_passes` dropout samples.
    pub fn predict_proba(&self, features: &[f32], rng: &mut impl Rng) -> Vec<f32> {
        if features.len() != self.input_len {
            return Vec::new();
        }
        self.mc_samples(features, rng)
            .into_iter()
            .fold(vec![0.0f32; self.n_classes], |mut acc, sample| {
                for (a, p) in acc.iter_mut().zip(sample) {
                    *a += p;
                }
                acc
            })
            .into_iter()
            .map(|sum| sum / self.mc_passes as f32)
            .collect()
    }

    /// One probability vector per stochastic forward pass.
    pub fn mc_samples(&self, features: &[f32], rng: &mut impl Rng) -> Vec<Vec<f32>> {
        if features.len() != self.input_len {
            return Vec::new();
        }
        let x = self.normalize(features);
        let mut hidden_pre = vec![0.0f32; self.hidden_size];
        let mut hidden_act = vec![0.0f32; self.hidden_size];
        (0..self.mc_passes)
            .map(|_| {
                let mut probs = vec![0.0f32; self.n_classes];
                self.forward(&x, &mut hidden_pre, &mut hidden_act, &mut probs, Some(&mut *rng));
                probs
            })
            .collect()
    }

    pub fn predict_class_index(&self, features: &[f32], rng: &mut impl Rng) -> usize {
        argmax(&self.predict_proba(features, rng))
    }

    fn normalize(&self, features: &[f32]) -> Vec<f32> {
        features
            .iter()
            .zip(self.feature_mean.iter().zip(&self.feature_std))
            .map(|(x, (mean, std))| (x - mean) / std.max(1e-6))
            .collect()
    }

    fn forward<R: Rng>(
        &self,
        x: &[f32],
        hidden_pre: &mut [f32],
        hidden_act: &mut [f32],
        probs: &mut [f32],
        mut rng: Option<&mut R>,
    ) {
        let d = self.input_len;
        for h in 0..self.hidden_size {
            let base = h * d;
            let mut sum = self.bias1[h];
            for i in 0..d {
                sum += self.weights1[base + i] * x[i];
            }
            hidden_pre[h] = sum;
            let mut act = sum.max(0.0);
            if let Some(rng) = rng.as_deref_mut().filter(|_| self.dropout > 0.0) {
                if rng.random::<f32>() > self.dropout {
                    act /= 1.0 - self.dropout;
                } else {
                    act = 0.0;
                }
            }
            hidden_act[h] = act;
        }
        let mut logits = vec![0.0f32; self.n_classes];
        for (c, logit) in logits.iter_mut().enumerate() {
            let base = c * self.hidden_size;
            *logit = self.bias2[c]
                + (0..self.hidden_size)
                    .map(|h| self.weights2[base + h] * hidden_act[h])
                    .sum::<f32>();
        }
        softmax_inplace(&logits, probs);
    }
}

pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = idx;
        }
    }
    best
}

fn feature_mean_std(rows: &[&[f32]], d: usize) -> (Vec<f32>, Vec<f32>) {
    let n = rows.len().max(1) as f32;
    let mut mean = vec![0.0f32; d];
    for row in rows {
        for i in 0..d {
            mean[i] += row[i];
        }
    }
    for v in &mut mean {
        *v /= n;
    }
    let mut std = vec![0.0f32; d];
    for row in rows {
        for i in 0..d {
            let diff = row[i] - mean[i];
            std[i] += diff * diff;
        }
    }
    for v in &mut std {
        *v = (*v / n).sqrt();
    }
    (mean, std)
}

fn softmax_inplace(raw: &[f32], out: &mut [f32]) {
    if raw.is_empty() || out.is_empty() {
        return;
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for (o, &v) in out.iter_mut().zip(raw) {
        *o = (v - max).exp();
        sum += *o;
    }
    if sum == 0.0 || !sum.is_finite() {
        out.fill(1.0 / raw.len() as f32);
        return;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}
