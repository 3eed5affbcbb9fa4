//! In-memory dataset built from a pair of `.npy` files.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;

use super::npy::{self, NpyArray};
use super::{BackendError, DatasetSource, ExperimentDataset};

/// Rows, class indices and the labeled/unlabeled/holdout split.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDataset {
    source: DatasetSource,
    pub(crate) row_len: usize,
    /// Row-major features, `len() * row_len` values.
    pub(crate) features: Vec<f32>,
    pub(crate) targets: Vec<usize>,
    classes: Vec<String>,
    pub(crate) labeled: Vec<usize>,
    pub(crate) unlabeled: Vec<usize>,
    /// Rows reserved for accuracy measurements; never labeled or queried.
    pub(crate) holdout: Vec<usize>,
}

impl ArrayDataset {
    /// Load and split a dataset.
    ///
    /// Up to `size_init_per_class` random rows of every class form the labeled pool.
    /// `holdout_fraction` of the remaining rows is kept aside for evaluation.
    pub fn load(
        source: &DatasetSource,
        size_init_per_class: usize,
        holdout_fraction: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, BackendError> {
        let data = read_array(&source.data_path)?;
        let labels = read_array(&source.labels_path)?;
        Self::from_arrays(
            source.clone(),
            data,
            labels,
            size_init_per_class,
            holdout_fraction,
            rng,
        )
    }

    pub fn from_arrays(
        source: DatasetSource,
        data: NpyArray,
        labels: NpyArray,
        size_init_per_class: usize,
        holdout_fraction: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, BackendError> {
        let rows = data.rows();
        if rows == 0 || data.values.is_empty() {
            return Err(BackendError::EmptyDataset);
        }
        let raw_targets = label_values(&labels);
        if raw_targets.len() != rows {
            return Err(BackendError::RowMismatch {
                rows,
                labels: raw_targets.len(),
            });
        }
        let (classes, targets) = index_classes(&raw_targets);
        if classes.len() < 2 {
            return Err(BackendError::TooFewClasses(classes.len()));
        }

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (row, &class) in targets.iter().enumerate() {
            by_class.entry(class).or_default().push(row);
        }
        let mut labeled = Vec::new();
        let mut rest = Vec::new();
        for rows_of_class in by_class.values_mut() {
            rows_of_class.shuffle(rng);
            let take = size_init_per_class.min(rows_of_class.len());
            labeled.extend_from_slice(&rows_of_class[..take]);
            rest.extend_from_slice(&rows_of_class[take..]);
        }
        labeled.sort_unstable();
        rest.shuffle(rng);
        let holdout_len = holdout_len(rest.len(), holdout_fraction);
        let mut holdout = rest.split_off(rest.len() - holdout_len);
        holdout.sort_unstable();
        rest.sort_unstable();

        Ok(Self {
            source,
            row_len: data.row_len().max(1),
            features: data.values,
            targets,
            classes,
            labeled,
            unlabeled: rest,
            holdout,
        })
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.row_len;
        &self.features[start..start + self.row_len]
    }

    pub fn target(&self, index: usize) -> usize {
        self.targets[index]
    }

    pub fn labeled_rows(&self) -> &[usize] {
        &self.labeled
    }

    pub fn unlabeled_rows(&self) -> &[usize] {
        &self.unlabeled
    }

    pub fn holdout_rows(&self) -> &[usize] {
        &self.holdout
    }

    /// Every row outside the holdout, i.e. what a fully labeled run trains on.
    pub fn trainable_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .labeled
            .iter()
            .chain(self.unlabeled.iter())
            .copied()
            .collect();
        rows.sort_unstable();
        rows
    }
}

impl ExperimentDataset for ArrayDataset {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn len(&self) -> usize {
        self.targets.len()
    }

    fn labeled_len(&self) -> usize {
        self.labeled.len()
    }

    fn source(&self) -> &DatasetSource {
        &self.source
    }

    fn clone_dataset(&self) -> Box<dyn ExperimentDataset> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn read_array(path: &Path) -> Result<NpyArray, BackendError> {
    let bytes = std::fs::read(path).map_err(|source| BackendError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    npy::parse(&bytes).map_err(|source| BackendError::Npy {
        path: path.to_path_buf(),
        source,
    })
}

/// One label value per row; one-hot rows collapse to their argmax column.
fn label_values(labels: &NpyArray) -> Vec<f32> {
    let width = labels.row_len();
    if labels.shape.len() < 2 || width <= 1 {
        return labels.values.clone();
    }
    labels
        .values
        .chunks_exact(width)
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (idx, &v)| {
                    if v > best.1 { (idx, v) } else { best }
                })
                .0 as f32
        })
        .collect()
}

/// Sorted distinct label values and each row's index into them.
fn index_classes(values: &[f32]) -> (Vec<String>, Vec<usize>) {
    let mut distinct: Vec<f32> = values.to_vec();
    distinct.sort_by(f32::total_cmp);
    distinct.dedup();
    let targets = values
        .iter()
        .map(|v| {
            distinct
                .binary_search_by(|probe| probe.total_cmp(v))
                .unwrap_or_default()
        })
        .collect();
    let names = distinct.iter().map(|v| class_name(*v)).collect();
    (names, targets)
}

fn class_name(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn holdout_len(available: usize, fraction: f32) -> usize {
    if available < 2 {
        return 0;
    }
    let wanted = (available as f32 * fraction.clamp(0.0, 0.9)).round() as usize;
    wanted.clamp(1, available - 1)
}
