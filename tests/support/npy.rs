use std::path::{Path, PathBuf};

use aclearn::backend::npy::{encode_f32, encode_i64};
use aclearn::uploads::UploadedFile;

/// `rows` samples of `width` features with labels cycling through `classes`.
pub fn blob_arrays(rows: usize, width: usize, classes: i64) -> (Vec<u8>, Vec<u8>) {
    let mut values = Vec::with_capacity(rows * width);
    let mut labels = Vec::with_capacity(rows);
    for row in 0..rows {
        let class = row as i64 % classes;
        for col in 0..width {
            values.push(class as f32 * 2.0 + (row % 5) as f32 * 0.05 + col as f32 * 0.01);
        }
        labels.push(class);
    }
    (
        encode_f32(&[rows, width], &values),
        encode_i64(&[rows], &labels),
    )
}

/// Write a data/labels pair into `dir` and return both paths.
pub fn write_blobs(dir: &Path, rows: usize, classes: i64) -> (PathBuf, PathBuf) {
    let (data, labels) = blob_arrays(rows, 3, classes);
    let data_path = dir.join("x_train.npy");
    let labels_path = dir.join("y_train.npy");
    std::fs::write(&data_path, data).expect("write data");
    std::fs::write(&labels_path, labels).expect("write labels");
    (data_path, labels_path)
}

pub fn uploaded(name: &str, bytes: Vec<u8>) -> UploadedFile {
    UploadedFile {
        name: name.to_string(),
        bytes,
    }
}
