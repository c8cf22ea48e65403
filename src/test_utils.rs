use crate::config::StoreConfig;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Encode an NPY version 1.0 file.
///
/// # Arguments
///
/// * `descr`: NumPy type descriptor, e.g. `<f8`
/// * `shape`: Array shape
/// * `fortran`: Whether `data` is in column-major order
/// * `data`: Raw element bytes
pub(crate) fn npy_bytes(descr: &str, shape: &[usize], fortran: bool, data: &[u8]) -> Vec<u8> {
    let shape = match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let fortran = if fortran { "True" } else { "False" };
    let mut header =
        format!("{{'descr': '{descr}', 'fortran_order': {fortran}, 'shape': {shape}, }}");
    // Magic (6), version (2) and header length (2) precede the header.
    let preamble = 10;
    while (preamble + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut bytes = crate::npy::MAGIC.to_vec();
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(data);
    bytes
}

/// Encode a little endian C order float64 NPY file.
pub(crate) fn npy_f64(shape: &[usize], values: &[f64]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy_bytes("<f8", shape, false, &data)
}

/// Encode a little endian C order int64 NPY file.
pub(crate) fn npy_i64(shape: &[usize], values: &[i64]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy_bytes("<i8", shape, false, &data)
}

/// A dataset store in a temporary directory, removed on drop.
pub(crate) struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Store configuration with default file names rooted at this store.
    pub(crate) fn config(&self) -> Arc<StoreConfig> {
        Arc::new(StoreConfig::new(self.path()))
    }

    /// Write a file into a dataset, creating the dataset if necessary.
    pub(crate) fn write(&self, dataset: &str, file_name: &str, contents: &[u8]) -> PathBuf {
        let dataset_dir = self.path().join(dataset);
        std::fs::create_dir_all(&dataset_dir).unwrap();
        let path = dataset_dir.join(file_name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Write integer labels to the default label file.
    pub(crate) fn add_labels(&self, dataset: &str, labels: &[i64]) {
        self.write(dataset, "labels.npy", &npy_i64(&[labels.len()], labels));
    }

    /// Write a two dimensional projection with one row per point.
    pub(crate) fn add_projection(&self, dataset: &str, name: &str, points: &[[f64; 2]]) {
        let values: Vec<f64> = points.iter().flatten().copied().collect();
        let file_name = format!("{name}.npy");
        self.write(dataset, &file_name, &npy_f64(&[points.len(), 2], &values));
    }
}
