//! Best-effort loading of optional per-dataset annotation records.
//!
//! Each annotation is read independently and yields an [Annotation]: a value, nothing, or a
//! warning. A failure in one annotation never affects the others or the caller.

use crate::config::AnnotationFilenames;
use crate::models::{AnnotationField, AnnotationWarning};

use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;

/// Outcome of loading one optional annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation<T> {
    pub value: Option<T>,
    pub warning: Option<AnnotationWarning>,
}

impl<T> Annotation<T> {
    fn absent() -> Self {
        Self {
            value: None,
            warning: None,
        }
    }

    fn present(value: T) -> Self {
        Self {
            value: Some(value),
            warning: None,
        }
    }

    fn invalid(field: AnnotationField, reason: impl Into<String>) -> Self {
        Self {
            value: None,
            warning: Some(AnnotationWarning::new(field, reason)),
        }
    }
}

/// All optional annotations of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotations {
    pub worst_point_index: Annotation<usize>,
    pub nearest_pair: Annotation<Map<String, Value>>,
    pub densest_cluster: Annotation<i64>,
}

impl Annotations {
    /// Load the annotations in `dataset_dir`.
    ///
    /// # Arguments
    ///
    /// * `dataset_dir`: Dataset directory
    /// * `filenames`: Annotation file names
    /// * `row_count`: Number of rows in the projection, bounding `worst_point_index`
    pub fn load(dataset_dir: &Path, filenames: &AnnotationFilenames, row_count: usize) -> Self {
        let worst = dataset_dir.join(&filenames.worst);
        let pair = dataset_dir.join(&filenames.pair);
        let densest = dataset_dir.join(&filenames.densest);
        Self {
            worst_point_index: load_worst_point_index(&worst, row_count),
            nearest_pair: load_nearest_pair(&pair),
            densest_cluster: load_densest_cluster(&densest),
        }
    }

    /// Warnings raised by any of the annotations.
    pub fn warnings(&self) -> Vec<AnnotationWarning> {
        [
            &self.worst_point_index.warning,
            &self.nearest_pair.warning,
            &self.densest_cluster.warning,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

/// Read a JSON record. Returns `Ok(None)` if the file does not exist.
fn read_record(path: &Path) -> Result<Option<Value>, String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("failed to read: {e}")),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| format!("failed to parse: {e}"))
}

/// Read a JSON object record and extract an integer field.
fn load_integer_field(path: &Path, field: AnnotationField) -> Annotation<i64> {
    let record = match read_record(path) {
        Ok(Some(record)) => record,
        Ok(None) => return Annotation::absent(),
        Err(reason) => return Annotation::invalid(field, reason),
    };
    let Value::Object(record) = record else {
        return Annotation::invalid(field, "record is not an object");
    };
    match record.get(&field.to_string()) {
        None | Some(Value::Null) => Annotation::absent(),
        Some(value) => match value.as_i64() {
            Some(value) => Annotation::present(value),
            None => Annotation::invalid(field, format!("{value} is not an integer")),
        },
    }
}

/// Load `worst_point_index`, which must index a row of the projection.
fn load_worst_point_index(path: &Path, row_count: usize) -> Annotation<usize> {
    let field = AnnotationField::WorstPointIndex;
    let annotation = load_integer_field(path, field);
    match annotation.value {
        None => Annotation {
            value: None,
            warning: annotation.warning,
        },
        Some(index) => match usize::try_from(index) {
            Ok(index) if index < row_count => Annotation::present(index),
            _ => Annotation::invalid(
                field,
                format!("{index} is out of range for {row_count} points"),
            ),
        },
    }
}

/// Load the nearest pair record, which is passed through as long as it is an object.
fn load_nearest_pair(path: &Path) -> Annotation<Map<String, Value>> {
    let field = AnnotationField::NearestPair;
    match read_record(path) {
        Ok(Some(Value::Object(record))) => Annotation::present(record),
        Ok(Some(_)) => Annotation::invalid(field, "record is not an object"),
        Ok(None) => Annotation::absent(),
        Err(reason) => Annotation::invalid(field, reason),
    }
}

fn load_densest_cluster(path: &Path) -> Annotation<i64> {
    load_integer_field(path, AnnotationField::DensestCluster)
}
