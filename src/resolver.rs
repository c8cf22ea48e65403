//! Retrieval of a single projection merged with its labels and annotations.

use crate::annotations::Annotations;
use crate::array;
use crate::config::{StoreConfig, ARRAY_EXTENSION};
use crate::error::ProjectionServerError;
use crate::metrics;
use crate::models::{ProjectionKey, Resolved, ResolvedProjection};
use crate::npy;

use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use validator::Validate;

/// Resolves projections against the store.
#[derive(Clone, Debug)]
pub struct ProjectionResolver {
    config: Arc<StoreConfig>,
}

impl ProjectionResolver {
    pub fn new(config: Arc<StoreConfig>) -> Self {
        Self { config }
    }

    /// Load a projection, its dataset's labels and any annotations.
    ///
    /// The projection and labels are mandatory; any failure loading them fails the whole request.
    /// Annotations are optional; problems with them are reported as warnings in the result and
    /// the affected fields are `None`.
    ///
    /// # Arguments
    ///
    /// * `dataset`: Untrusted dataset name
    /// * `projection`: Untrusted projection name
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub fn resolve(
        &self,
        dataset: &str,
        projection: &str,
    ) -> Result<Resolved, ProjectionServerError> {
        let key = ProjectionKey::new(dataset, projection);
        // Must happen before the names touch the filesystem.
        key.validate()?;

        let dataset_dir = self.config.store_root.join(&key.dataset);
        if !dataset_dir.is_dir() {
            return Err(ProjectionServerError::DatasetNotFound {
                dataset: key.dataset,
            });
        }

        let x = self.load_projection(&dataset_dir, &key)?;
        let y = self.load_labels(&dataset_dir, &key.dataset)?;
        if x.len() != y.len() {
            tracing::debug!(rows = x.len(), labels = y.len(), "row and label counts differ");
        }

        let annotations = Annotations::load(
            &dataset_dir,
            &self.config.annotation_filenames,
            x.len(),
        );
        let warnings = annotations.warnings();
        for warning in &warnings {
            tracing::warn!(
                dataset = %key.dataset,
                projection = %key.projection,
                field = %warning.field,
                "ignoring annotation: {}",
                warning.reason
            );
            metrics::record_annotation_warning(warning.field);
        }

        Ok(Resolved {
            document: ResolvedProjection {
                x,
                y,
                worst_point_index: annotations.worst_point_index.value,
                nearest_pair: annotations.nearest_pair.value,
                densest_cluster: annotations.densest_cluster.value,
            },
            warnings,
        })
    }

    /// Load the point rows of a projection.
    fn load_projection(
        &self,
        dataset_dir: &Path,
        key: &ProjectionKey,
    ) -> Result<Vec<Vec<f64>>, ProjectionServerError> {
        let file_name = format!("{}.{}", key.projection, ARRAY_EXTENSION);
        let not_found = || ProjectionServerError::ProjectionNotFound {
            dataset: key.dataset.clone(),
            projection: key.projection.clone(),
        };
        if file_name == self.config.label_filename {
            return Err(not_found());
        }
        let path = format!("{}/{}", key.dataset, file_name);
        let bytes = match std::fs::read(dataset_dir.join(&file_name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(source) => return Err(ProjectionServerError::ReadFile { path, source }),
        };
        npy::decode(&bytes)
            .and_then(array::to_rows)
            .map_err(|source| ProjectionServerError::MalformedArray { path, source })
    }

    /// Load the labels of a dataset.
    ///
    /// The label file is either an NPY array or JSON. JSON labels are either a bare array or a
    /// record with a `labels` array; other fields of the record are ignored.
    fn load_labels(
        &self,
        dataset_dir: &Path,
        dataset: &str,
    ) -> Result<Vec<Value>, ProjectionServerError> {
        let file_name = &self.config.label_filename;
        let path = format!("{}/{}", dataset, file_name);
        let bytes = match std::fs::read(dataset_dir.join(file_name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProjectionServerError::LabelsNotFound {
                    dataset: dataset.to_string(),
                })
            }
            Err(source) => return Err(ProjectionServerError::ReadFile { path, source }),
        };

        if bytes.starts_with(npy::MAGIC) {
            return npy::decode(&bytes)
                .and_then(array::to_labels)
                .map_err(|source| ProjectionServerError::MalformedArray { path, source });
        }

        let record: Value = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(source) => return Err(ProjectionServerError::MalformedLabels { path, source }),
        };
        match record {
            Value::Array(labels) => Ok(labels),
            Value::Object(mut record) => match record.remove("labels") {
                Some(Value::Array(labels)) => Ok(labels),
                _ => Err(ProjectionServerError::LabelsFieldMissing { path }),
            },
            _ => Err(ProjectionServerError::LabelsUnrecognised { path }),
        }
    }
}
