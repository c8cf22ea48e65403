//! Data types and associated functions and methods

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum_macros::Display;
use validator::{Validate, ValidationError};

/// Mapping from dataset name to the sorted names of its projections.
///
/// Iteration order is lexicographic by dataset name.
pub type Catalog = BTreeMap<String, Vec<String>>;

/// Identifies a projection within the store.
///
/// Both names are untrusted path segments and must be validated before use.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProjectionKey {
    /// Dataset directory name
    #[validate(custom = "validate_segment")]
    pub dataset: String,
    /// Projection file name without extension
    #[validate(custom = "validate_segment")]
    pub projection: String,
}

impl ProjectionKey {
    /// Return a new ProjectionKey object.
    pub fn new(dataset: impl Into<String>, projection: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            projection: projection.into(),
        }
    }
}

/// Returns whether a name is a single path segment that stays within its parent directory.
pub fn is_path_segment(segment: &str) -> bool {
    !(segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']))
}

/// Validate that a name is a single, non-escaping path segment
fn validate_segment(segment: &str) -> Result<(), ValidationError> {
    if !is_path_segment(segment) {
        let mut error = ValidationError::new("name must be a single path segment");
        error.add_param("value".into(), &segment);
        return Err(error);
    }
    Ok(())
}

/// The merged document returned for a projection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedProjection {
    /// Point coordinates, one row per observation
    #[serde(rename = "X")]
    pub x: Vec<Vec<f64>>,
    /// Per-observation labels
    pub y: Vec<Value>,
    /// Index of the worst represented point, if known and in range
    pub worst_point_index: Option<usize>,
    /// Nearest pair description, passed through verbatim
    pub nearest_pair: Option<Map<String, Value>>,
    /// Id of the densest cluster
    pub densest_cluster: Option<i64>,
}

/// Optional fields of a [ResolvedProjection] sourced from annotation files.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum AnnotationField {
    WorstPointIndex,
    NearestPair,
    DensestCluster,
}

/// A recoverable problem with an annotation. The affected field is served as `null`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationWarning {
    /// Field that was dropped
    pub field: AnnotationField,
    /// Human readable reason
    pub reason: String,
}

impl AnnotationWarning {
    pub fn new(field: AnnotationField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Result of resolving a projection: the document plus any warnings raised while building it.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub document: ResolvedProjection,
    pub warnings: Vec<AnnotationWarning>,
}

/// Acknowledgement of an accepted submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Receipt {
    /// Always `ok`
    pub status: String,
    /// File name under which the result was handed to the mail collaborator
    pub filename: String,
}

impl Receipt {
    pub fn ok(filename: String) -> Self {
        Self {
            status: "ok".to_string(),
            filename,
        }
    }
}
