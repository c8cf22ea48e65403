//! Component configuration.
//!
//! Configuration objects are built once from the [command line arguments](crate::cli) and passed
//! to components at construction time.

use crate::cli::CommandLineArgs;

use std::path::PathBuf;

/// File extension of projection and label array files.
pub const ARRAY_EXTENSION: &str = "npy";

/// Names of the optional per-dataset annotation files.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationFilenames {
    /// Record holding `worst_point_index`
    pub worst: String,
    /// Record describing the nearest pair, passed through verbatim
    pub pair: String,
    /// Record holding `densest_cluster`
    pub densest: String,
}

impl Default for AnnotationFilenames {
    fn default() -> Self {
        Self {
            worst: "E2_targets.json".to_string(),
            pair: "E3_targets.json".to_string(),
            densest: "E4_targets.json".to_string(),
        }
    }
}

/// Layout of the on-disk dataset store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Root directory. Each immediate subdirectory is a dataset.
    pub store_root: PathBuf,
    /// Name of the label file in each dataset directory. Never listed as a projection.
    pub label_filename: String,
    /// Names of the optional annotation files in each dataset directory.
    pub annotation_filenames: AnnotationFilenames,
}

impl StoreConfig {
    /// Returns a store configuration rooted at `store_root` with default file names.
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        Self {
            store_root: store_root.into(),
            label_filename: format!("labels.{ARRAY_EXTENSION}"),
            annotation_filenames: AnnotationFilenames::default(),
        }
    }
}

impl From<&CommandLineArgs> for StoreConfig {
    fn from(args: &CommandLineArgs) -> Self {
        Self {
            store_root: PathBuf::from(&args.store_root),
            label_filename: args.label_file.clone(),
            annotation_filenames: AnnotationFilenames {
                worst: args.worst_point_file.clone(),
                pair: args.nearest_pair_file.clone(),
                densest: args.densest_cluster_file.clone(),
            },
        }
    }
}

/// Addressing of result backup mails.
#[derive(Clone, Debug, PartialEq)]
pub struct MailConfig {
    pub subject: String,
    pub from: String,
    pub to: String,
}

impl From<&CommandLineArgs> for MailConfig {
    fn from(args: &CommandLineArgs) -> Self {
        Self {
            subject: args.mail_subject.clone(),
            from: args.mail_from.clone(),
            to: args.mail_to.clone(),
        }
    }
}
