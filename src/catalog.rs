//! Discovery of datasets and their projections.

use crate::config::{StoreConfig, ARRAY_EXTENSION};
use crate::error::ProjectionServerError;
use crate::models::{is_path_segment, Catalog};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds the [Catalog] by scanning the store on every call.
#[derive(Clone, Debug)]
pub struct CatalogBuilder {
    config: Arc<StoreConfig>,
}

impl CatalogBuilder {
    pub fn new(config: Arc<StoreConfig>) -> Self {
        Self { config }
    }

    /// List the projections of every dataset in the store.
    ///
    /// Datasets are visited in lexicographic order. Entries of the store root that are not
    /// readable directories are skipped, as are datasets without projections. Failure to read the
    /// store root itself is an error.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub fn list_projections(&self) -> Result<Catalog, ProjectionServerError> {
        let entries =
            fs::read_dir(&self.config.store_root).map_err(ProjectionServerError::StoreUnreadable)?;
        let mut datasets: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| Some((entry.file_name().into_string().ok()?, entry.path())))
            .filter(|(name, _)| is_path_segment(name))
            .collect();
        datasets.sort();

        let mut catalog = Catalog::new();
        for (name, path) in datasets {
            match self.scan_dataset(&path) {
                Some(projections) if !projections.is_empty() => {
                    catalog.insert(name, projections);
                }
                Some(_) => tracing::debug!(dataset = %name, "no projections"),
                None => tracing::debug!(dataset = %name, "skipping unreadable entry"),
            }
        }
        Ok(catalog)
    }

    /// Returns the sorted projection names in a dataset directory, or `None` if `path` is not a
    /// readable directory.
    fn scan_dataset(&self, path: &Path) -> Option<Vec<String>> {
        if !fs::metadata(path).ok()?.is_dir() {
            return None;
        }
        let mut projections: Vec<String> = fs::read_dir(path)
            .ok()?
            .filter_map(Result::ok)
            .filter_map(|entry| self.projection_name(&entry.path()))
            .collect();
        projections.sort();
        Some(projections)
    }

    /// Returns the projection name for a file, or `None` if it is not a projection file.
    ///
    /// A projection file is a regular file with the array extension that is not the label file.
    /// Names that could not be requested back are not projections.
    fn projection_name(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        if file_name == self.config.label_filename {
            return None;
        }
        if path.extension()?.to_str()? != ARRAY_EXTENSION {
            return None;
        }
        if !fs::metadata(path).ok()?.is_file() {
            return None;
        }
        let name = path.file_stem()?.to_str()?;
        is_path_segment(name).then(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ProjectionResolver;
    use crate::test_utils::TestStore;

    #[test]
    fn lists_projections_sorted() {
        let store = TestStore::new();
        store.add_labels("iris", &[0, 1]);
        for name in ["umap", "pca", "tsne"] {
            store.add_projection("iris", name, &[[0.0, 0.0], [1.0, 1.0]]);
        }
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(1, catalog.len());
        assert_eq!(vec!["pca", "tsne", "umap"], catalog["iris"]);
    }

    #[test]
    fn label_file_is_not_a_projection() {
        let store = TestStore::new();
        store.add_labels("iris", &[0]);
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(vec!["umap"], catalog["iris"]);
    }

    #[test]
    fn dataset_without_projections_is_omitted() {
        let store = TestStore::new();
        store.add_labels("empty", &[0]);
        store.write("empty", "E2_targets.json", b"{}");
        store.add_labels("iris", &[0]);
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert!(!catalog.contains_key("empty"));
        assert!(catalog.contains_key("iris"));
    }

    #[test]
    fn datasets_in_lexicographic_order() {
        let store = TestStore::new();
        for dataset in ["wine", "Digits", "iris", "mnist"] {
            store.add_projection(dataset, "pca", &[[0.0, 0.0]]);
        }
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        let datasets: Vec<&String> = catalog.keys().collect();
        assert_eq!(vec!["Digits", "iris", "mnist", "wine"], datasets);
    }

    #[test]
    fn ignores_other_extensions_and_subdirectories() {
        let store = TestStore::new();
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        store.write("iris", "notes.txt", b"hello");
        store.write("iris", "umap.npy.bak", b"");
        store.write("iris", ".npy", b"");
        std::fs::create_dir(store.path().join("iris").join("nested.npy")).unwrap();
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(vec!["umap"], catalog["iris"]);
    }

    #[test]
    fn skips_files_in_store_root() {
        let store = TestStore::new();
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        std::fs::write(store.path().join("stray.npy"), b"").unwrap();
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(1, catalog.len());
        assert!(catalog.contains_key("iris"));
    }

    #[test]
    fn every_listed_projection_resolves() {
        let store = TestStore::new();
        store.add_labels("iris", &[0]);
        for name in ["umap..v2", "..pca", "t-SNE_30", "mnist.small"] {
            store.add_projection("iris", name, &[[0.0, 0.0]]);
        }
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(vec!["..pca", "mnist.small", "t-SNE_30", "umap..v2"], catalog["iris"]);
        let resolver = ProjectionResolver::new(store.config());
        for (dataset, projections) in &catalog {
            for projection in projections {
                assert!(
                    resolver.resolve(dataset, projection).is_ok(),
                    "{dataset}/{projection}"
                );
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn unrequestable_names_are_not_listed() {
        let store = TestStore::new();
        store.add_labels("iris", &[0]);
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        store.add_projection("iris", "a\\b", &[[0.0, 0.0]]);
        store.add_projection("back\\slash", "umap", &[[0.0, 0.0]]);
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert_eq!(1, catalog.len());
        assert_eq!(vec!["umap"], catalog["iris"]);
    }

    #[test]
    fn empty_store() {
        let store = TestStore::new();
        let catalog = CatalogBuilder::new(store.config()).list_projections().unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn missing_store_root() {
        let store = TestStore::new();
        let config = StoreConfig::new(store.path().join("missing"));
        let error = CatalogBuilder::new(Arc::new(config))
            .list_projections()
            .unwrap_err();
        assert!(matches!(error, ProjectionServerError::StoreUnreadable(_)));
    }

    #[test]
    fn custom_label_filename() {
        let store = TestStore::new();
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        store.add_projection("iris", "y", &[[0.0, 0.0]]);
        let mut config = (*store.config()).clone();
        config.label_filename = "y.npy".to_string();
        let catalog = CatalogBuilder::new(Arc::new(config))
            .list_projections()
            .unwrap();
        assert_eq!(vec!["umap"], catalog["iris"]);
    }

    #[cfg(unix)]
    #[test]
    fn skips_unreadable_dataset() {
        use std::os::unix::fs::PermissionsExt;

        let store = TestStore::new();
        store.add_projection("iris", "umap", &[[0.0, 0.0]]);
        store.add_projection("locked", "umap", &[[0.0, 0.0]]);
        let locked = store.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Permissions are not enforced for root, so only check that the scan completes.
        let catalog = CatalogBuilder::new(store.config()).list_projections();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let catalog = catalog.unwrap();
        assert_eq!(vec!["umap"], catalog["iris"]);
    }
}
