use crate::catalog::CatalogBuilder;
use crate::cli::CommandLineArgs;
use crate::config::{MailConfig, StoreConfig};
use crate::resolver::ProjectionResolver;
use crate::sink::{ResultSink, SpoolSink};
use crate::submission::Submitter;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Dataset and projection discovery.
    pub catalog: CatalogBuilder,

    /// Projection retrieval.
    pub resolver: ProjectionResolver,

    /// Result submission.
    pub submitter: Submitter,
}

impl AppState {
    /// Create and return an [AppState] that spools submissions to the configured directory.
    pub fn new(args: &CommandLineArgs) -> Self {
        let sink = Arc::new(SpoolSink::new(&args.spool_dir));
        Self::with_sink(StoreConfig::from(args), MailConfig::from(args), sink)
    }

    /// Create and return an [AppState] that delivers submissions to `sink`.
    pub fn with_sink(store: StoreConfig, mail: MailConfig, sink: Arc<dyn ResultSink>) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: CatalogBuilder::new(store.clone()),
            resolver: ProjectionResolver::new(store),
            submitter: Submitter::new(sink, mail),
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
