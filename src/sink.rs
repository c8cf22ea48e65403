//! Mail backup collaborator for submitted results.
//!
//! The transport itself lives outside this service. A [ResultSink] accepts the serialised result
//! together with its addressing and reports success or failure for a single attempt.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// A message for the mail backup collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Attachment contents
    pub bytes: Vec<u8>,
    /// Attachment file name
    pub filename: String,
    pub subject: String,
    pub from: String,
    pub to: String,
}

/// Errors reported by a [ResultSink].
#[derive(Debug, Error)]
pub enum SinkError {
    /// Error writing the message
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport refused the message
    #[error("mail transport rejected message: {0}")]
    Rejected(String),
}

/// Mail backup collaborator trait.
///
/// Implementations make exactly one delivery attempt per call.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Deliver a message.
    ///
    /// # Arguments
    ///
    /// * `envelope`: The message to deliver
    async fn deliver(&self, envelope: &Envelope) -> Result<(), SinkError>;
}

/// Spool directory sink.
///
/// Implements [ResultSink] by writing each attachment into a directory watched by an external
/// mailer.
#[derive(Debug)]
pub struct SpoolSink {
    dir: PathBuf,
}

impl SpoolSink {
    /// Create a new spool sink writing into `dir`. The directory is created on first delivery.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultSink for SpoolSink {
    #[tracing::instrument(
        level = "DEBUG",
        skip(self, envelope),
        fields(filename = %envelope.filename)
    )]
    async fn deliver(&self, envelope: &Envelope) -> Result<(), SinkError> {
        let path = self.dir.join(&envelope.filename);
        let io_error = |source| SinkError::Io {
            path: envelope.filename.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        tokio::fs::write(&path, &envelope.bytes)
            .await
            .map_err(io_error)?;
        tracing::info!(
            subject = %envelope.subject,
            to = %envelope.to,
            "spooled {} bytes",
            envelope.bytes.len()
        );
        Ok(())
    }
}
