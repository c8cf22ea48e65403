//! Submission of study results to the mail backup collaborator.

use crate::config::MailConfig;
use crate::error::ProjectionServerError;
use crate::metrics;
use crate::models::Receipt;
use crate::sink::{Envelope, ResultSink};

use serde_json::Value;
use std::sync::Arc;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// UTC receipt time, second precision, as used in result file names.
const RESULT_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Returns the file name for a result received at `received`.
pub fn result_filename(received: OffsetDateTime) -> Result<String, time::error::Format> {
    let timestamp = received
        .to_offset(time::UtcOffset::UTC)
        .format(RESULT_TIMESTAMP)?;
    Ok(format!("result_{timestamp}.json"))
}

/// Hands submitted documents to a [ResultSink].
#[derive(Clone)]
pub struct Submitter {
    sink: Arc<dyn ResultSink>,
    mail: MailConfig,
}

impl Submitter {
    pub fn new(sink: Arc<dyn ResultSink>, mail: MailConfig) -> Self {
        Self { sink, mail }
    }

    /// Submit a document received now.
    pub async fn submit(&self, document: &Value) -> Result<Receipt, ProjectionServerError> {
        self.submit_at(document, OffsetDateTime::now_utc()).await
    }

    /// Submit a document received at `received`.
    ///
    /// The document is serialised as pretty-printed JSON and delivered in a single attempt.
    /// Delivery failure fails the submission; nothing is kept locally.
    #[tracing::instrument(level = "DEBUG", skip(self, document))]
    pub async fn submit_at(
        &self,
        document: &Value,
        received: OffsetDateTime,
    ) -> Result<Receipt, ProjectionServerError> {
        let filename = result_filename(received)?;
        let envelope = Envelope {
            bytes: serde_json::to_vec_pretty(document)?,
            filename: filename.clone(),
            subject: self.mail.subject.clone(),
            from: self.mail.from.clone(),
            to: self.mail.to.clone(),
        };
        let delivered = self.sink.deliver(&envelope).await;
        metrics::record_submission(delivered.is_ok());
        delivered?;
        tracing::info!(%filename, "submission delivered");
        Ok(Receipt::ok(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;

    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use time::macros::datetime;

    /// Sink that records every envelope it is given.
    #[derive(Default)]
    struct RecordingSink {
        envelopes: Mutex<Vec<Envelope>>,
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        async fn deliver(&self, envelope: &Envelope) -> Result<(), SinkError> {
            self.envelopes.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    /// Sink that always fails.
    struct FailingSink;

    #[async_trait]
    impl ResultSink for FailingSink {
        async fn deliver(&self, _envelope: &Envelope) -> Result<(), SinkError> {
            Err(SinkError::Rejected("authentication failed".to_string()))
        }
    }

    fn get_test_mail_config() -> MailConfig {
        MailConfig {
            subject: "New study result".to_string(),
            from: "study@example.com".to_string(),
            to: "backup@example.com".to_string(),
        }
    }

    #[test]
    fn filename_from_timestamp() {
        assert_eq!(
            "result_20250102_030405.json",
            result_filename(datetime!(2025-01-02 03:04:05.678 UTC)).unwrap()
        );
    }

    #[test]
    fn filename_converted_to_utc() {
        assert_eq!(
            "result_20250101_220000.json",
            result_filename(datetime!(2025-01-02 00:00:00 +2)).unwrap()
        );
    }

    #[tokio::test]
    async fn submit_delivers_pretty_json() {
        let sink = Arc::new(RecordingSink::default());
        let submitter = Submitter::new(sink.clone(), get_test_mail_config());
        let document = json!({"participant": "p1", "answers": [1, 2]});
        let receipt = submitter
            .submit_at(&document, datetime!(2025-01-02 03:04:05 UTC))
            .await
            .unwrap();
        assert_eq!(Receipt::ok("result_20250102_030405.json".to_string()), receipt);

        let envelopes = sink.envelopes.lock().unwrap();
        assert_eq!(1, envelopes.len());
        let envelope = &envelopes[0];
        assert_eq!("result_20250102_030405.json", envelope.filename);
        assert_eq!("New study result", envelope.subject);
        assert_eq!("study@example.com", envelope.from);
        assert_eq!("backup@example.com", envelope.to);
        let expected = "{\n  \"answers\": [\n    1,\n    2\n  ],\n  \"participant\": \"p1\"\n}";
        assert_eq!(expected.as_bytes(), &envelope.bytes[..]);
    }

    #[tokio::test]
    async fn submit_is_deterministic() {
        let sink = Arc::new(RecordingSink::default());
        let submitter = Submitter::new(sink.clone(), get_test_mail_config());
        let received = datetime!(2025-01-02 03:04:05 UTC);
        let first = json!({"b": {"y": 1, "x": 2}, "a": null});
        let second: Value =
            serde_json::from_str(r#"{"a": null, "b": {"x": 2, "y": 1}}"#).unwrap();
        submitter.submit_at(&first, received).await.unwrap();
        submitter.submit_at(&second, received).await.unwrap();
        let envelopes = sink.envelopes.lock().unwrap();
        assert_eq!(envelopes[0], envelopes[1]);
        let round_trip: Value = serde_json::from_slice(&envelopes[0].bytes).unwrap();
        assert_eq!(first, round_trip);
    }

    #[tokio::test]
    async fn submit_failure_preserves_cause() {
        let submitter = Submitter::new(Arc::new(FailingSink), get_test_mail_config());
        let error = submitter.submit(&json!({"a": 1})).await.unwrap_err();
        match &error {
            ProjectionServerError::Sink(SinkError::Rejected(reason)) => {
                assert_eq!("authentication failed", reason)
            }
            _ => panic!("expected a sink error"),
        }
        let cause = std::error::Error::source(&error).unwrap().to_string();
        assert!(cause.contains("authentication failed"), "{cause}");
    }
}
