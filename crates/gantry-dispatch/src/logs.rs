//! Streaming of service log entries from providers to callers.
//!
//! The dispatcher hands the provider a [`LogSink`] and returns the matching
//! [`ServiceLogStream`]. The stream ends once every sink clone is dropped.
//! Dropping the stream makes `LogSink::send` return `false`, which is how a
//! provider learns the caller stopped listening.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::Stream;
use gantry_core::catalog::service_log_entry_fields;
use gantry_core::{validate_record, ActionKind, ServiceLogEntry, ValidatedResult};
use tracing::warn;

/// Sending half handed to a provider for `getServiceLogs`.
#[derive(Debug, Clone)]
pub struct LogSink {
    service_name: String,
    sender: mpsc::UnboundedSender<ServiceLogEntry>,
}

impl LogSink {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Send an entry; `false` once the caller dropped the stream.
    pub fn send(&self, entry: ServiceLogEntry) -> bool {
        self.sender.unbounded_send(entry).is_ok()
    }

    /// Send a message stamped with the current time.
    pub fn emit(&self, msg: impl Into<String>) -> bool {
        self.send(ServiceLogEntry::new(self.service_name.clone(), msg))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Create a connected sink and receiver for one service.
pub(crate) fn channel(
    service_name: &str,
) -> (LogSink, mpsc::UnboundedReceiver<ServiceLogEntry>) {
    let (sender, receiver) = mpsc::unbounded();
    (
        LogSink {
            service_name: service_name.to_string(),
            sender,
        },
        receiver,
    )
}

/// Lazy, possibly unbounded sequence of log entries for one service.
///
/// Entries that do not match the log entry contract are dropped with a warning.
#[derive(Debug)]
pub struct ServiceLogStream {
    result: ValidatedResult,
    entries: mpsc::UnboundedReceiver<ServiceLogEntry>,
}

impl ServiceLogStream {
    pub(crate) fn new(
        result: ValidatedResult,
        entries: mpsc::UnboundedReceiver<ServiceLogEntry>,
    ) -> Self {
        Self { result, entries }
    }

    /// The validated `getServiceLogs` result record.
    pub fn result(&self) -> &ValidatedResult {
        &self.result
    }
}

fn conforms(entry: &ServiceLogEntry) -> bool {
    let check = serde_json::to_value(entry)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            validate_record(ActionKind::GetServiceLogs, &service_log_entry_fields(), raw)
                .map_err(|e| e.to_string())
        });
    match check {
        Ok(_) => true,
        Err(error) => {
            warn!(event = "logs.entry_rejected", service = %entry.service_name, error = %error);
            false
        }
    }
}

impl Stream for ServiceLogStream {
    type Item = ServiceLogEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.entries).poll_next(cx) {
                Poll::Ready(Some(entry)) if !conforms(&entry) => continue,
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use gantry_core::ContractCatalog;
    use serde_json::json;

    fn empty_result() -> ValidatedResult {
        ContractCatalog::builtin()
            .validate(ActionKind::GetServiceLogs, json!({}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_stream_ends_when_sink_dropped() {
        let (sink, receiver) = channel("api");
        assert!(sink.emit("booting"));
        assert!(sink.emit("listening on :8080"));
        drop(sink);

        let entries: Vec<_> = ServiceLogStream::new(empty_result(), receiver)
            .collect()
            .await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].msg, "listening on :8080");
        assert!(entries.iter().all(|e| e.service_name == "api"));
    }

    #[tokio::test]
    async fn test_empty_messages_are_dropped() {
        let (sink, receiver) = channel("api");
        sink.emit("");
        sink.emit("ok");
        drop(sink);

        let entries: Vec<_> = ServiceLogStream::new(empty_result(), receiver)
            .collect()
            .await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msg, "ok");
    }

    #[test]
    fn test_send_fails_after_stream_dropped() {
        let (sink, receiver) = channel("api");
        drop(ServiceLogStream::new(empty_result(), receiver));
        assert!(sink.is_closed());
        assert!(!sink.emit("nobody is listening"));
    }
}
