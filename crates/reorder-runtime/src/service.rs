#![forbid(unsafe_code)]

//! Seams to the external collaborators: the position-commit service and
//! the cancellation/error sink.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use reorder_widgets::recovery::Notice;
use reorder_widgets::{CommitRequest, CommitResponse};
use tracing::{info, warn};

/// Errors a commit service reports instead of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request could not be delivered or the connection failed.
    Transport(String),
    /// A response arrived but could not be decoded.
    Decode(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "undecodable response: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// The authority that accepts position commits.
///
/// Calls block; the dispatcher runs them off the event thread. Delivery is
/// at-most-once: callers never retry.
pub trait PositionCommitService: Send + Sync {
    fn commit(&self, request: &CommitRequest) -> Result<CommitResponse, ServiceError>;
}

impl<F> PositionCommitService for F
where
    F: Fn(&CommitRequest) -> Result<CommitResponse, ServiceError> + Send + Sync,
{
    fn commit(&self, request: &CommitRequest) -> Result<CommitResponse, ServiceError> {
        self(request)
    }
}

/// Decode a JSON response body.
pub fn decode_response(body: &str) -> Result<CommitResponse, ServiceError> {
    Ok(serde_json::from_str(body)?)
}

/// Receives cancellation and error notices.
pub trait NoticeSink: Send + Sync {
    fn notice(&self, notice: &Notice);
}

/// Sink that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notice(&self, notice: &Notice) {
        if notice.is_error() {
            warn!(?notice, "reorder error");
        } else {
            info!(?notice, "reorder notice");
        }
    }
}

/// Sink that keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices seen so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take and clear the recorded notices.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NoticeSink for RecordingSink {
    fn notice(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

impl<S: NoticeSink + ?Sized> NoticeSink for Arc<S> {
    fn notice(&self, notice: &Notice) {
        (**self).notice(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_core::ItemId;

    #[test]
    fn closures_are_services() {
        let service = |req: &CommitRequest| -> Result<CommitResponse, ServiceError> {
            Ok(CommitResponse::ok(format!("moved {}", req.item_id)))
        };
        let req = CommitRequest::new(ItemId::from("home"), 1, vec![ItemId::from("home")]);
        assert_eq!(service.commit(&req).unwrap().status_message, "moved home");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_response("<html>"), Err(ServiceError::Decode(_))));
        let resp = decode_response(r#"{"status_code": 200, "status_message": "ok"}"#).unwrap();
        assert!(resp.is_success());
    }

    #[test]
    fn recording_sink_drains() {
        let sink = RecordingSink::new();
        sink.notice(&Notice::Reset);
        assert_eq!(sink.notices(), vec![Notice::Reset]);
        assert_eq!(sink.drain(), vec![Notice::Reset]);
        assert!(sink.notices().is_empty());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ServiceError::Transport("refused".into()).to_string(),
            "transport error: refused"
        );
    }
}
