use std::fmt;

use thiserror::Error;
use tracker_core::{JobKey, JobRecord, ProgressSnapshot, StreamCloseReason, StreamId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PollCompleted(Result<Vec<JobRecord>, ApiError>),
    StreamSnapshot {
        key: JobKey,
        stream_id: StreamId,
        snapshot: ProgressSnapshot,
    },
    StreamClosed {
        key: JobKey,
        stream_id: StreamId,
        reason: StreamCloseReason,
    },
    Registered {
        code: JobKey,
        result: Result<JobRecord, ApiError>,
    },
    Retried {
        key: JobKey,
        result: Result<JobRecord, ApiError>,
    },
    Removed {
        key: JobKey,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Short text suitable for an operator notification.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FailureKind::Conflict => "postal code already registered".to_string(),
            FailureKind::Rejected { detail } => detail.clone(),
            FailureKind::HttpStatus(code) => format!("server answered {code}"),
            FailureKind::Timeout => "request timed out".to_string(),
            FailureKind::Network => "connection error".to_string(),
            FailureKind::InvalidUrl => "invalid backend url".to_string(),
            FailureKind::Decode => "unexpected response from server".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// `409` from a command.
    Conflict,
    /// Non-2xx with a `detail` message from the backend.
    Rejected { detail: String },
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Conflict => write!(f, "conflict"),
            FailureKind::Rejected { detail } => write!(f, "rejected ({detail})"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "decode error"),
        }
    }
}
