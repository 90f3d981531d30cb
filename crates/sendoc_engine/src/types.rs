use std::fmt;

use sendoc_core::{JobDetail, JobSummary, MessageId};

/// One typed event decoded from a streamed chat record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    Jobs(Vec<JobSummary>),
}

/// Whole-body chat answer from a backend that does not stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub jobs: Vec<JobSummary>,
}

/// Counters for one ingested response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestStats {
    /// Complete records split out of the body.
    pub records: usize,
    /// Records that produced a [`StreamEvent`].
    pub dispatched: usize,
    /// Records without the data marker, or with an unknown `type`.
    pub ignored: usize,
    /// Records whose payload was not valid JSON.
    pub malformed: usize,
    /// Bytes of unterminated trailing text dropped at end of stream.
    pub discarded_bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Response headers arrived for the chat request.
    ChatOpened { message_id: MessageId },
    ChatStream {
        message_id: MessageId,
        event: StreamEvent,
    },
    ChatReply {
        message_id: MessageId,
        reply: ChatReply,
    },
    /// Terminal: the body was read to the end.
    ChatCompleted {
        message_id: MessageId,
        stats: IngestStats,
    },
    /// Terminal: the request failed somewhere between connect and end of body.
    ChatFailed {
        message_id: MessageId,
        error: ChatError,
    },
    JobsLoaded {
        result: Result<Vec<JobSummary>, ChatError>,
    },
    JobDetailLoaded {
        job_id: String,
        result: Result<Option<JobDetail>, ChatError>,
    },
}

/// The engine thread has exited; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine thread stopped")]
pub struct EngineStopped;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ChatError {
    pub kind: FailureKind,
    pub message: String,
}

impl ChatError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// The response could not be understood at all (e.g. a non-JSON reply).
    InvalidPayload,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidPayload => write!(f, "invalid payload"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
