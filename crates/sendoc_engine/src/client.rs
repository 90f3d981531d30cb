use std::time::Duration;

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use sendoc_core::{ChatRequest, HistoryEntry, JobDetail, JobQuery, JobSummary, MessageId};
use sendoc_logging::{sendoc_debug, sendoc_info, sendoc_warn};

use crate::payload::{decode_chat_reply, decode_job_detail, decode_job_list};
use crate::sse::DATA_MARKER;
use crate::ingest::{ingest_body, IngestError};
use crate::{ChatError, EngineEvent, FailureKind, IngestStats};

pub const DEFAULT_BASE_URL: &str = "https://doctor-bot-backend.onrender.com";

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    /// Resolved once at startup and sent with every chat request.
    pub session_id: String,
    pub connect_timeout: Duration,
    /// Overall deadline per request. `None` leaves timing to the transport,
    /// which suits long streams.
    pub request_timeout: Option<Duration>,
    /// Cap on a whole JSON body, and on the unterminated part of a stream.
    pub max_body_bytes: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_id: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Receives everything a backend call produces while it runs.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Runs one chat turn. Progress goes to `sink`; the caller reports the
    /// terminal outcome from the returned value.
    async fn chat(
        &self,
        message_id: &MessageId,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<IngestStats, ChatError>;

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobSummary>, ChatError>;

    /// `Ok(None)` when the backend has no such listing.
    async fn job_detail(&self, job_id: &str) -> Result<Option<JobDetail>, ChatError>;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    message: &'a str,
    messages: &'a [HistoryEntry],
    session_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ChatSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ChatSettings) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ChatError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ChatError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| ChatError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, ChatError> {
        sendoc_debug!("GET {}", url);
        self.client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)
    }

    async fn read_capped(&self, response: reqwest::Response) -> Result<Vec<u8>, ChatError> {
        let max_bytes = self.settings.max_body_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ChatBackend for ReqwestBackend {
    async fn chat(
        &self,
        message_id: &MessageId,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<IngestStats, ChatError> {
        let url = self.endpoint(&["api", "chat"])?;
        let body = ChatRequestBody {
            message: &request.message,
            messages: &request.history,
            session_id: &self.settings.session_id,
        };
        sendoc_info!(
            "POST {} message_id={} history_len={}",
            url,
            message_id,
            request.history.len()
        );

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "text/event-stream, application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut chunks = response.bytes_stream();
        let first = match chunks.next().await {
            Some(chunk) => chunk.map_err(map_reqwest_error)?,
            None => Bytes::new(),
        };
        sink.emit(EngineEvent::ChatOpened {
            message_id: message_id.clone(),
        });

        if !is_event_stream(content_type.as_deref(), &first) {
            let mut body = first.to_vec();
            let max_bytes = self.settings.max_body_bytes;
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.map_err(map_reqwest_error)?;
                let next_len = body.len() as u64 + chunk.len() as u64;
                if next_len > max_bytes {
                    return Err(too_large(max_bytes, next_len));
                }
                body.extend_from_slice(&chunk);
            }
            let reply = decode_chat_reply(&body).ok_or_else(|| {
                ChatError::new(FailureKind::InvalidPayload, "chat reply is not a JSON object")
            })?;
            sink.emit(EngineEvent::ChatReply {
                message_id: message_id.clone(),
                reply,
            });
            return Ok(IngestStats::default());
        }

        let body = stream::iter([Ok(first)]).chain(chunks);
        let stats = ingest_body(body, self.settings.max_body_bytes, |event| {
            sink.emit(EngineEvent::ChatStream {
                message_id: message_id.clone(),
                event,
            });
        })
        .await
        .map_err(|err| match err {
            IngestError::Read(err) => map_reqwest_error(err),
            IngestError::Overflow {
                max_pending,
                pending,
            } => too_large(max_pending, pending),
        })?;
        sendoc_info!(
            "stream finished message_id={} records={} dispatched={} malformed={}",
            message_id,
            stats.records,
            stats.dispatched,
            stats.malformed
        );
        Ok(stats)
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobSummary>, ChatError> {
        let url = if query.is_empty() {
            self.endpoint(&["api", "jobs"])?
        } else {
            let mut url = self.endpoint(&["api", "search"])?;
            url.query_pairs_mut().extend_pairs(query.params.iter());
            url
        };

        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = self.read_capped(response).await?;
        let jobs = decode_job_list(&body);
        sendoc_debug!("job list returned {} entries", jobs.len());
        Ok(jobs)
    }

    async fn job_detail(&self, job_id: &str) -> Result<Option<JobDetail>, ChatError> {
        let url = self.endpoint(&["api", "jobs", job_id])?;
        let response = self.get(url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ChatError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = self.read_capped(response).await?;
        let detail = decode_job_detail(&body, job_id);
        if detail.is_none() {
            sendoc_warn!("job {} answered with an unreadable body", job_id);
        }
        Ok(detail)
    }
}

const SSE_FIELD_PREFIXES: [&str; 5] = [DATA_MARKER, "event:", "id:", "retry:", ":"];

/// Streams are recognised by content type, or, when the server does not
/// label them, by a first line that is an SSE field or comment.
pub fn is_event_stream(content_type: Option<&str>, first_chunk: &[u8]) -> bool {
    if let Some(ct) = content_type {
        let mime = ct.split(';').next().unwrap_or(ct).trim();
        if mime.eq_ignore_ascii_case("text/event-stream") {
            return true;
        }
        if mime.eq_ignore_ascii_case("application/json") {
            return false;
        }
    }
    let text = String::from_utf8_lossy(first_chunk);
    let first_line = text.trim_start().lines().next().unwrap_or_default();
    SSE_FIELD_PREFIXES
        .iter()
        .any(|prefix| first_line.starts_with(prefix))
}

fn too_large(max_bytes: u64, actual: u64) -> ChatError {
    ChatError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ChatError {
    if err.is_timeout() {
        return ChatError::new(FailureKind::Timeout, err.to_string());
    }
    ChatError::new(FailureKind::Network, err.to_string())
}
