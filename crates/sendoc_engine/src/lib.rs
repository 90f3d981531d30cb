//! Sendoc engine: backend client, stream ingestion and the engine thread.
mod client;
mod engine;
mod ingest;
mod payload;
mod sse;
mod types;

pub use client::{
    is_event_stream, ChannelEventSink, ChatBackend, ChatSettings, EventSink, ReqwestBackend,
    DEFAULT_BASE_URL,
};
pub use engine::EngineHandle;
pub use ingest::{ingest_body, IngestError, StreamIngestor};
pub use payload::{
    decode_chat_reply, decode_job_detail, decode_job_list, decode_record_payload,
    job_summary_from_object, RecordOutcome, FALLBACK_REPLY,
};
pub use sse::{record_payload, SseDecoder, DATA_MARKER};
pub use types::{
    ChatError, ChatReply, EngineEvent, EngineStopped, FailureKind, IngestStats, StreamEvent,
};
