use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use sendoc_logging::{sendoc_debug, sendoc_trace};

use crate::payload::{decode_record_payload, RecordOutcome};
use crate::sse::{record_payload, SseDecoder};
use crate::{IngestStats, StreamEvent};

/// Turns a chunked response body into typed stream events.
///
/// A bad record only costs that record; the ingestor keeps going.
#[derive(Default)]
pub struct StreamIngestor {
    decoder: SseDecoder,
    stats: IngestStats,
}

impl StreamIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the events of every record it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let records = self.decoder.push(chunk);
        let mut events = Vec::with_capacity(records.len());
        for record in records {
            self.stats.records += 1;
            let Some(payload) = record_payload(&record) else {
                sendoc_trace!("skipping record without data marker ({} bytes)", record.len());
                self.stats.ignored += 1;
                continue;
            };
            match decode_record_payload(&payload) {
                RecordOutcome::Event(event) => {
                    self.stats.dispatched += 1;
                    events.push(event);
                }
                RecordOutcome::Ignored => self.stats.ignored += 1,
                RecordOutcome::Malformed(err) => {
                    sendoc_debug!("skipping malformed record: {}", err);
                    self.stats.malformed += 1;
                }
            }
        }
        events
    }

    pub fn pending_len(&self) -> usize {
        self.decoder.pending_len()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Ends the body; an unterminated trailing record is dropped.
    pub fn finish(self) -> IngestStats {
        let mut stats = self.stats;
        stats.discarded_bytes = self.decoder.finish();
        if stats.discarded_bytes > 0 {
            sendoc_debug!(
                "discarding {} bytes of unterminated record at end of stream",
                stats.discarded_bytes
            );
        }
        stats
    }
}

/// Why [`ingest_body`] stopped before the end of the body.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum IngestError<E> {
    #[error("body read failed: {0}")]
    Read(E),
    #[error("unterminated record holds {pending} bytes, limit {max_pending}")]
    Overflow { max_pending: u64, pending: u64 },
}

/// Drains `body`, handing every event to `on_event` in arrival order.
///
/// A read error, or an unterminated record growing past `max_pending`
/// bytes, stops ingestion. Events already handed out stay delivered.
pub async fn ingest_body<S, E>(
    body: S,
    max_pending: u64,
    mut on_event: impl FnMut(StreamEvent),
) -> Result<IngestStats, IngestError<E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let mut ingestor = StreamIngestor::new();
    let mut body = std::pin::pin!(body);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(IngestError::Read)?;
        for event in ingestor.feed(&chunk) {
            on_event(event);
        }
        let pending = ingestor.pending_len() as u64;
        if pending > max_pending {
            return Err(IngestError::Overflow {
                max_pending,
                pending,
            });
        }
    }
    Ok(ingestor.finish())
}
