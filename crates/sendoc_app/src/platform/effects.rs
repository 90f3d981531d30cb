use std::sync::Arc;
use std::time::Duration;

use sendoc_core::{Effect, Msg};
use sendoc_engine::{ChatBackend, EngineEvent, EngineHandle, EngineStopped, StreamEvent};
use sendoc_logging::{sendoc_info, sendoc_warn};

/// Executes core effects on the engine and turns engine events back into
/// core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self::with_engine(EngineHandle::new(backend))
    }

    pub fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SendChat {
                    message_id,
                    request,
                } => {
                    sendoc_info!(
                        "SendChat message_id={} text_len={}",
                        message_id,
                        request.message.len()
                    );
                    self.engine.chat(message_id, request);
                }
                Effect::LoadJobs { query } => {
                    sendoc_info!("LoadJobs params={:?}", query.params);
                    self.engine.load_jobs(query);
                }
                Effect::LoadJobDetail { job_id } => {
                    sendoc_info!("LoadJobDetail job_id={}", job_id);
                    self.engine.load_job_detail(job_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event, already mapped.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ChatOpened { message_id } => Msg::StreamOpened { message_id },
        EngineEvent::ChatStream {
            message_id,
            event: StreamEvent::TextDelta(delta),
        } => Msg::TextDelta { message_id, delta },
        EngineEvent::ChatStream {
            message_id,
            event: StreamEvent::Jobs(jobs),
        } => Msg::JobsReceived { message_id, jobs },
        EngineEvent::ChatReply { message_id, reply } => Msg::ReplyReceived {
            message_id,
            text: reply.text,
            jobs: reply.jobs,
        },
        EngineEvent::ChatCompleted { message_id, .. } => Msg::StreamCompleted { message_id },
        EngineEvent::ChatFailed { message_id, error } => Msg::RequestFailed {
            message_id,
            reason: error.to_string(),
        },
        EngineEvent::JobsLoaded { result: Ok(jobs) } => Msg::JobsListed(jobs),
        EngineEvent::JobsLoaded { result: Err(error) } => {
            sendoc_warn!("Job listing failed: {}", error);
            Msg::JobsUnavailable {
                reason: error.to_string(),
            }
        }
        EngineEvent::JobDetailLoaded {
            job_id,
            result: Ok(Some(detail)),
        } => Msg::JobDetailLoaded { job_id, detail },
        EngineEvent::JobDetailLoaded {
            job_id,
            result: Ok(None),
        } => Msg::JobNotFound { job_id },
        EngineEvent::JobDetailLoaded {
            job_id,
            result: Err(error),
        } => {
            sendoc_warn!("Job {} could not be loaded: {}", job_id, error);
            Msg::JobNotFound { job_id }
        }
    }
}
