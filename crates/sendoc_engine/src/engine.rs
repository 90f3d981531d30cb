use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;

use sendoc_core::{ChatRequest, JobQuery, MessageId};
use sendoc_logging::{sendoc_error, sendoc_warn};

use crate::client::{ChannelEventSink, ChatBackend};
use crate::{EngineEvent, EngineStopped};

enum EngineCommand {
    Chat {
        message_id: MessageId,
        request: ChatRequest,
    },
    LoadJobs {
        query: JobQuery,
    },
    LoadJobDetail {
        job_id: String,
    },
}

/// Runs backend calls on a dedicated runtime thread and reports back over a
/// channel, so the caller's loop never blocks on the network.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self::with_runtime(backend, Runtime::new)
    }

    /// Like [`EngineHandle::new`] with a caller-built runtime. If `build`
    /// fails the thread exits and [`EngineHandle::recv_timeout`] reports
    /// [`EngineStopped`].
    pub fn with_runtime<F>(backend: Arc<dyn ChatBackend>, build: F) -> Self
    where
        F: FnOnce() -> io::Result<Runtime> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    sendoc_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(backend.as_ref(), command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn chat(&self, message_id: MessageId, request: ChatRequest) {
        self.send(EngineCommand::Chat {
            message_id,
            request,
        });
    }

    pub fn load_jobs(&self, query: JobQuery) {
        self.send(EngineCommand::LoadJobs { query });
    }

    pub fn load_job_detail(&self, job_id: impl Into<String>) {
        self.send(EngineCommand::LoadJobDetail {
            job_id: job_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` when nothing arrived within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            sendoc_warn!("engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    backend: &dyn ChatBackend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Chat {
            message_id,
            request,
        } => {
            let sink = ChannelEventSink::new(event_tx.clone());
            // Exactly one terminal event per chat, whatever path the call took.
            let terminal = match backend.chat(&message_id, &request, &sink).await {
                Ok(stats) => EngineEvent::ChatCompleted { message_id, stats },
                Err(error) => {
                    sendoc_warn!("chat {} failed: {}", message_id, error);
                    EngineEvent::ChatFailed { message_id, error }
                }
            };
            let _ = event_tx.send(terminal);
        }
        EngineCommand::LoadJobs { query } => {
            let result = backend.list_jobs(&query).await;
            let _ = event_tx.send(EngineEvent::JobsLoaded { result });
        }
        EngineCommand::LoadJobDetail { job_id } => {
            let result = backend.job_detail(&job_id).await;
            let _ = event_tx.send(EngineEvent::JobDetailLoaded { job_id, result });
        }
    }
}
