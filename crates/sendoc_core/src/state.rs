use chrono::{DateTime, Utc};

use crate::view_model::{
    AppViewModel, BrowseView, DetailView, JobCardView, MessageView, SUGGESTED_PROMPTS,
};
use crate::{
    ChatRequest, Conversation, HistoryEntry, JobDetail, JobSummary, Message, MessageId, Role,
};

/// Note appended to the in-flight reply when the backend cannot be reached.
pub const TRANSPORT_ERROR_NOTE: &str = "Sorry, I couldn't reach the server.";

/// Lifecycle of one chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

impl RequestPhase {
    pub fn is_active(self) -> bool {
        matches!(self, RequestPhase::Sending | RequestPhase::Streaming)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState {
    pub message_id: MessageId,
    pub phase: RequestPhase,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BrowseState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<JobSummary>),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobDetailState {
    #[default]
    Closed,
    Loading { job_id: String },
    Loaded(JobDetail),
    NotFound { job_id: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    conversation: Conversation,
    system_prompt: Option<String>,
    request: Option<RequestState>,
    browse: BrowseState,
    detail: JobDetailState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a conversation seeded with a hidden system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>, at: DateTime<Utc>) -> Self {
        let prompt = prompt.into();
        let mut conversation = Conversation::new();
        conversation.append_system_message(prompt.clone(), at);
        Self {
            conversation,
            system_prompt: Some(prompt),
            ..Self::default()
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_loading(&self) -> bool {
        self.phase().is_active()
    }

    pub fn phase(&self) -> RequestPhase {
        self.request
            .as_ref()
            .map(|request| request.phase)
            .unwrap_or_default()
    }

    pub fn in_flight_message(&self) -> Option<&MessageId> {
        self.request
            .as_ref()
            .filter(|request| request.phase.is_active())
            .map(|request| &request.message_id)
    }

    pub fn browse(&self) -> &BrowseState {
        &self.browse
    }

    pub fn detail(&self) -> &JobDetailState {
        &self.detail
    }

    pub fn view(&self) -> AppViewModel {
        let messages: Vec<MessageView> = self
            .conversation
            .messages()
            .iter()
            .filter(|message| message.role != Role::System)
            .map(message_view)
            .collect();
        let suggestions = if messages.is_empty() {
            SUGGESTED_PROMPTS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };

        AppViewModel {
            messages,
            loading: self.is_loading(),
            phase: self.phase(),
            suggestions,
            browse: match &self.browse {
                BrowseState::Idle => BrowseView::Hidden,
                BrowseState::Loading => BrowseView::Loading,
                BrowseState::Loaded(jobs) if jobs.is_empty() => BrowseView::Empty,
                BrowseState::Loaded(jobs) => {
                    BrowseView::Cards(jobs.iter().map(card_view).collect())
                }
                BrowseState::Unavailable { .. } => BrowseView::Unavailable,
            },
            detail: match &self.detail {
                JobDetailState::Closed => DetailView::Closed,
                JobDetailState::Loading { job_id } => DetailView::Loading {
                    job_id: job_id.clone(),
                },
                JobDetailState::Loaded(detail) => DetailView::Loaded(detail.clone()),
                JobDetailState::NotFound { job_id } => DetailView::NotFound {
                    job_id: job_id.clone(),
                },
            },
            dirty: self.dirty,
        }
    }

    /// Returns whether a re-render is due, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Appends the user turn and placeholder, entering `Sending`.
    pub(crate) fn begin_request(
        &mut self,
        text: String,
        at: DateTime<Utc>,
    ) -> (MessageId, ChatRequest) {
        let message_id = self.conversation.append_user_message(text.clone(), at);
        self.request = Some(RequestState {
            message_id: message_id.clone(),
            phase: RequestPhase::Sending,
        });
        let request = ChatRequest {
            message: text,
            history: self.history(),
        };
        self.mark_dirty();
        (message_id, request)
    }

    /// True when `id` names the request that is still in progress.
    pub(crate) fn is_current(&self, id: &MessageId) -> bool {
        self.in_flight_message() == Some(id)
    }

    pub(crate) fn set_phase(&mut self, phase: RequestPhase) {
        if let Some(request) = self.request.as_mut() {
            if request.phase != phase {
                request.phase = phase;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn apply_delta(&mut self, id: &MessageId, delta: &str) {
        if !self.is_current(id) {
            return;
        }
        self.set_phase(RequestPhase::Streaming);
        if self.conversation.append_text_delta(id, delta) {
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_jobs(&mut self, id: &MessageId, jobs: Vec<JobSummary>) {
        if !self.is_current(id) {
            return;
        }
        self.set_phase(RequestPhase::Streaming);
        if self.conversation.set_jobs(id, jobs) {
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self, id: &MessageId) {
        if !self.is_current(id) {
            return;
        }
        self.conversation.finish(id);
        self.set_phase(RequestPhase::Completed);
        self.mark_dirty();
    }

    /// Terminal failure path; a request already finished is left untouched.
    pub(crate) fn fail(&mut self, id: &MessageId) {
        if !self.is_current(id) {
            return;
        }
        self.conversation.mark_errored(id, TRANSPORT_ERROR_NOTE);
        self.conversation.finish(id);
        self.set_phase(RequestPhase::Failed);
        self.mark_dirty();
    }

    pub(crate) fn reset_conversation(&mut self, at: DateTime<Utc>) {
        let mut conversation = Conversation::new();
        if let Some(prompt) = &self.system_prompt {
            conversation.append_system_message(prompt.clone(), at);
        }
        self.conversation = conversation;
        self.request = None;
        self.mark_dirty();
    }

    pub(crate) fn set_browse(&mut self, browse: BrowseState) {
        self.browse = browse;
        self.mark_dirty();
    }

    pub(crate) fn set_detail(&mut self, detail: JobDetailState) {
        self.detail = detail;
        self.mark_dirty();
    }

    pub(crate) fn detail_pending_for(&self, job_id: &str) -> bool {
        matches!(&self.detail, JobDetailState::Loading { job_id: pending } if pending == job_id)
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.conversation
            .messages()
            .iter()
            .filter(|message| !message.in_flight)
            .map(|message| HistoryEntry {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }
}

fn message_view(message: &Message) -> MessageView {
    MessageView {
        id: message.id.clone(),
        role: message.role,
        content: message.content.clone(),
        in_flight: message.in_flight,
        jobs: message.jobs().iter().map(card_view).collect(),
    }
}

fn card_view(job: &JobSummary) -> JobCardView {
    JobCardView {
        job_id: job.job_id.clone(),
        title: job.title.clone(),
        location: job.location(),
        rate: job.formatted_rate(),
        priority: job.priority.clone(),
        meta_line: job.meta_line.clone(),
        route: crate::job::job_route(&job.job_id),
        url: job.url.clone(),
    }
}
