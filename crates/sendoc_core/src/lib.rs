//! Sendoc core: pure conversation state machine and view-model helpers.
mod effect;
mod job;
mod message;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{ChatRequest, Effect, HistoryEntry, JobQuery};
pub use job::{format_rate, job_route, parse_rate_text, JobDetail, JobSummary, RateUnit};
pub use message::{Conversation, Message, MessageId, Role};
pub use msg::Msg;
pub use state::{
    AppState, BrowseState, JobDetailState, RequestPhase, RequestState, TRANSPORT_ERROR_NOTE,
};
pub use update::update;
pub use view_model::{
    AppViewModel, BrowseView, DetailView, JobCardView, MessageView, SUGGESTED_PROMPTS,
};
