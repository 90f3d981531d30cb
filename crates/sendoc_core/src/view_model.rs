use crate::{JobDetail, MessageId, RequestPhase, Role};

/// Starter prompts shown while the conversation has no visible messages.
pub const SUGGESTED_PROMPTS: [&str; 4] = [
    "Show me CRNA positions in Pennsylvania",
    "What are the highest paying specialties?",
    "Find urgent care jobs with good work-life balance",
    "I want $150+ per hour in the Midwest",
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    /// Visible messages in display order; system messages are hidden.
    pub messages: Vec<MessageView>,
    pub loading: bool,
    pub phase: RequestPhase,
    pub suggestions: Vec<String>,
    pub browse: BrowseView,
    pub detail: DetailView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub in_flight: bool,
    pub jobs: Vec<JobCardView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub job_id: String,
    pub title: String,
    pub location: String,
    pub rate: Option<String>,
    pub priority: Option<String>,
    pub meta_line: Option<String>,
    pub route: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrowseView {
    #[default]
    Hidden,
    Loading,
    Empty,
    Cards(Vec<JobCardView>),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailView {
    #[default]
    Closed,
    Loading { job_id: String },
    Loaded(JobDetail),
    NotFound { job_id: String },
}
