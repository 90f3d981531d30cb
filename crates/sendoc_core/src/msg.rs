use chrono::{DateTime, Utc};

use crate::{JobDetail, JobQuery, JobSummary, MessageId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted the input line.
    Submitted { text: String, at: DateTime<Utc> },
    /// Response headers arrived and the body is being read.
    StreamOpened { message_id: MessageId },
    /// Incremental assistant text.
    TextDelta { message_id: MessageId, delta: String },
    /// Job list for the in-flight reply; replaces any earlier list.
    JobsReceived {
        message_id: MessageId,
        jobs: Vec<JobSummary>,
    },
    /// Non-streaming reply carrying the whole answer at once.
    ReplyReceived {
        message_id: MessageId,
        text: String,
        jobs: Vec<JobSummary>,
    },
    /// The response body ended normally.
    StreamCompleted { message_id: MessageId },
    /// Transport failure at any point of the request.
    RequestFailed {
        message_id: MessageId,
        reason: String,
    },
    /// User asked to browse or search the job board.
    BrowseRequested(JobQuery),
    /// Job board results; already degraded to empty on bad payloads.
    JobsListed(Vec<JobSummary>),
    /// Job board could not be reached.
    JobsUnavailable { reason: String },
    /// User opened a listing.
    JobDetailRequested { job_id: String },
    /// Listing for the requested id; the body may spell the id differently.
    JobDetailLoaded { job_id: String, detail: JobDetail },
    JobNotFound { job_id: String },
    /// Start over, keeping the system prompt.
    ClearConversation { at: DateTime<Utc> },
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
