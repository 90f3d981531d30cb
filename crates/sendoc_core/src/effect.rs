use serde::{Deserialize, Serialize};

use crate::{MessageId, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a chat request whose output streams into `message_id`.
    SendChat {
        message_id: MessageId,
        request: ChatRequest,
    },
    LoadJobs { query: JobQuery },
    LoadJobDetail { job_id: String },
}

/// What the backend needs to answer one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Every settled message so far, the new user turn included.
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Search parameters for the job listing endpoints. Empty means "all jobs".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobQuery {
    pub params: Vec<(String, String)>,
}

impl JobQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
