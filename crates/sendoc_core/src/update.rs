use crate::{AppState, BrowseState, Effect, JobDetailState, Msg, RequestPhase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Submitted { text, at } => {
            let text = text.trim();
            // Loading guard: one request in flight at a time.
            if text.is_empty() || state.is_loading() {
                return (state, Vec::new());
            }
            let (message_id, request) = state.begin_request(text.to_string(), at);
            vec![Effect::SendChat {
                message_id,
                request,
            }]
        }
        Msg::StreamOpened { message_id } => {
            if state.is_current(&message_id) && state.phase() == RequestPhase::Sending {
                state.set_phase(RequestPhase::Streaming);
            }
            Vec::new()
        }
        Msg::TextDelta { message_id, delta } => {
            state.apply_delta(&message_id, &delta);
            Vec::new()
        }
        Msg::JobsReceived { message_id, jobs } => {
            state.apply_jobs(&message_id, jobs);
            Vec::new()
        }
        Msg::ReplyReceived {
            message_id,
            text,
            jobs,
        } => {
            state.apply_delta(&message_id, &text);
            state.apply_jobs(&message_id, jobs);
            state.complete(&message_id);
            Vec::new()
        }
        Msg::StreamCompleted { message_id } => {
            state.complete(&message_id);
            Vec::new()
        }
        Msg::RequestFailed { message_id, .. } => {
            state.fail(&message_id);
            Vec::new()
        }
        Msg::BrowseRequested(query) => {
            state.set_browse(BrowseState::Loading);
            vec![Effect::LoadJobs { query }]
        }
        Msg::JobsListed(jobs) => {
            state.set_browse(BrowseState::Loaded(jobs));
            Vec::new()
        }
        Msg::JobsUnavailable { reason } => {
            state.set_browse(BrowseState::Unavailable { reason });
            Vec::new()
        }
        Msg::JobDetailRequested { job_id } => {
            let job_id = job_id.trim().to_string();
            if job_id.is_empty() {
                return (state, Vec::new());
            }
            state.set_detail(JobDetailState::Loading {
                job_id: job_id.clone(),
            });
            vec![Effect::LoadJobDetail { job_id }]
        }
        Msg::JobDetailLoaded { job_id, detail } => {
            // A late answer for a listing the user already left is dropped.
            if state.detail_pending_for(&job_id) {
                state.set_detail(JobDetailState::Loaded(detail));
            }
            Vec::new()
        }
        Msg::JobNotFound { job_id } => {
            if state.detail_pending_for(&job_id) {
                state.set_detail(JobDetailState::NotFound { job_id });
            }
            Vec::new()
        }
        Msg::ClearConversation { at } => {
            if !state.is_loading() {
                state.reset_conversation(at);
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
