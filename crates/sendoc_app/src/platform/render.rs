use std::collections::HashMap;
use std::fmt::Write as _;

use sendoc_core::{
    AppViewModel, BrowseView, DetailView, JobCardView, JobDetail, MessageId, MessageView, Role,
};

const DETAIL_PLACEHOLDER: &str =
    "Details coming soon. Contact us for the full scope, schedule, and site information.";

#[derive(Debug, Default)]
struct Printed {
    bytes: usize,
    finished: bool,
}

/// Turns successive view models into append-only terminal output.
///
/// Only what changed since the previous call is written, so streamed text
/// shows up as it arrives.
#[derive(Debug, Default)]
pub struct Renderer {
    echo_user: bool,
    printed: HashMap<MessageId, Printed>,
    suggestions_shown: bool,
    last_browse: BrowseView,
    last_detail: DetailView,
}

impl Renderer {
    /// `echo_user` repeats user turns, for when they were not typed at a prompt.
    pub fn new(echo_user: bool) -> Self {
        Self {
            echo_user,
            ..Self::default()
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> String {
        let mut out = String::new();

        // A cleared conversation reuses message ids.
        if view.messages.is_empty() && !self.printed.is_empty() {
            self.printed.clear();
            self.suggestions_shown = false;
        }

        if !view.suggestions.is_empty() && !self.suggestions_shown {
            self.suggestions_shown = true;
            out.push_str("Try asking:\n");
            for suggestion in &view.suggestions {
                let _ = writeln!(out, "  \u{2022} {suggestion}");
            }
        }

        for message in &view.messages {
            self.render_message(message, &mut out);
        }

        if view.browse != self.last_browse {
            self.last_browse = view.browse.clone();
            render_browse(&view.browse, &mut out);
        }
        if view.detail != self.last_detail {
            self.last_detail = view.detail.clone();
            render_detail(&view.detail, &mut out);
        }
        out
    }

    fn render_message(&mut self, message: &MessageView, out: &mut String) {
        let printed = match self.printed.get_mut(&message.id) {
            Some(printed) => printed,
            None => {
                let fresh = self.printed.entry(message.id.clone()).or_default();
                match message.role {
                    Role::User if !self.echo_user => {
                        fresh.bytes = message.content.len();
                        fresh.finished = true;
                        return;
                    }
                    Role::User => out.push_str("You: "),
                    Role::Assistant => out.push_str("Assistant: "),
                    Role::System => out.push_str("System: "),
                }
                fresh
            }
        };
        if printed.finished {
            return;
        }

        if let Some(new_text) = message.content.get(printed.bytes..) {
            out.push_str(new_text);
            printed.bytes = message.content.len();
        }
        if !message.in_flight {
            printed.finished = true;
            out.push('\n');
            for card in &message.jobs {
                render_card(card, out);
            }
        }
    }
}

fn render_card(card: &JobCardView, out: &mut String) {
    let _ = writeln!(out, "  [{}] {}", card.job_id, card.title);
    let details: Vec<&str> = [
        Some(card.location.as_str()).filter(|location| !location.is_empty()),
        card.rate.as_deref(),
        card.priority.as_deref(),
        card.meta_line.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        let _ = writeln!(out, "      {}", details.join(" \u{2022} "));
    }
    let _ = writeln!(out, "      {}", card.route);
}

fn render_browse(browse: &BrowseView, out: &mut String) {
    match browse {
        BrowseView::Hidden => {}
        BrowseView::Loading => out.push_str("Loading jobs\u{2026}\n"),
        BrowseView::Empty => out.push_str("No results.\n"),
        BrowseView::Unavailable => out.push_str("Sorry, I couldn't reach the server.\n"),
        BrowseView::Cards(cards) => {
            let _ = writeln!(out, "{} position(s):", cards.len());
            for card in cards {
                render_card(card, out);
            }
        }
    }
}

fn render_detail(detail: &DetailView, out: &mut String) {
    match detail {
        DetailView::Closed => {}
        DetailView::Loading { job_id } => {
            let _ = writeln!(out, "Loading job {job_id}\u{2026}");
        }
        DetailView::NotFound { job_id } => {
            let _ = writeln!(out, "Job not found: {job_id}. Please pick another role.");
        }
        DetailView::Loaded(job) => render_job_detail(job, out),
    }
}

fn render_job_detail(job: &JobDetail, out: &mut String) {
    let summary = &job.summary;
    let _ = writeln!(out, "{}", summary.title);
    let location = summary.location();
    if !location.is_empty() {
        let _ = writeln!(out, "{location}");
    }
    let badges: Vec<String> = [
        summary.priority.clone(),
        job.display_rate(),
        summary.meta_line.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !badges.is_empty() {
        let _ = writeln!(out, "{}", badges.join(" | "));
    }

    out.push_str("About this role\n");
    let description = job
        .description
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(DETAIL_PLACEHOLDER);
    let _ = writeln!(out, "  {description}");
    for point in &job.description_points {
        let _ = writeln!(out, "  - {point}");
    }
    if let Some(url) = &summary.url {
        let _ = writeln!(out, "View / Apply: {url}");
    }
}
