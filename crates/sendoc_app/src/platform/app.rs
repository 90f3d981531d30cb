use std::io::{self, BufRead, Write};
use std::time::Duration;

use chrono::Utc;
use sendoc_core::{update, AppState, BrowseState, JobDetailState, JobQuery, Msg};
use sendoc_engine::EngineStopped;
use sendoc_logging::{sendoc_debug, sendoc_error};

use super::cli::{parse_param, query_from_params};
use super::effects::EffectRunner;
use super::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

const HELP: &str = "\
Type a message to chat, or one of:
  /jobs                  list open positions
  /search key=value ...  search positions, e.g. /search state=PA
  /job <id>              show one position
  /clear                 start a new conversation
  /quit                  leave
";

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Empty,
    Message(String),
    Jobs,
    Search(JobQuery),
    Job(String),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let mut words = command.split_whitespace();
    match words.next().unwrap_or_default() {
        "jobs" => Input::Jobs,
        "search" => {
            let params: Result<Vec<_>, String> = words.map(parse_param).collect();
            match params {
                Ok(params) => Input::Search(query_from_params(params)),
                Err(err) => Input::Invalid(err),
            }
        }
        "job" => match words.next() {
            Some(id) => Input::Job(id.to_string()),
            None => Input::Invalid("usage: /job <id>".to_string()),
        },
        "clear" => Input::Clear,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown command /{other}; try /help")),
    }
}

/// Owns the core state and drives it from user input and engine events.
pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    out: W,
}

impl<W: Write> App<W> {
    pub fn new(state: AppState, runner: EffectRunner, renderer: Renderer, out: W) -> Self {
        Self {
            state,
            runner,
            renderer,
            out,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty {
            self.render()?;
        }
        Ok(())
    }

    pub fn render(&mut self) -> io::Result<()> {
        let text = self.renderer.render(&self.state.view());
        if !text.is_empty() {
            self.out.write_all(text.as_bytes())?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Applies engine events until `busy` no longer holds.
    ///
    /// A stopped engine fails whatever is still pending instead of waiting.
    pub fn wait_while(&mut self, busy: impl Fn(&AppState) -> bool) -> io::Result<()> {
        while busy(&self.state) {
            match self.runner.next_msg(POLL_INTERVAL) {
                Ok(Some(msg)) => self.dispatch(msg)?,
                Ok(None) => {}
                Err(stopped) => {
                    sendoc_error!("{}; failing pending requests", stopped);
                    self.fail_pending(stopped)?;
                    if busy(&self.state) {
                        return Err(io::Error::other(stopped));
                    }
                }
            }
        }
        Ok(())
    }

    fn fail_pending(&mut self, stopped: EngineStopped) -> io::Result<()> {
        if let Some(message_id) = self.state.in_flight_message().cloned() {
            self.dispatch(Msg::RequestFailed {
                message_id,
                reason: stopped.to_string(),
            })?;
        }
        if matches!(self.state.browse(), BrowseState::Loading) {
            self.dispatch(Msg::JobsUnavailable {
                reason: stopped.to_string(),
            })?;
        }
        if let JobDetailState::Loading { job_id } = self.state.detail() {
            let job_id = job_id.clone();
            self.dispatch(Msg::JobNotFound { job_id })?;
        }
        Ok(())
    }

    pub fn ask(&mut self, text: String) -> io::Result<()> {
        self.dispatch(Msg::Submitted { text, at: Utc::now() })?;
        self.wait_while(AppState::is_loading)
    }

    pub fn browse(&mut self, query: JobQuery) -> io::Result<()> {
        self.dispatch(Msg::BrowseRequested(query))?;
        self.wait_while(|state| matches!(state.browse(), BrowseState::Loading))
    }

    pub fn open_job(&mut self, job_id: String) -> io::Result<()> {
        self.dispatch(Msg::JobDetailRequested { job_id })?;
        self.wait_while(|state| matches!(state.detail(), JobDetailState::Loading { .. }))
    }

    /// Line-oriented chat until `/quit` or end of input.
    ///
    /// Each turn finishes before the next line is read, so input typed while
    /// an answer streams is queued rather than dropped.
    pub fn run_interactive(&mut self, input: impl BufRead) -> io::Result<()> {
        self.render()?;
        self.out.write_all(b"Type /help for commands.\n")?;
        self.prompt()?;

        for line in input.lines() {
            let line = line?;
            sendoc_debug!("input line len={}", line.len());
            match parse_input(&line) {
                Input::Empty => {}
                Input::Message(text) => self.ask(text)?,
                Input::Jobs => self.browse(JobQuery::all())?,
                Input::Search(query) => self.browse(query)?,
                Input::Job(id) => self.open_job(id)?,
                Input::Clear => {
                    self.dispatch(Msg::ClearConversation { at: Utc::now() })?;
                    self.out.write_all(b"Conversation cleared.\n")?;
                }
                Input::Help => self.out.write_all(HELP.as_bytes())?,
                Input::Quit => return Ok(()),
                Input::Invalid(reason) => writeln!(self.out, "{reason}")?,
            }
            self.prompt()?;
        }
        // End of input: let a running answer finish before leaving.
        self.wait_while(AppState::is_loading)
    }

    fn prompt(&mut self) -> io::Result<()> {
        self.out.write_all(b"> ")?;
        self.out.flush()
    }
}
