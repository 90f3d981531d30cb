use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sendoc_core::JobQuery;

use super::config::BASE_URL_ENV;

#[derive(Debug, Parser)]
#[command(name = "sendoc", version, about = "Chat with a healthcare job-search assistant")]
pub struct Cli {
    /// RON config file; defaults to ./sendoc.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the config file.
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Mirror debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Interactive conversation (the default).
    Chat,
    /// Send one message, print the streamed answer and exit.
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List all open positions.
    Jobs,
    /// Search positions with key=value filters, e.g. `state=PA specialty=CRNA`.
    Search {
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Show one position.
    Job { id: String },
    /// Print the session id sent with chat requests.
    Session,
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

pub(crate) fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

pub(crate) fn query_from_params(params: Vec<(String, String)>) -> JobQuery {
    params
        .into_iter()
        .fold(JobQuery::all(), |query, (key, value)| query.with(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_subcommand_means_chat() {
        let cli = Cli::try_parse_from(["sendoc"]).unwrap();
        assert_eq!(cli.command_or_default(), Command::Chat);
        assert!(!cli.verbose);
    }

    #[test]
    fn ask_joins_words_later() {
        let cli = Cli::try_parse_from(["sendoc", "ask", "CRNA", "jobs", "in", "PA"]).unwrap();
        match cli.command_or_default() {
            Command::Ask { text } => assert_eq!(text.join(" "), "CRNA jobs in PA"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["sendoc", "ask"]).is_err());
    }

    #[test]
    fn search_params_become_query() {
        let cli = Cli::try_parse_from([
            "sendoc",
            "--base-url",
            "http://localhost:8000",
            "search",
            "state=PA",
            "specialty = CRNA",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8000"));
        let Command::Search { params } = cli.command_or_default() else {
            panic!("expected search");
        };
        let query = query_from_params(params);
        assert_eq!(
            query.params,
            vec![
                ("state".to_string(), "PA".to_string()),
                ("specialty".to_string(), "CRNA".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_param_is_rejected() {
        assert!(Cli::try_parse_from(["sendoc", "search", "PA"]).is_err());
        assert!(Cli::try_parse_from(["sendoc", "search", "=PA"]).is_err());
    }

    #[test]
    fn base_url_falls_back_to_environment() {
        let command = <Cli as clap::CommandFactory>::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "base_url")
            .unwrap();
        assert_eq!(arg.get_env(), Some(std::ffi::OsStr::new(BASE_URL_ENV)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sendoc", "job", "JO-1", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command_or_default(), Command::Job { id: "JO-1".into() });
    }
}
