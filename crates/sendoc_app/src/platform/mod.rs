mod app;
mod cli;
mod config;
mod effects;
mod persistence;
mod render;

use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use sendoc_core::{AppState, JobQuery};
use sendoc_engine::ReqwestBackend;
use sendoc_logging::{sendoc_info, LogDestination, DEFAULT_LOG_FILE};

use app::App;
use cli::{query_from_params, Cli, Command};
use config::AppConfig;
use effects::EffectRunner;
use render::Renderer;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_override(cli.base_url.clone());

    init_logging(&config, cli.verbose);
    sendoc_info!("sendoc starting; backend {}", config.base_url);

    let session_id = persistence::resolve_session_id(
        &config.data_dir,
        &Utc::now().to_rfc3339(),
        || uuid::Uuid::new_v4().to_string(),
    );

    let command = cli.command_or_default();
    if command == Command::Session {
        println!("{session_id}");
        return Ok(());
    }

    let backend = ReqwestBackend::new(config.chat_settings(session_id))
        .context("failed to set up the HTTP client")?;
    let state = AppState::with_system_prompt(config.system_prompt.clone(), Utc::now());
    let echo_user = matches!(command, Command::Ask { .. });
    let mut app = App::new(
        state,
        EffectRunner::new(Arc::new(backend)),
        Renderer::new(echo_user),
        io::stdout(),
    );

    match command {
        Command::Chat => app.run_interactive(io::stdin().lock())?,
        Command::Ask { text } => app.ask(text.join(" "))?,
        Command::Jobs => app.browse(JobQuery::all())?,
        Command::Search { params } => app.browse(query_from_params(params))?,
        Command::Job { id } => app.open_job(id)?,
        Command::Session => {}
    }
    io::stdout().flush()?;
    Ok(())
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| config.data_dir.join(DEFAULT_LOG_FILE));
    if let Some(parent) = log_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        let _ = fs::create_dir_all(parent);
    }
    let (destination, level) = if verbose {
        (LogDestination::Both, LevelFilter::Debug)
    } else {
        (LogDestination::File, LevelFilter::Info)
    };
    sendoc_logging::initialize(destination, level, Some(&log_file));
}
