// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Maestro binary
//!
//! Reference chatbot executable. With no specialists registered the
//! supervisor answers directly; chatbot crates embed the library and
//! register their own agents before starting the same commands.

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::error;

use maestro::agents::AgentRegistry;
use maestro::chat;
use maestro::cli::{Cli, Commands};
use maestro::config::Settings;
use maestro::engine::ChatEngine;
use maestro::error::{MaestroError, Result};
use maestro::llm::providers::OpenAiProvider;
use maestro::llm::ModelClient;
use maestro::logging::{self, LogMode};
use maestro::web;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        // Bare invocation prints the help panel
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    if let Err(e) = run(&cli, command).await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, command: &Commands) -> Result<()> {
    let mut settings = Settings::load()?;
    if cli.prompt_debug() {
        settings.debug = true;
    }
    let log_level = cli
        .effective_log_level()
        .unwrap_or_else(|| settings.log_level.clone());

    match command {
        Commands::Info => {
            print!("{}", settings.summary());
            Ok(())
        }
        Commands::Agents => {
            let registry = AgentRegistry::new();
            print_agents(&registry);
            Ok(())
        }
        Commands::Chat => {
            let (dir, filename) = match &cli.log_file {
                Some(path) => {
                    let (dir, file) = logging::split_log_file(path);
                    (dir, file)
                }
                None => (settings.log_dir.clone(), settings.log_filename.clone()),
            };
            let _guard = logging::init(&log_level, LogMode::File { dir, filename })?;

            let engine = build_engine(settings)?;
            chat::run_chat(engine).await
        }
        Commands::Web { host, port } => {
            let _guard = logging::init(&log_level, LogMode::Stderr)?;

            let engine = build_engine(settings)?;
            web::serve(engine, host, *port).await
        }
    }
}

fn build_engine(settings: Settings) -> Result<Arc<ChatEngine>> {
    let api_key = settings.api_key.clone().ok_or_else(|| {
        MaestroError::Configuration(
            "api_key: set MAESTRO_API_KEY or add api_key to secrets.yml".to_string(),
        )
    })?;

    let provider = OpenAiProvider::new(api_key);
    let client = Arc::new(ModelClient::new(Arc::new(provider)));
    let registry = Arc::new(AgentRegistry::new());

    Ok(Arc::new(ChatEngine::new(
        client,
        Arc::new(settings),
        registry,
    )))
}

fn print_agents(registry: &AgentRegistry) {
    let agents = registry.get_all();
    if agents.is_empty() {
        println!("No agents registered.");
        return;
    }
    for agent in agents {
        let description = agent.capabilities.lines().next().unwrap_or("");
        println!(
            "{:<20} {:<50} {} tool(s)",
            agent.name,
            description,
            agent.tools.len()
        );
    }
}
