// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Maestro - multi-agent chatbot runtime
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(version, about = "Multi-agent chatbot orchestration runtime")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v DEBUG, -vv DEBUG plus prompt debugging)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (WARNING level)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Explicit log level (overrides -v/-q)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log file path (overrides the timestamped default)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable prompt debugging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive terminal session
    Chat,

    /// Start the WebSocket server with the HTML client
    Web {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// List registered agents
    Agents,

    /// Print the effective configuration summary
    Info,
}

impl Cli {
    /// Log level derived from flags, None when settings decide
    pub fn effective_log_level(&self) -> Option<String> {
        if let Some(level) = &self.log_level {
            return Some(level.clone());
        }
        if self.quiet {
            return Some("warn".to_string());
        }
        if self.verbose > 0 {
            return Some("debug".to_string());
        }
        None
    }

    /// Whether prompt debugging is requested from the command line
    pub fn prompt_debug(&self) -> bool {
        self.debug || self.verbose >= 2
    }
}
