// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Interactive terminal client
//!
//! Reads lines from stdin, runs one turn per line, and renders progress
//! and the final reply to stdout. User-facing text goes to stdout only;
//! application logs go to the log file.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::engine::progress::{ProgressEvent, ProgressSink};
use crate::engine::{ChatEngine, ChatbotState};
use crate::error::Result;

/// Run the interactive chat loop until EOF or an exit command
pub async fn run_chat(engine: Arc<ChatEngine>) -> Result<()> {
    println!("maestro chat — type a question, 'exit' to quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut state = ChatbotState::new();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            prompt()?;
            continue;
        }
        if query == "exit" || query == "quit" {
            break;
        }

        run_one_turn(&engine, &mut state, query).await;
        prompt()?;
    }

    Ok(())
}

/// Run a single turn, rendering progress as it streams
async fn run_one_turn(engine: &ChatEngine, state: &mut ChatbotState, query: &str) {
    let (sink, mut rx) = ProgressSink::channel(64);

    let renderer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render_event(&event);
        }
    });

    engine.run_turn(state, query, &sink).await;
    drop(sink);
    let _ = renderer.await;
}

fn render_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::Progress { source, text } => println!("  [{}] {}", source, text),
        ProgressEvent::ToolStart { agent, tool, .. } => {
            println!("  [{}] -> {}", agent, tool)
        }
        ProgressEvent::ToolEnd { agent, tool, ok } => {
            let mark = if *ok { "ok" } else { "failed" };
            println!("  [{}] <- {} ({})", agent, tool, mark)
        }
        ProgressEvent::Token { text } => {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::Final { text } => println!("\n{}\n", text),
        ProgressEvent::Error { message } => println!("\n{}\n", message),
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
