// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::TaskId;
use frontend::render::{TASK_LIST_ID, page};
use frontend::{
    Config, Form, Host, HttpTransport, ListAction, Outcome, ViewSynchronizer,
    visible_notifications,
};

/// Headless driver for the task list page: submits one form to the task
/// server and prints what the page would show afterwards.
#[derive(Parser, Debug)]
#[command(name = "taskview", version)]
struct Cli {
    /// Task server origin; overrides TASKVIEW_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Answer yes to confirmation prompts.
    #[arg(long, short)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task and print the list the server returns.
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Deadline as `YYYY-MM-DDTHH:MM`.
        #[arg(long, default_value = "")]
        deadline: String,
    },
    /// Advance a task to its next status.
    Toggle { id: TaskId },
    /// Delete a task.
    Delete { id: TaskId },
    /// Set a task's deadline (`YYYY-MM-DDTHH:MM`), or clear it when omitted.
    Deadline { id: TaskId, value: Option<String> },
    /// Replace a task's description.
    Describe { id: TaskId, text: String },
    /// Delete every task.
    Clear,
}

/// Terminal stand-in for the browser: prompts on stdin, and reports reloads.
struct TerminalHost {
    assume_yes: bool,
}

impl Host for TerminalHost {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }

    fn reload(&self) {
        tracing::warn!("The page needs a full reload to show the server's state.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let transport = HttpTransport::new(&config).context("Failed to set up the HTTP client")?;
    let host = TerminalHost {
        assume_yes: cli.yes,
    };
    let sync = ViewSynchronizer::attach(config, transport, host, page().into_shared());

    let outcome = match cli.command {
        Command::Add {
            title,
            description,
            deadline,
        } => {
            sync.set_add_field("title", &title);
            sync.set_add_field("description", &description);
            sync.set_add_field("deadline", &deadline);
            sync.on_add_submit().await
        }
        Command::Toggle { id } => {
            sync.submit_list_action(Form::row(id, ListAction::ToggleStatus))
                .await
        }
        Command::Delete { id } => sync.submit_list_action(Form::row(id, ListAction::Delete)).await,
        Command::Deadline { id, value } => {
            let form = Form::row(id, ListAction::UpdateDeadline)
                .with_field("new_deadline", value.unwrap_or_default());
            sync.submit_list_action(form).await
        }
        Command::Describe { id, text } => {
            let form =
                Form::row(id, ListAction::UpdateDescription).with_field("new_description", text);
            sync.submit_list_action(form).await
        }
        Command::Clear => sync.on_clear_submit().await,
    };
    tracing::info!("Submission finished: {:?}", outcome);

    let document = sync.document();
    let doc = document.lock();
    for (kind, message) in visible_notifications(&doc) {
        println!("[{kind}] {message}");
    }
    if outcome == Outcome::Patched {
        if let Some(list) = doc.by_id(TASK_LIST_ID) {
            println!("{}", list.to_html());
        }
    }

    Ok(())
}
