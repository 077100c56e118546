//! Interactive session: prompt loop, slash commands, colored output.

pub mod colors;
pub mod commands;

use std::sync::Arc;

use anyhow::Result;
use dialoguer::{BasicHistory, Input};

use crate::agent::Agent;
use crate::config::Config;
use crate::observability::{create_observer, Observer, ObserverEvent};

pub(crate) const RULE: &str =
    "============================================================";

/// Mirrors utensil activity onto the console, then forwards every event to
/// the configured backend.
pub struct ConsoleObserver {
    inner: Arc<dyn Observer>,
}

impl ConsoleObserver {
    pub fn new(inner: Arc<dyn Observer>) -> Self {
        Self { inner }
    }
}

impl Observer for ConsoleObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::CallParsed { utensil } => {
                println!("{}", colors::utensil(format!("Utensil Call: {utensil}")));
            }
            ObserverEvent::UtensilCall {
                utensil,
                duration,
                success,
            } => {
                let line = format!(
                    "  {} {} ({} ms)",
                    if *success { "✓" } else { "✗" },
                    utensil,
                    duration.as_millis()
                );
                if *success {
                    println!("{}", colors::result(line));
                } else {
                    println!("{}", colors::error(line));
                }
            }
            _ => {}
        }
        self.inner.record_event(event);
    }
}

/// Builds an agent whose observer mirrors utensil activity to the console
/// in addition to the configured backend.
pub fn build_agent(config: &Config) -> Result<Agent> {
    let observer = Arc::new(ConsoleObserver::new(create_observer(&config.observability)));
    Agent::from_config_with_observer(config, observer)
}

fn print_banner() {
    println!("\n{}", colors::separator(RULE));
    println!("{}", colors::header("🍳 skillet - Interactive Agent REPL"));
    println!("{}", colors::separator(RULE));
    println!("Enter your tasks and I'll help you complete them.");
    println!("Type 'exit', 'quit', or press Ctrl+D to exit.");
    println!("Type /help to see available commands.");
    println!("{}\n", colors::separator(RULE));
}

/// Runs the interactive session until the user exits.
pub async fn run_session(config: &Config) -> Result<()> {
    let mut agent = build_agent(config)?;
    let mut input_history = BasicHistory::new();

    print_banner();

    loop {
        let line: String = match Input::new()
            .with_prompt(colors::user("skillet").to_string())
            .allow_empty(true)
            .history_with(&mut input_history)
            .interact_text()
        {
            Ok(line) => line,
            Err(dialoguer::Error::IO(err))
                if err.kind() == std::io::ErrorKind::Interrupted =>
            {
                println!("\n⚠️  Interrupted. Type 'exit' or 'quit' to exit the REPL.\n");
                continue;
            }
            Err(_) => {
                println!("\n👋 Goodbye!\n");
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("\n👋 Goodbye!\n");
            break;
        }
        if commands::is_command(input) {
            commands::execute(&mut agent, input).await;
            continue;
        }

        match agent.run_task(input).await {
            Ok(response) => {
                if !response.is_empty() {
                    println!("\n{}\n", colors::agent(format!("Agent: {response}")));
                }
            }
            Err(e) => {
                println!("\n{}\n", colors::error(format!("❌ Error: {e}")));
            }
        }
    }

    Ok(())
}
