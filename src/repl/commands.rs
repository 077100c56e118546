//! Slash commands for the interactive session.

use crate::agent::Agent;
use crate::repl::{colors, RULE};

/// True when the input names a slash command.
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

/// Splits a `/command arg ...` line into the lowercased command name and its
/// arguments.
pub fn parse(input: &str) -> (String, Vec<&str>) {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut parts = body.split_whitespace();
    let name = parts.next().unwrap_or("").to_lowercase();
    let arguments = parts.collect();
    (name, arguments)
}

/// Dispatches one slash command against the agent.
pub async fn execute(agent: &mut Agent, input: &str) {
    let (name, arguments) = parse(input);
    match name.as_str() {
        "compact" => compact(agent).await,
        "clear" => clear(agent),
        "help" => help(),
        "models" => models(agent),
        "model" => model(agent, &arguments),
        _ => {
            println!("\n{}", colors::error(format!("❌ Unknown command: /{name}")));
            println!("Type /help to see available commands.\n");
        }
    }
}

async fn compact(agent: &mut Agent) {
    if agent.history().is_empty() {
        println!("\n{}\n", colors::info("💡 No conversation history to compact."));
        return;
    }

    println!("\n{}", colors::info("🔄 Compacting conversation history..."));
    match agent.compact_history().await {
        Ok(summary) => {
            println!("\n{}\n", colors::info("✅ Conversation compacted. Summary:"));
            println!("{summary}\n");
        }
        Err(e) => {
            println!(
                "\n{}\n",
                colors::error(format!("❌ Error compacting conversation: {e}"))
            );
        }
    }
}

fn clear(agent: &mut Agent) {
    agent.clear_history();
    println!(
        "\n{}\n",
        colors::info("✅ Conversation history cleared. Starting fresh!")
    );
}

fn help() {
    println!("\n{}", colors::separator(RULE));
    println!("{}", colors::header("📋 Available Commands"));
    println!("{}", colors::separator(RULE));
    println!("/compact  - Summarize conversation history to save tokens");
    println!("/clear    - Erase conversation history and start fresh");
    println!("/models   - List available models");
    println!("/model    - Show or switch the current model");
    println!("/help     - Display this help message");
    println!("{}\n", colors::separator(RULE));
}

fn models(agent: &Agent) {
    println!("\n{}", colors::separator(RULE));
    println!("{}", colors::header("📋 Available Models"));
    println!("{}", colors::separator(RULE));
    for (model_id, info) in agent.models() {
        let marker = if model_id.as_str() == agent.model() {
            " ← current"
        } else {
            ""
        };
        println!("  {model_id}");
        println!("    {} - {}{marker}", info.display_name, info.description);
    }
    println!("{}", colors::separator(RULE));
    println!("Use /model <id> to switch.\n");
}

fn model(agent: &mut Agent, arguments: &[&str]) {
    let Some(new_model) = arguments.first() else {
        println!(
            "\n{}",
            colors::info(format!("📋 Current model: {}", agent.model()))
        );
        println!("Use /model <id> to switch or /models to list available models.\n");
        return;
    };

    if agent.switch_model(new_model) {
        println!("\n{}\n", colors::info(format!("✅ Switched to {new_model}")));
    } else {
        println!("\n{}", colors::error(format!("❌ Unknown model: {new_model}")));
        println!("Use /models to see available models.\n");
    }
}
