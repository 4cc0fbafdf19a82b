//! `aiagent run` — Answer one query with the ReAct agent.

use std::path::Path;
use std::sync::Arc;

use aiagent_agent::{AgentStreamEvent, LoopOutcome, ReactAgent};

pub async fn run(
    config_path: Option<&Path>,
    query: &str,
    stream: bool,
    step_limit: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let provider = aiagent_providers::build_from_config(&config)?;
    let tools = Arc::new(aiagent_tools::load_registry(&config)?);

    let mut agent = ReactAgent::from_config(provider, tools, &config);
    if let Some(limit) = step_limit {
        agent = agent.with_step_limit(limit);
    }

    if stream {
        return stream_run(&agent, query).await;
    }

    eprint!("  Thinking...");
    let result = agent.run(query).await;
    eprint!("\r              \r");

    match result.outcome {
        LoopOutcome::Error(message) => Err(message.into()),
        LoopOutcome::StepLimitExceeded { best_effort } => {
            eprintln!(
                "  Step limit of {} reached, showing the last tool output",
                agent.step_limit()
            );
            println!("{best_effort}");
            Ok(())
        }
        outcome => {
            println!("{}", outcome.text());
            Ok(())
        }
    }
}

async fn stream_run(agent: &ReactAgent, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut rx = agent.run_stream(query);

    while let Some(event) = rx.recv().await {
        match event {
            AgentStreamEvent::ToolStarted { tool } => eprintln!("  -> {tool}"),
            AgentStreamEvent::ToolOutput { tool, content, source } => {
                eprintln!("  <- {tool}: {}", preview(&content));
                for s in source.unwrap_or_default() {
                    eprintln!("     {} ({})", s.title, s.url);
                }
            }
            AgentStreamEvent::Answer { content } => println!("{content}"),
            AgentStreamEvent::Error { message } => return Err(message.into()),
            AgentStreamEvent::Done => break,
        }
    }

    Ok(())
}

/// First line of a tool result, shortened for the terminal.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 120;
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > MAX_CHARS {
        let cut: String = line.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
