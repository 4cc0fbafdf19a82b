//! `aiagent plan` — Break a goal into search queries.

use std::path::Path;

use aiagent_agent::TaskPlanner;

pub async fn run(config_path: Option<&Path>, goal: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let provider = aiagent_providers::build_from_config(&config)?;

    let planner = TaskPlanner::new(provider, config.agent.language.clone());
    let tasks = planner.start(goal, &config.llm.sampling).await?;

    if tasks.is_empty() {
        eprintln!("  The model did not return any sub-queries.");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&tasks)?);
    Ok(())
}
