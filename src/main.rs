use anyhow::Result;
use std::sync::Arc;
use storyteller::core::config::Config;
use storyteller::core::io::NativeStorage;
use storyteller::services::llm::create_generator;
use storyteller::services::setup;
use storyteller::services::workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yml".to_string());
    let mut config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please ensure '{}' exists with valid LLM settings.", config_path);
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let topic = setup::run_setup(&mut config)?;

    let generator = create_generator(&config.llm)?;

    let mut manager = WorkflowManager::new(config, generator, Arc::new(NativeStorage::new())).await?;
    manager.run(&topic).await?;

    Ok(())
}
