use crate::core::config::Config;
use anyhow::{bail, Result};
use inquire::Text;

/// Topic from the config, or asked for interactively. The answer is stored
/// back into `config`.
pub fn run_setup(config: &mut Config) -> Result<String> {
    if let Some(topic) = configured_topic(config) {
        return Ok(topic);
    }
    if config.unattended {
        bail!("No topic configured. Set `topic` in the config file for unattended runs.");
    }

    let topic = Text::new("What should the story be about?")
        .with_help_message("A short topic, e.g. \"a lighthouse keeper hears voices in the fog\"")
        .prompt()?;
    let topic = topic.trim().to_string();
    if topic.is_empty() {
        bail!("A topic is required");
    }
    config.topic = Some(topic.clone());
    Ok(topic)
}

fn configured_topic(config: &Config) -> Option<String> {
    config
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}
