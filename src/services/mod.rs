pub mod agent;
pub mod llm;
pub mod prompts;
pub mod setup;
#[cfg(test)]
pub(crate) mod testing;
pub mod workflow;
