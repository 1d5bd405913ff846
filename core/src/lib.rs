pub mod config;
pub mod flow;
pub mod llm;
pub mod prompt;
pub mod registry;
