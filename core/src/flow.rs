//! The `travelAgent` flow: render the query, hand it to the model together
//! with the tool catalog, return whatever text comes back.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::llm::Collaborator;
use crate::prompt::{self, SYSTEM_PROMPT};
use crate::registry::Registry;

pub use crate::prompt::TravelAgentInput;

pub struct TravelAgentFlow {
    collaborator: Arc<dyn Collaborator>,
    registry: Arc<Registry>,
}

impl TravelAgentFlow {
    pub const NAME: &'static str = "travelAgent";

    pub fn new(collaborator: Arc<dyn Collaborator>, registry: Arc<Registry>) -> Self {
        Self {
            collaborator,
            registry,
        }
    }

    /// Errors from the model are returned as-is; nothing is retried.
    pub async fn run(&self, input: &TravelAgentInput) -> Result<String> {
        let prompt = prompt::render(input);
        info!("Running flow '{}'", Self::NAME);

        let text = self
            .collaborator
            .invoke(SYSTEM_PROMPT, &prompt, &self.registry)
            .await?;

        info!("Flow '{}' produced {} bytes", Self::NAME, text.len());
        Ok(text)
    }
}
