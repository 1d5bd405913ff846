use std::fmt;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use travel_tools::{
    search_flights, suggest_hotel, SearchFlightsInput, SuggestHotelInput, SEARCH_FLIGHTS,
    SUGGEST_HOTEL,
};

/// Runs a tool against the raw JSON arguments the model produced.
pub type ToolHandler = fn(&str) -> Result<String>;

// One entry on the menu the model picks from
#[derive(Clone, Serialize)]
pub struct ToolRecord {
    pub name: String,
    pub description: String,

    // The JSON Schema for parameters, so the model knows *how* to call the tool
    pub parameters: Value,

    #[serde(skip)]
    pub handler: ToolHandler,
}

impl fmt::Debug for ToolRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRecord")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Immutable tool catalog, built once at startup and shared across requests.
#[derive(Debug, Clone)]
pub struct Registry {
    tools: Vec<ToolRecord>,
}

impl Registry {
    /// The travel catalog: `searchFlights` and `suggestHotel`.
    pub fn load() -> Self {
        let tools = vec![
            ToolRecord {
                name: SEARCH_FLIGHTS.to_string(),
                description: SearchFlightsInput::description().to_string(),
                parameters: SearchFlightsInput::parameters(),
                handler: run_search_flights,
            },
            ToolRecord {
                name: SUGGEST_HOTEL.to_string(),
                description: SuggestHotelInput::description().to_string(),
                parameters: SuggestHotelInput::parameters(),
                handler: run_suggest_hotel,
            },
        ];

        for tool in &tools {
            debug!("Registered tool '{}'", tool.name);
        }

        Self { tools }
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ToolRecord> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Dispatches a model-issued call by name.
    pub fn invoke(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = self
            .find(name)
            .with_context(|| format!("Tool '{}' not found in registry", name))?;
        (tool.handler)(arguments)
    }
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: &str) -> Result<T> {
    serde_json::from_str(arguments)
        .with_context(|| format!("Invalid arguments for tool '{}': {}", tool, arguments))
}

fn run_search_flights(arguments: &str) -> Result<String> {
    let input: SearchFlightsInput = decode(SEARCH_FLIGHTS, arguments)?;
    Ok(search_flights(&input))
}

fn run_suggest_hotel(arguments: &str) -> Result<String> {
    let input: SuggestHotelInput = decode(SUGGEST_HOTEL, arguments)?;
    Ok(suggest_hotel(&input))
}
