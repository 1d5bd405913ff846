//! Mock travel lookups the model can call.
//!
//! Both tools are deterministic stubs: no inventory is queried and neither can fail.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

pub const SEARCH_FLIGHTS: &str = "searchFlights";
pub const SUGGEST_HOTEL: &str = "suggestHotel";

// Input: what the model sends to searchFlights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFlightsInput {
    pub departure: String, // Departure city
    pub arrival: String,   // Arrival city
}

// Input: what the model sends to suggestHotel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestHotelInput {
    pub destination: String,
}

impl SearchFlightsInput {
    pub fn description() -> &'static str {
        "Searches for flights between a departure and arrival city."
    }

    /// JSON schema handed to the model alongside the tool name.
    pub fn parameters() -> Value {
        json!({
            "type": "object",
            "properties": {
                "departure": { "type": "string", "description": "Departure city" },
                "arrival": { "type": "string", "description": "Arrival city" }
            },
            "required": ["departure", "arrival"]
        })
    }
}

impl SuggestHotelInput {
    pub fn description() -> &'static str {
        "Suggests a popular and well-rated hotel in a given destination."
    }

    pub fn parameters() -> Value {
        json!({
            "type": "object",
            "properties": {
                "destination": { "type": "string", "description": "Destination city" }
            },
            "required": ["destination"]
        })
    }
}

pub fn search_flights(input: &SearchFlightsInput) -> String {
    info!(
        "Tool called: searchFlights from {} to {}",
        input.departure, input.arrival
    );
    format!(
        "Found flights from {} to {}. A non-stop flight is available for $550.",
        input.departure, input.arrival
    )
}

/// Looks the destination up in a fixed two-city table, ignoring case.
/// Unknown cities get an apology rather than an error.
pub fn suggest_hotel(input: &SuggestHotelInput) -> String {
    info!("Tool called: suggestHotel in {}", input.destination);
    match input.destination.to_lowercase().as_str() {
        "london" => "The Savoy is a highly-rated luxury hotel with excellent reviews.".to_string(),
        "tokyo" => "The Park Hyatt is a great choice with stunning city views.".to_string(),
        _ => format!(
            "I'm sorry, I don't have a specific hotel recommendation for {}.",
            input.destination
        ),
    }
}
