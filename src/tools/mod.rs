//! Remote functions the model may call.
//!
//! Three functions are declared, all backed by the Travigo transit API:
//! - `search_stops`: find stops by name and transport type
//! - `get_stop`: stop detail (services, platforms, entrances)
//! - `stop_departures`: upcoming departures from a stop

pub mod travigo;

pub use travigo::TravigoTools;

use std::future::Future;
use std::pin::Pin;

use serde_json::{Value, json};

use crate::core::errors::AssistantResult;
use crate::llm::types::{FunctionCall, FunctionDeclaration};

/// Name of the stop search function.
pub const SEARCH_STOPS: &str = "search_stops";
/// Name of the stop detail function.
pub const GET_STOP: &str = "get_stop";
/// Name of the departures function.
pub const STOP_DEPARTURES: &str = "stop_departures";

const NAME_DESCRIPTION: &str = "The name or location of the stop (bus stop/train station/\
                                tram stop/metro station). Remove any ' in the name";
const TRANSPORT_TYPE_DESCRIPTION: &str = "The mode of transport the stop serves, such as bus, \
                                          train, rail, tram, metro, underground";

/// Boxed future type for tool execution.
pub type ToolFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs function calls requested by the model.
pub trait ToolExecutor: Send + Sync {
    /// Execute one call and return its result object.
    ///
    /// # Errors
    /// Returns an error if the function is unknown, its arguments are
    /// invalid, or the backing API call fails.
    fn execute<'a>(&'a self, call: &'a FunctionCall) -> ToolFuture<'a, AssistantResult<Value>>;
}

/// Declarations of every function offered to the model.
#[must_use]
pub fn declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: GET_STOP.to_string(),
            description: "Get information related to the stop such as services running at it, \
                          platforms, entrances"
                .to_string(),
            parameters: primary_identifier_schema(),
        },
        FunctionDeclaration {
            name: SEARCH_STOPS.to_string(),
            description: "Search for public transport stops (bus stop/train station/tram stop/\
                          metro station) that match a give query string for the name of the stop"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": NAME_DESCRIPTION
                    },
                    "transporttype": {
                        "type": "string",
                        "description": TRANSPORT_TYPE_DESCRIPTION
                    }
                },
                "required": ["name", "transporttype"]
            }),
        },
        FunctionDeclaration {
            name: STOP_DEPARTURES.to_string(),
            description: "Return the departing journeys with their destination and departure \
                          time that are leaving from a stop based on the unique PrimaryIdentifier \
                          for the transport stop (bus stop/train station/tram stop/metro station)"
                .to_string(),
            parameters: primary_identifier_schema(),
        },
    ]
}

fn primary_identifier_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "primaryidentifier": {
                "type": "string",
                "description": "The unique PrimaryIdentifier representing the transport stop"
            }
        },
        "required": ["primaryidentifier"]
    })
}
