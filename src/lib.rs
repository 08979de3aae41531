pub mod cli;
pub mod cli_handlers;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod mcp;
pub mod models;
pub mod tagging;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::ShipStation;
pub use config::{Config, Credentials};
pub use error::{ErrorKind, Result, WarehouseError};
pub use lookup::Lookup;
pub use models::*;
pub use tagging::{NoteOutcome, TagOutcome};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
