//! Category Server Library
//!
//! HTTP front end for the category matcher: request validation, the
//! recommend/persist pipeline, configuration and startup wiring.

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod startup;

pub use api::{create_api_router, AppState};
pub use config::{Cli, Command, ServerConfig};
pub use error::{ApiError, ConfigError};
pub use service::{PersistenceStatus, RecommendRequest, RecommendationService};
