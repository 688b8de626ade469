//! Streamdrop Core Library
//!
//! This crate provides the domain models, error types, configuration and media type
//! helpers shared by every streamdrop component.

pub mod config;
pub mod error;
pub mod links;
pub mod media_types;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use links::LinkBuilder;
pub use models::{IngestOutcome, RegistryEntry, ResolvedMedia, Token};
