//! Streamdrop API Library
//!
//! This crate provides the HTTP handlers, range parsing, application state and setup
//! for the streaming server.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod utils;

pub mod error;
pub mod state;

pub use error::HttpAppError;
pub use streamdrop_infra::ErrorResponse;
