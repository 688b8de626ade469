//! Domain models for the content registry and ingestion.

pub mod entry;
pub mod ingest;
pub mod token;

pub use entry::{RegistryEntry, ResolvedMedia};
pub use ingest::{IngestOutcome, IngestResponse, IngestUrlRequest};
pub use token::Token;
