//! Streamdrop Services Library
//!
//! The stateful core of streamdrop and the collaborators that feed it:
//! - `ContentRegistry`: token → file mapping with creation-time expiry
//! - `IngestionGate`: per-user single-flight admission for ingestion
//! - `SweepService`: periodic eviction of expired entries
//! - `IngestService`: URL and upload adapters that land files on disk and register them

pub mod gate;
pub mod ingest;
pub mod registry;
mod shard;
pub mod sweep;

// Re-export commonly used types
pub use gate::{IngestionGate, IngestionPermit};
pub use ingest::{IngestLimits, IngestService};
pub use registry::{ContentRegistry, SweepReport};
pub use sweep::SweepService;
