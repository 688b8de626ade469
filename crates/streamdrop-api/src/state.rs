//! Application state shared by all handlers.

use std::sync::Arc;
use streamdrop_core::{Config, LinkBuilder};
use streamdrop_services::{ContentRegistry, IngestService};
use streamdrop_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ContentRegistry>,
    pub ingest: Arc<IngestService>,
    pub storage: Arc<dyn Storage>,
    pub links: LinkBuilder,
}
