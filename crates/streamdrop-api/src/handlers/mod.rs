pub mod health;
pub mod ingest;
pub mod stream;
pub mod watch;
