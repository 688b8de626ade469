//! Streamdrop Storage Library
//!
//! Storage abstraction and the local filesystem implementation backing the content
//! registry.
//!
//! # File naming
//!
//! Every stored file lives directly under the storage root as `{uuid}.{ext}`. Names are
//! never derived from user input, so concurrent ingestions cannot overwrite each other.
//! Paths handed to `delete` must resolve inside the root; anything else is rejected.

pub mod file;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use file::MediaFile;
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
