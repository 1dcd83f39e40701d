//! Compressed, content-addressable blob storage with age-based eviction.
//!
//! Three pieces: [`ObjectStore`] persists gzip-compressed blobs under opaque
//! keys, [`MetadataLedger`] keeps a JSON sidecar per key recording when the
//! entry was written, and the [`reaper`] periodically deletes entries older
//! than a configured retention window.

pub mod metadata;
pub mod reaper;
pub mod store;

pub use metadata::{EntryMetadata, MetadataLedger};
pub use reaper::{Reaper, ReaperConfig, ReaperHandle};
pub use store::ObjectStore;
