//! # rebucket-core
//!
//! Resolves requests for media files at legacy flat paths (`/src/files/photo.jpg`)
//! to the date-bucketed URL the file lives at today (`.../2024/05/photo.jpg`).
//!
//! - [`classifier`] — decides whether a request path is a candidate at all
//! - [`matcher`] — filename conventions (`-WxH` thumbnails, `-scaled` originals)
//! - [`resolver`] — metadata lookups that turn a filename into a URL
//! - [`cache`] — advisory redirect cache over a get/set-with-TTL backend
//! - [`controller`] — per-request orchestration producing an [`Outcome`]
//!
//! Collaborators (metadata store, cache backend) are injected as trait objects;
//! nothing in this crate reaches for global state.

pub mod cache;
pub mod classifier;
pub mod controller;
pub mod error;
pub mod matcher;
pub mod memory;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod testing;

pub use cache::{CacheBackend, RedirectCache};
pub use classifier::PathClassifier;
pub use controller::{NotFoundSignal, Outcome, Redirect, RedirectController, Strategy};
pub use error::{CacheError, StoreError};
pub use memory::MemoryCacheBackend;
pub use resolver::AttachmentResolver;
pub use settings::RedirectSettings;
pub use store::{MetadataStore, StoredFile};
