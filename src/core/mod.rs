pub mod album;
pub mod page_cursor;

use std::time::Duration;

pub use crate::domain::model::{FetchStatus, Photo, Pin, StoreEvent};
pub use crate::domain::ports::{ImageFetcher, PhotoSource, PhotoStore};
pub use crate::utils::error::Result;
pub use album::{AlbumEvent, AlbumEvents, AlbumSession, FetchHandle, Trigger};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-session knobs, usually derived from the config file.
#[derive(Debug, Clone)]
pub struct AlbumSettings {
    /// Upper bound on one remote search.
    pub fetch_timeout: Duration,
    /// Caps the page range used for "new collection".
    pub max_pages: Option<u32>,
    pub seed: Option<u64>,
}

impl Default for AlbumSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_pages: None,
            seed: None,
        }
    }
}
