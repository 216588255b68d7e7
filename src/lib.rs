pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FlickrSource, JsonFileStore, MemoryStore};
pub use config::toml_config::AppConfig;
pub use crate::core::{AlbumEvent, AlbumSession, AlbumSettings, Trigger};
pub use domain::model::{Coordinate, FailureReason, FetchStatus, Photo, PhotoId, Pin, PinId};
pub use utils::error::{AlbumError, Result};
