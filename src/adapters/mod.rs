// Adapters layer: concrete implementations of the domain ports.

pub mod flickr;
pub mod json_store;
pub mod memory_store;
mod store_state;

pub use flickr::FlickrSource;
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
