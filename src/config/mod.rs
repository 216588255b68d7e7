#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{AlbumCommand, Cli, Command, PhotoCommand, PinCommand};
pub use toml_config::AppConfig;
