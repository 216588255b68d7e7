use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pin-album")]
#[command(about = "Drop pins and browse a photo album for each of them")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "pin-album.toml")]
    pub config: String,

    /// Override store.path from the config
    #[arg(long)]
    pub store: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage pins
    #[command(subcommand)]
    Pin(PinCommand),
    /// Show or replace a pin's album
    #[command(subcommand)]
    Album(AlbumCommand),
    /// Work with single photos
    #[command(subcommand)]
    Photo(PhotoCommand),
}

#[derive(Debug, Subcommand)]
pub enum PinCommand {
    Add {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    List,
    Remove { pin: String },
}

#[derive(Debug, Subcommand)]
pub enum AlbumCommand {
    /// Show the album, fetching it first if the pin has none
    Show { pin: String },
    /// Replace the album with a new collection
    New { pin: String },
}

#[derive(Debug, Subcommand)]
pub enum PhotoCommand {
    Remove { pin: String, photo: String },
    /// Save a photo's image, downloading it if not cached yet
    Image {
        pin: String,
        photo: String,
        #[arg(short, long)]
        out: String,
    },
}
