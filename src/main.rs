use clap::Parser;
use pin_album::config::{AlbumCommand, Cli, Command, PhotoCommand, PinCommand};
use pin_album::core::{AlbumEvent, AlbumEvents, AlbumSession, PhotoStore, StoreEvent};
use pin_album::utils::{logger, validation::Validate};
use pin_album::{
    AlbumError, AppConfig, Coordinate, FailureReason, FetchStatus, FlickrSource, JsonFileStore,
    PhotoId, PinId, Result,
};
use std::sync::Arc;

type Session = AlbumSession<JsonFileStore, FlickrSource>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!("❌ {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = if e.is_retryable() { 2 } else { 1 };
        std::process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(store_path) = cli.store {
        config.store.path = store_path;
    }

    let store = Arc::new(JsonFileStore::open(&config.store.path).await?);
    tracing::debug!("Using store {}", store.path().display());

    match cli.command {
        Command::Pin(command) => pin_command(store.as_ref(), command).await,
        Command::Album(command) => album_command(&config, store, command).await,
        Command::Photo(command) => photo_command(&config, store, command).await,
    }
}

async fn pin_command(store: &JsonFileStore, command: PinCommand) -> Result<()> {
    match command {
        PinCommand::Add { lat, lon } => {
            let pin = store.add_pin(Coordinate::new(lat, lon)?).await?;
            println!("📍 {}  {}", pin.id(), pin.coordinate());
        }
        PinCommand::List => {
            let pins = store.pins().await?;
            if pins.is_empty() {
                println!("No pins yet. Add one with `pin-album pin add --lat .. --lon ..`");
            }
            for pin in pins {
                let count = store.count_by_pin(pin.id()).await?;
                println!(
                    "📍 {}  {}  ({} photos, added {})",
                    pin.id(),
                    pin.coordinate(),
                    count,
                    pin.created_at().format("%Y-%m-%d %H:%M")
                );
            }
        }
        PinCommand::Remove { pin } => {
            let pin_id = PinId::parse(&pin)?;
            store.remove_pin(pin_id).await?;
            println!("🗑️  Removed pin {}", pin_id);
        }
    }
    Ok(())
}

async fn open_session(
    config: &AppConfig,
    store: Arc<JsonFileStore>,
    pin: &str,
) -> Result<(Session, AlbumEvents, Arc<FlickrSource>)> {
    config.validate()?;
    let source = Arc::new(FlickrSource::new(&config.source)?);
    let pin_id = PinId::parse(pin)?;
    let (session, events) =
        AlbumSession::open_pin(pin_id, store, Arc::clone(&source), &config.album_settings())
            .await?;
    Ok((session, events, source))
}

async fn album_command(
    config: &AppConfig,
    store: Arc<JsonFileStore>,
    command: AlbumCommand,
) -> Result<()> {
    let (pin, refresh) = match command {
        AlbumCommand::Show { pin } => (pin, false),
        AlbumCommand::New { pin } => (pin, true),
    };
    let (session, mut events, _) = open_session(config, store, &pin).await?;
    println!("📍 {}", session.pin().coordinate());

    let trigger = if refresh {
        if session.total_pages().is_none() {
            // a fresh process has not seen a result page yet
            println!("ℹ️  Page count unknown in this run, the new collection uses the first page");
        }
        session.refresh_album()
    } else {
        session.ensure_album()
    };
    trigger.finished().await;

    while let Ok(event) = events.try_recv() {
        render_event(&event);
    }

    let photos = session.photos().await?;
    for photo in &photos {
        println!(
            "🖼️  {}  {}  {}",
            photo.id(),
            photo.title,
            photo.url.as_deref().unwrap_or("-")
        );
    }

    match session.status() {
        FetchStatus::Failed(FailureReason::Timeout) => Err(AlbumError::Timeout(config.fetch_timeout())),
        FetchStatus::Failed(FailureReason::Remote(message)) => Err(AlbumError::RemoteError { message }),
        FetchStatus::Failed(FailureReason::Store(message)) => Err(AlbumError::StoreError { message }),
        _ => Ok(()),
    }
}

async fn photo_command(
    config: &AppConfig,
    store: Arc<JsonFileStore>,
    command: PhotoCommand,
) -> Result<()> {
    match command {
        PhotoCommand::Remove { pin, photo } => {
            let (session, _, _) = open_session(config, store, &pin).await?;
            let photo_id = PhotoId::parse(&photo)?;
            session.remove_photo(photo_id).await?;
            println!("🗑️  Removed photo {}", photo_id);
        }
        PhotoCommand::Image { pin, photo, out } => {
            let (session, _, source) = open_session(config, store, &pin).await?;
            let photo_id = PhotoId::parse(&photo)?;
            let image = session.load_image(source.as_ref(), photo_id).await?;
            tokio::fs::write(&out, &image).await?;
            println!("💾 Saved {} bytes to {}", image.len(), out);
        }
    }
    Ok(())
}

fn render_event(event: &AlbumEvent) {
    match event {
        AlbumEvent::Status(FetchStatus::Idle) => {}
        AlbumEvent::Status(FetchStatus::Fetching) => println!("⏳ Fetching photos ..."),
        AlbumEvent::Status(FetchStatus::Succeeded(count)) => println!("✅ {} new photos", count),
        AlbumEvent::Status(FetchStatus::Empty) => {
            println!("😢 No photos found for this location")
        }
        AlbumEvent::Status(FetchStatus::Failed(reason)) => {
            println!("🧐 Something went wrong, please try again ({})", reason)
        }
        AlbumEvent::Changed(StoreEvent::PhotosCleared { count, .. }) => {
            println!("🧹 Cleared {} photos", count)
        }
        AlbumEvent::Changed(change) => tracing::debug!("album changed: {:?}", change),
    }
}
