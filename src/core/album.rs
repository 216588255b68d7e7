//! Album synchronization for one pin.
//!
//! An [`AlbumSession`] lives as long as the view showing a pin's album. It
//! decides when the remote source is searched, writes the results into the
//! store and reports progress as [`AlbumEvent`]s on a single channel, so
//! the consumer sees status changes and album changes in the order they
//! happened.
//!
//! At most one fetch runs per session. `ensure_album` or `refresh_album`
//! while one is outstanding returns [`Trigger::Ignored`] and emits nothing.
//!
//! Closing a session cancels the remote search only. A store write that has
//! already started runs to completion, so the store never ends up with a
//! half-applied commit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::core::page_cursor::PageCursor;
use crate::core::AlbumSettings;
use crate::domain::model::{FailureReason, FetchStatus, Photo, PhotoId, Pin, PinId, StoreEvent};
use crate::domain::ports::{ImageFetcher, PhotoSource, PhotoStore};
use crate::utils::error::{AlbumError, ErrorCategory, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumEvent {
    Status(FetchStatus),
    Changed(StoreEvent),
}

pub type AlbumEvents = mpsc::UnboundedReceiver<AlbumEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Ensure,
    Refresh,
}

/// Outcome of asking a session to (re)load its album.
#[must_use]
#[derive(Debug)]
pub enum Trigger {
    Started(FetchHandle),
    Ignored,
}

impl Trigger {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Trigger::Ignored)
    }

    /// Waits for the operation to finish. Returns immediately when ignored.
    pub async fn finished(self) {
        if let Trigger::Started(handle) = self {
            handle.finished().await;
        }
    }
}

#[derive(Debug)]
pub struct FetchHandle {
    handle: JoinHandle<()>,
}

impl FetchHandle {
    pub async fn finished(self) {
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => tracing::debug!("album operation cancelled"),
            Err(e) => tracing::error!("album operation panicked: {}", e),
        }
    }
}

pub struct AlbumSession<S, P>
where
    S: PhotoStore + 'static,
    P: PhotoSource + 'static,
{
    inner: Arc<SessionInner<S, P>>,
}

struct SessionInner<S, P> {
    pin: Pin,
    store: Arc<S>,
    source: Arc<P>,
    fetch_timeout: Duration,
    cursor: StdMutex<PageCursor>,
    status: StdMutex<FetchStatus>,
    events: mpsc::UnboundedSender<AlbumEvent>,
    busy: AtomicBool,
    /// Flipped once by `close`, while holding `status`.
    closed: watch::Sender<bool>,
    /// Held by every store write the session performs.
    op_lock: Mutex<()>,
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn failure_reason(error: &AlbumError) -> FailureReason {
    match error.category() {
        ErrorCategory::Remote => FailureReason::Remote(error.to_string()),
        ErrorCategory::Timeout => FailureReason::Timeout,
        ErrorCategory::Store | ErrorCategory::Config => FailureReason::Store(error.to_string()),
    }
}

/// Clears the in-flight flag when the operation ends, including on abort.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S, P> AlbumSession<S, P>
where
    S: PhotoStore + 'static,
    P: PhotoSource + 'static,
{
    pub fn open(
        pin: Pin,
        store: Arc<S>,
        source: Arc<P>,
        settings: &AlbumSettings,
    ) -> (Self, AlbumEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::info!("Opening album for pin {} ({})", pin.id(), pin.coordinate());

        let inner = SessionInner {
            pin,
            store,
            source,
            fetch_timeout: settings.fetch_timeout,
            cursor: StdMutex::new(PageCursor::new(settings.max_pages, settings.seed)),
            status: StdMutex::new(FetchStatus::Idle),
            events: tx,
            busy: AtomicBool::new(false),
            closed: watch::Sender::new(false),
            op_lock: Mutex::new(()),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Looks the pin up in `store` and opens a session for it.
    pub async fn open_pin(
        pin_id: PinId,
        store: Arc<S>,
        source: Arc<P>,
        settings: &AlbumSettings,
    ) -> Result<(Self, AlbumEvents)> {
        let pin = store
            .pin(pin_id)
            .await?
            .ok_or(AlbumError::PinNotFound(pin_id))?;
        Ok(Self::open(pin, store, source, settings))
    }

    pub fn pin(&self) -> &Pin {
        &self.inner.pin
    }

    pub fn status(&self) -> FetchStatus {
        lock(&self.inner.status).clone()
    }

    pub fn total_pages(&self) -> Option<u32> {
        lock(&self.inner.cursor).total_pages()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Fetches an album for the pin unless the store already has one.
    pub fn ensure_album(&self) -> Trigger {
        self.start(Operation::Ensure)
    }

    /// Replaces the album with a randomly chosen different result page.
    pub fn refresh_album(&self) -> Trigger {
        self.start(Operation::Refresh)
    }

    pub async fn photos(&self) -> Result<Vec<Photo>> {
        self.inner.store.list_by_pin(self.inner.pin.id()).await
    }

    /// Removes one photo of this album. Waits for an outstanding
    /// delete-and-fetch to complete first.
    pub async fn remove_photo(&self, photo_id: PhotoId) -> Result<()> {
        let inner = &self.inner;
        let _op = inner.op_lock.lock().await;
        inner.ensure_open()?;

        inner.own_photo(photo_id).await?;
        inner.store.remove_photo(photo_id).await?;
        inner.notify(StoreEvent::PhotoRemoved {
            pin_id: inner.pin.id(),
            photo_id,
        });
        Ok(())
    }

    /// Returns the photo's image, downloading and caching it on first use.
    pub async fn load_image<F>(&self, fetcher: &F, photo_id: PhotoId) -> Result<Vec<u8>>
    where
        F: ImageFetcher + ?Sized,
    {
        let inner = &self.inner;
        let photo = inner.own_photo(photo_id).await?;
        if let Some(image) = photo.image {
            return Ok(image);
        }

        let url = photo.url.ok_or(AlbumError::MissingImageUrl(photo_id))?;
        let image = tokio::time::timeout(inner.fetch_timeout, fetcher.fetch_image(&url))
            .await
            .map_err(|_| AlbumError::Timeout(inner.fetch_timeout))??;

        let _op = inner.op_lock.lock().await;
        inner.ensure_open()?;
        inner.store.set_image(photo_id, image.clone()).await?;
        inner.notify(StoreEvent::ImageCached {
            pin_id: inner.pin.id(),
            photo_id,
        });
        Ok(image)
    }

    /// Ends the session. No event is delivered after this returns. An
    /// outstanding search is cancelled and its results are never stored; a
    /// store write already in progress is allowed to finish.
    pub fn close(&self) {
        let _status = lock(&self.inner.status);
        if self.inner.closed.send_replace(true) {
            return;
        }
        tracing::info!("Closed album for pin {}", self.inner.pin.id());
    }

    fn start(&self, operation: Operation) -> Trigger {
        if self.inner.is_closed() {
            return Trigger::Ignored;
        }
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(
                "Ignoring {:?} for pin {}: fetch already in flight",
                operation,
                self.inner.pin.id()
            );
            return Trigger::Ignored;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let _busy = BusyGuard(&inner.busy);
            inner.run(operation).await;
        });

        Trigger::Started(FetchHandle { handle })
    }
}

impl<S, P> Drop for AlbumSession<S, P>
where
    S: PhotoStore + 'static,
    P: PhotoSource + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<S, P> SessionInner<S, P>
where
    S: PhotoStore,
    P: PhotoSource,
{
    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the session is closed.
    async fn closing(&self) {
        let mut closed = self.closed.subscribe();
        let _ = closed.wait_for(|closed| *closed).await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(AlbumError::store("album session is closed"))
        } else {
            Ok(())
        }
    }

    // `close` takes the status lock too, so check and send are atomic
    // with respect to it.
    fn emit(&self, status: FetchStatus) {
        let mut current = lock(&self.status);
        if self.is_closed() {
            return;
        }
        tracing::debug!("pin {} status: {:?}", self.pin.id(), status);
        *current = status.clone();
        let _ = self.events.send(AlbumEvent::Status(status));
    }

    fn notify(&self, event: StoreEvent) {
        let _current = lock(&self.status);
        if self.is_closed() {
            return;
        }
        let _ = self.events.send(AlbumEvent::Changed(event));
    }

    async fn own_photo(&self, photo_id: PhotoId) -> Result<Photo> {
        match self.store.photo(photo_id).await? {
            Some(photo) if photo.pin_id() == self.pin.id() => Ok(photo),
            _ => Err(AlbumError::PhotoNotFound(photo_id)),
        }
    }

    async fn run(&self, operation: Operation) {
        let _op = self.op_lock.lock().await;
        if self.is_closed() {
            return;
        }

        let pin_id = self.pin.id();
        match operation {
            Operation::Ensure => match self.store.count_by_pin(pin_id).await {
                Ok(0) => {
                    self.emit(FetchStatus::Fetching);
                    let status = self.fetch(None).await;
                    self.emit(status);
                }
                Ok(count) => {
                    tracing::info!("Pin {} already has {} photos, not fetching", pin_id, count);
                    self.emit(FetchStatus::Idle);
                }
                Err(e) => {
                    tracing::error!("Could not read album for pin {}: {}", pin_id, e);
                    self.emit(FetchStatus::Fetching);
                    self.emit(FetchStatus::Failed(failure_reason(&e)));
                }
            },
            Operation::Refresh => {
                self.emit(FetchStatus::Fetching);
                let status = match self.store.delete_all_by_pin(pin_id).await {
                    Ok(count) => {
                        tracing::info!("Cleared {} photos of pin {}", count, pin_id);
                        self.notify(StoreEvent::PhotosCleared { pin_id, count });
                        let page = lock(&self.cursor).next_refresh_page();
                        self.fetch(page).await
                    }
                    Err(e) => {
                        tracing::error!("Could not clear album for pin {}: {}", pin_id, e);
                        FetchStatus::Failed(failure_reason(&e))
                    }
                };
                self.emit(status);
            }
        }
    }

    async fn fetch(&self, page: Option<u32>) -> FetchStatus {
        let pin_id = self.pin.id();
        lock(&self.cursor).record_request(page);
        tracing::info!("Fetching photos for pin {} (page {:?})", pin_id, page);

        let search = tokio::time::timeout(
            self.fetch_timeout,
            self.source.search(self.pin.coordinate(), page),
        );
        let result = tokio::select! {
            biased;
            _ = self.closing() => {
                tracing::info!("Search for pin {} cancelled by close", pin_id);
                return FetchStatus::Idle;
            }
            result = search => match result {
                Ok(result) => result,
                Err(_) => Err(AlbumError::Timeout(self.fetch_timeout)),
            },
        };

        let found = match result {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Photo search for pin {} failed: {}", pin_id, e);
                return FetchStatus::Failed(failure_reason(&e));
            }
        };

        if !found.items.is_empty() {
            lock(&self.cursor).record_total(found.total_pages);
        }

        let photos = found.storable();
        if photos.is_empty() {
            tracing::info!("No photos found for pin {}", pin_id);
            return FetchStatus::Empty;
        }

        if self.is_closed() {
            tracing::warn!("Discarding {} photos for closed pin {}", photos.len(), pin_id);
            return FetchStatus::Idle;
        }

        match self.store.create_many(pin_id, photos).await {
            Ok(photo_ids) => {
                let count = photo_ids.len();
                tracing::info!("Stored {} photos for pin {}", count, pin_id);
                self.notify(StoreEvent::PhotosInserted { pin_id, photo_ids });
                FetchStatus::Succeeded(count)
            }
            Err(e) => {
                tracing::error!("Could not store photos for pin {}: {}", pin_id, e);
                FetchStatus::Failed(failure_reason(&e))
            }
        }
    }
}
