use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};

use crate::adapters::memory_store::EVENT_CAPACITY;
use crate::adapters::store_state::StoreState;
use crate::domain::model::{Coordinate, NewPhoto, Photo, PhotoId, Pin, PinId, StoreEvent};
use crate::domain::ports::PhotoStore;
use crate::utils::error::{AlbumError, Result};

/// Durable store backed by a single JSON document.
///
/// Every mutation is applied to a copy of the state, written to a sibling
/// temp file and renamed over the document, and only then made visible to
/// readers. A failed write leaves both the file and the in-memory state as
/// they were. Commits run on their own task: dropping the caller's future
/// mid-write does not leave the file and the in-memory state apart.
pub struct JsonFileStore {
    inner: Arc<Document>,
}

struct Document {
    path: PathBuf,
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl JsonFileStore {
    /// 開啟 store 檔案；檔案不存在時從空狀態開始
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store at {}, starting empty", path.display());
                StoreState::default()
            }
            Err(e) => return Err(e.into()),
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Document {
                path,
                state: Mutex::new(state),
                events,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    async fn commit<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<(T, StoreEvent)> + Send + 'static,
        T: Send + 'static,
    {
        let document = Arc::clone(&self.inner);
        tokio::spawn(async move { document.commit(apply).await })
            .await
            .map_err(|e| AlbumError::store(format!("store write task failed: {}", e)))?
    }

    async fn read(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock().await
    }
}

impl Document {
    async fn commit<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<(T, StoreEvent)>,
    {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let (value, event) = apply(&mut next)?;

        self.persist(&next).await?;
        *guard = next;
        drop(guard);

        tracing::debug!("store event: {:?}", event);
        let _ = self.events.send(event);
        Ok(value)
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Wrote store ({} bytes) to {}", data.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl PhotoStore for JsonFileStore {
    async fn add_pin(&self, coordinate: Coordinate) -> Result<Pin> {
        self.commit(move |state| Ok(state.add_pin(coordinate))).await
    }

    async fn pin(&self, pin_id: PinId) -> Result<Option<Pin>> {
        Ok(self.read().await.pin(pin_id))
    }

    async fn pins(&self) -> Result<Vec<Pin>> {
        Ok(self.read().await.pins())
    }

    async fn remove_pin(&self, pin_id: PinId) -> Result<()> {
        self.commit(move |state| state.remove_pin(pin_id).map(|event| ((), event)))
            .await
    }

    async fn create(&self, pin_id: PinId, photo: NewPhoto) -> Result<PhotoId> {
        let mut ids = self.create_many(pin_id, vec![photo]).await?;
        Ok(ids.remove(0))
    }

    async fn create_many(&self, pin_id: PinId, photos: Vec<NewPhoto>) -> Result<Vec<PhotoId>> {
        self.commit(move |state| state.insert(pin_id, photos)).await
    }

    async fn photo(&self, photo_id: PhotoId) -> Result<Option<Photo>> {
        Ok(self.read().await.photo(photo_id))
    }

    async fn list_by_pin(&self, pin_id: PinId) -> Result<Vec<Photo>> {
        Ok(self.read().await.photos_of(pin_id))
    }

    async fn count_by_pin(&self, pin_id: PinId) -> Result<usize> {
        Ok(self.read().await.count_of(pin_id))
    }

    async fn remove_photo(&self, photo_id: PhotoId) -> Result<()> {
        self.commit(move |state| state.remove_photo(photo_id).map(|event| ((), event)))
            .await
    }

    async fn delete_all_by_pin(&self, pin_id: PinId) -> Result<usize> {
        self.commit(move |state| state.clear(pin_id)).await
    }

    async fn set_image(&self, photo_id: PhotoId, image: Vec<u8>) -> Result<()> {
        self.commit(move |state| state.set_image(photo_id, image).map(|event| ((), event)))
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }
}
