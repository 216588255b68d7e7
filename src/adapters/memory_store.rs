use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use crate::adapters::store_state::StoreState;
use crate::domain::model::{Coordinate, NewPhoto, Photo, PhotoId, Pin, PinId, StoreEvent};
use crate::domain::ports::PhotoStore;
use crate::utils::error::Result;

pub(crate) const EVENT_CAPACITY: usize = 64;

/// Non-durable store, used for tests and throwaway sessions.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    fn publish(&self, event: StoreEvent) {
        tracing::debug!("store event: {:?}", event);
        // 沒有訂閱者時 send 會失敗，忽略即可
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn add_pin(&self, coordinate: Coordinate) -> Result<Pin> {
        let (pin, event) = self.state.lock().await.add_pin(coordinate);
        self.publish(event);
        Ok(pin)
    }

    async fn pin(&self, pin_id: PinId) -> Result<Option<Pin>> {
        Ok(self.state.lock().await.pin(pin_id))
    }

    async fn pins(&self) -> Result<Vec<Pin>> {
        Ok(self.state.lock().await.pins())
    }

    async fn remove_pin(&self, pin_id: PinId) -> Result<()> {
        let event = self.state.lock().await.remove_pin(pin_id)?;
        self.publish(event);
        Ok(())
    }

    async fn create(&self, pin_id: PinId, photo: NewPhoto) -> Result<PhotoId> {
        let mut ids = self.create_many(pin_id, vec![photo]).await?;
        Ok(ids.remove(0))
    }

    async fn create_many(&self, pin_id: PinId, photos: Vec<NewPhoto>) -> Result<Vec<PhotoId>> {
        let (ids, event) = self.state.lock().await.insert(pin_id, photos)?;
        self.publish(event);
        Ok(ids)
    }

    async fn photo(&self, photo_id: PhotoId) -> Result<Option<Photo>> {
        Ok(self.state.lock().await.photo(photo_id))
    }

    async fn list_by_pin(&self, pin_id: PinId) -> Result<Vec<Photo>> {
        Ok(self.state.lock().await.photos_of(pin_id))
    }

    async fn count_by_pin(&self, pin_id: PinId) -> Result<usize> {
        Ok(self.state.lock().await.count_of(pin_id))
    }

    async fn remove_photo(&self, photo_id: PhotoId) -> Result<()> {
        let event = self.state.lock().await.remove_photo(photo_id)?;
        self.publish(event);
        Ok(())
    }

    async fn delete_all_by_pin(&self, pin_id: PinId) -> Result<usize> {
        let (count, event) = self.state.lock().await.clear(pin_id)?;
        self.publish(event);
        Ok(count)
    }

    async fn set_image(&self, photo_id: PhotoId, image: Vec<u8>) -> Result<()> {
        let event = self.state.lock().await.set_image(photo_id, image)?;
        self.publish(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mutations_are_published_in_order() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        let pin = store
            .add_pin(Coordinate::new(40.71, -74.0).unwrap())
            .await
            .unwrap();
        let photo_id = store
            .create(
                pin.id(),
                NewPhoto {
                    title: "bridge".to_string(),
                    url: "https://img.example/bridge.jpg".to_string(),
                },
            )
            .await
            .unwrap();
        store.delete_all_by_pin(pin.id()).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::PinAdded(pin.id()));
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::PhotosInserted {
                pin_id: pin.id(),
                photo_ids: vec![photo_id]
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::PhotosCleared {
                pin_id: pin.id(),
                count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_set_image_caches_payload() {
        let store = MemoryStore::new();
        let pin = store.add_pin(Coordinate::new(0.0, 0.0).unwrap()).await.unwrap();
        let photo_id = store
            .create(
                pin.id(),
                NewPhoto {
                    title: "t".to_string(),
                    url: "u".to_string(),
                },
            )
            .await
            .unwrap();

        store.set_image(photo_id, vec![1, 2, 3]).await.unwrap();

        let photo = store.photo(photo_id).await.unwrap().unwrap();
        assert_eq!(photo.image, Some(vec![1, 2, 3]));
        assert_eq!(photo.pin_id(), pin.id());
    }
}
