use crate::domain::model::{
    Coordinate, NewPhoto, Photo, PhotoId, Pin, PinId, SearchPage, StoreEvent,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Remote image-search service.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Search around `coordinate`. `page` is a zero-based page index; `None`
    /// lets the service pick its default (first) page.
    async fn search(&self, coordinate: Coordinate, page: Option<u32>) -> Result<SearchPage>;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// Durable pin and photo records.
///
/// Every mutating call publishes a [`StoreEvent`] to subscribers once the
/// change is committed. Bulk operations are all-or-nothing.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn add_pin(&self, coordinate: Coordinate) -> Result<Pin>;
    async fn pin(&self, pin_id: PinId) -> Result<Option<Pin>>;
    async fn pins(&self) -> Result<Vec<Pin>>;
    /// Removes the pin together with its whole album.
    async fn remove_pin(&self, pin_id: PinId) -> Result<()>;

    async fn create(&self, pin_id: PinId, photo: NewPhoto) -> Result<PhotoId>;
    async fn create_many(&self, pin_id: PinId, photos: Vec<NewPhoto>) -> Result<Vec<PhotoId>>;
    async fn photo(&self, photo_id: PhotoId) -> Result<Option<Photo>>;
    async fn list_by_pin(&self, pin_id: PinId) -> Result<Vec<Photo>>;
    async fn count_by_pin(&self, pin_id: PinId) -> Result<usize> {
        Ok(self.list_by_pin(pin_id).await?.len())
    }
    async fn remove_photo(&self, photo_id: PhotoId) -> Result<()>;
    /// Returns the number of photos deleted.
    async fn delete_all_by_pin(&self, pin_id: PinId) -> Result<usize>;
    async fn set_image(&self, photo_id: PhotoId, image: Vec<u8>) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
