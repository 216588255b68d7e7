use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::model::{Coordinate, NewPhoto, Photo, PhotoId, Pin, PinId, StoreEvent};
use crate::utils::error::{AlbumError, Result};

/// Pin and photo records shared by the store backends. Each mutation either
/// applies completely and returns the event to publish, or leaves the state
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    pins: BTreeMap<PinId, Pin>,
    /// Insertion order, so albums render in the order they were fetched.
    #[serde(default)]
    photos: Vec<Photo>,
}

impl StoreState {
    pub fn add_pin(&mut self, coordinate: Coordinate) -> (Pin, StoreEvent) {
        let pin = Pin::new(coordinate);
        self.pins.insert(pin.id(), pin.clone());
        let event = StoreEvent::PinAdded(pin.id());
        (pin, event)
    }

    pub fn pin(&self, pin_id: PinId) -> Option<Pin> {
        self.pins.get(&pin_id).cloned()
    }

    pub fn pins(&self) -> Vec<Pin> {
        let mut pins: Vec<Pin> = self.pins.values().cloned().collect();
        pins.sort_by_key(|pin| pin.created_at());
        pins
    }

    pub fn remove_pin(&mut self, pin_id: PinId) -> Result<StoreEvent> {
        if self.pins.remove(&pin_id).is_none() {
            return Err(AlbumError::PinNotFound(pin_id));
        }
        self.photos.retain(|photo| photo.pin_id() != pin_id);
        Ok(StoreEvent::PinRemoved(pin_id))
    }

    pub fn insert(&mut self, pin_id: PinId, photos: Vec<NewPhoto>) -> Result<(Vec<PhotoId>, StoreEvent)> {
        self.require_pin(pin_id)?;

        let mut photo_ids = Vec::with_capacity(photos.len());
        for new_photo in photos {
            let photo = Photo::new(pin_id, new_photo.title, new_photo.url);
            photo_ids.push(photo.id());
            self.photos.push(photo);
        }

        let event = StoreEvent::PhotosInserted {
            pin_id,
            photo_ids: photo_ids.clone(),
        };
        Ok((photo_ids, event))
    }

    pub fn photo(&self, photo_id: PhotoId) -> Option<Photo> {
        self.photos.iter().find(|p| p.id() == photo_id).cloned()
    }

    pub fn photos_of(&self, pin_id: PinId) -> Vec<Photo> {
        self.photos
            .iter()
            .filter(|p| p.pin_id() == pin_id)
            .cloned()
            .collect()
    }

    pub fn count_of(&self, pin_id: PinId) -> usize {
        self.photos.iter().filter(|p| p.pin_id() == pin_id).count()
    }

    pub fn remove_photo(&mut self, photo_id: PhotoId) -> Result<StoreEvent> {
        let index = self
            .photos
            .iter()
            .position(|p| p.id() == photo_id)
            .ok_or(AlbumError::PhotoNotFound(photo_id))?;
        let photo = self.photos.remove(index);
        Ok(StoreEvent::PhotoRemoved {
            pin_id: photo.pin_id(),
            photo_id,
        })
    }

    pub fn clear(&mut self, pin_id: PinId) -> Result<(usize, StoreEvent)> {
        self.require_pin(pin_id)?;

        let before = self.photos.len();
        self.photos.retain(|photo| photo.pin_id() != pin_id);
        let count = before - self.photos.len();
        Ok((count, StoreEvent::PhotosCleared { pin_id, count }))
    }

    pub fn set_image(&mut self, photo_id: PhotoId, image: Vec<u8>) -> Result<StoreEvent> {
        let photo = self
            .photos
            .iter_mut()
            .find(|p| p.id() == photo_id)
            .ok_or(AlbumError::PhotoNotFound(photo_id))?;
        photo.image = Some(image);
        Ok(StoreEvent::ImageCached {
            pin_id: photo.pin_id(),
            photo_id,
        })
    }

    fn require_pin(&self, pin_id: PinId) -> Result<()> {
        if self.pins.contains_key(&pin_id) {
            Ok(())
        } else {
            Err(AlbumError::PinNotFound(pin_id))
        }
    }
}
