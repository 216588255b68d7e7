use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils::error::{AlbumError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(Uuid);

impl PinId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AlbumError::ConfigError {
                message: format!("invalid pin id '{}': {}", s, e),
            })
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AlbumError::ConfigError {
                message: format!("invalid photo id '{}': {}", s, e),
            })
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Decimal-degree location. Built through [`Coordinate::new`], and
/// deserialized through it too, so every value in the system is in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = AlbumError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let invalid = |reason: &str| AlbumError::InvalidCoordinate {
            latitude,
            longitude,
            reason: reason.to_string(),
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid("coordinates must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("longitude must be within [-180, 180]"));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    id: PinId,
    coordinate: Coordinate,
    created_at: DateTime<Utc>,
}

impl Pin {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: PinId::new(),
            coordinate,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Photo fields needed to create a record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    id: PhotoId,
    pin_id: PinId,
    pub title: String,
    pub url: Option<String>,
    #[serde(default, with = "crate::utils::base64_bytes")]
    pub image: Option<Vec<u8>>,
}

impl Photo {
    pub(crate) fn new(pin_id: PinId, title: String, url: String) -> Self {
        Self {
            id: PhotoId::new(),
            pin_id,
            title,
            url: Some(url),
            image: None,
        }
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    /// Owning pin. Fixed for the lifetime of the record.
    pub fn pin_id(&self) -> PinId {
        self.pin_id
    }
}

/// One entry of a remote search page. `url` is absent when the service has
/// no image at the requested size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub total_pages: u32,
    pub items: Vec<SearchItem>,
}

impl SearchPage {
    /// Items that can be stored; entries without URL are dropped.
    pub fn storable(&self) -> Vec<NewPhoto> {
        self.items
            .iter()
            .filter_map(|item| {
                item.url.as_ref().map(|url| NewPhoto {
                    title: item.title.clone(),
                    url: url.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Remote(String),
    Timeout,
    Store(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Remote(msg) => write!(f, "remote source failed: {}", msg),
            FailureReason::Timeout => write!(f, "remote source timed out"),
            FailureReason::Store(msg) => write!(f, "photo store failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
    Succeeded(usize),
    Empty,
    Failed(FailureReason),
}

/// Committed store mutation, published after the write is durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    PinAdded(PinId),
    PinRemoved(PinId),
    PhotosInserted { pin_id: PinId, photo_ids: Vec<PhotoId> },
    PhotoRemoved { pin_id: PinId, photo_id: PhotoId },
    PhotosCleared { pin_id: PinId, count: usize },
    ImageCached { pin_id: PinId, photo_id: PhotoId },
}
