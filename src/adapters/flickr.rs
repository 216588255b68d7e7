use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::toml_config::SourceConfig;
use crate::domain::model::{Coordinate, SearchItem, SearchPage};
use crate::domain::ports::{ImageFetcher, PhotoSource};
use crate::utils::error::{AlbumError, Result};

const SEARCH_METHOD: &str = "flickr.photos.search";
/// Image size extra; the response carries it back as `url_n`.
const URL_EXTRA: &str = "url_n";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    stat: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    photos: Option<PhotosPayload>,
}

#[derive(Debug, Deserialize)]
struct PhotosPayload {
    pages: u32,
    #[serde(default)]
    photo: Vec<PhotoPayload>,
}

#[derive(Debug, Deserialize)]
struct PhotoPayload {
    #[serde(default)]
    title: String,
    #[serde(rename = "url_n", default)]
    url: Option<String>,
}

/// Flickr REST search, also used to download the images it links to.
pub struct FlickrSource {
    client: Client,
    endpoint: String,
    api_key: String,
    per_page: u32,
    radius_km: f64,
}

impl FlickrSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            per_page: config.per_page,
            radius_km: config.radius_km,
        })
    }

    fn query(&self, coordinate: Coordinate, page: Option<u32>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("method", SEARCH_METHOD.to_string()),
            ("api_key", self.api_key.clone()),
            ("lat", coordinate.latitude().to_string()),
            ("lon", coordinate.longitude().to_string()),
            ("radius", self.radius_km.to_string()),
            ("per_page", self.per_page.to_string()),
            ("extras", URL_EXTRA.to_string()),
            ("safe_search", "1".to_string()),
            ("format", "json".to_string()),
            ("nojsoncallback", "1".to_string()),
        ];
        // Flickr 的頁碼從 1 開始
        if let Some(page) = page {
            query.push(("page", (page + 1).to_string()));
        }
        query
    }
}

#[async_trait]
impl PhotoSource for FlickrSource {
    async fn search(&self, coordinate: Coordinate, page: Option<u32>) -> Result<SearchPage> {
        tracing::debug!(
            "Searching photos near {} (page {:?}) at {}",
            coordinate,
            page,
            self.endpoint
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(coordinate, page))
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(AlbumError::remote(format!(
                "search request failed with HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        if body.stat != "ok" {
            return Err(AlbumError::remote(
                body.message
                    .unwrap_or_else(|| format!("search returned stat '{}'", body.stat)),
            ));
        }

        let photos = body
            .photos
            .ok_or_else(|| AlbumError::remote("search response has no 'photos' object"))?;

        Ok(SearchPage {
            total_pages: photos.pages,
            items: photos
                .photo
                .into_iter()
                .map(|p| SearchItem {
                    title: p.title,
                    url: p.url,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl ImageFetcher for FlickrSource {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading image {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AlbumError::remote(format!(
                "image download failed with HTTP {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
