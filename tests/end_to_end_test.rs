use httpmock::prelude::*;
use pin_album::core::PhotoStore;
use pin_album::{
    AlbumSession, AlbumSettings, AppConfig, Coordinate, FetchStatus, FlickrSource, JsonFileStore,
};
use std::sync::Arc;
use tempfile::TempDir;

fn config_for(server: &MockServer, store_path: &str) -> AppConfig {
    let toml_content = format!(
        r#"
[source]
endpoint = "{}"
api_key = "e2e-key"
per_page = 2
timeout_seconds = 5

[store]
path = "{}"

[album]
seed = 3
"#,
        server.url("/services/rest"),
        store_path
    );
    AppConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_album_is_fetched_once_and_reused_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("albums.json");
    let store_path = store_path.to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let search_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/services/rest")
            .query_param("method", "flickr.photos.search");
        then.status(200).json_body(serde_json::json!({
            "photos": {
                "pages": 4,
                "photo": [
                    {"title": "Harbour", "url_n": "https://img.example/h.jpg"},
                    {"title": "Opera", "url_n": "https://img.example/o.jpg"}
                ]
            },
            "stat": "ok"
        }));
    });

    let config = config_for(&server, &store_path);
    let settings: AlbumSettings = config.album_settings();

    let pin_id = {
        let store = Arc::new(JsonFileStore::open(&config.store.path).await.unwrap());
        let source = Arc::new(FlickrSource::new(&config.source).unwrap());
        let pin = store
            .add_pin(Coordinate::new(-33.8568, 151.2153).unwrap())
            .await
            .unwrap();

        let (session, _events) = AlbumSession::open(pin.clone(), store, source, &settings);
        session.ensure_album().finished().await;
        assert_eq!(session.status(), FetchStatus::Succeeded(2));
        pin.id()
    };

    // a fresh process sees the stored album and does not search again
    let store = Arc::new(JsonFileStore::open(&config.store.path).await.unwrap());
    let source = Arc::new(FlickrSource::new(&config.source).unwrap());
    let (session, _events) = AlbumSession::open_pin(pin_id, store, source, &settings)
        .await
        .unwrap();
    session.ensure_album().finished().await;

    assert_eq!(session.status(), FetchStatus::Idle);
    assert_eq!(session.photos().await.unwrap().len(), 2);
    search_mock.assert_hits(1);
}

#[tokio::test]
async fn test_new_collection_requests_another_page() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("albums.json");
    let store_path = store_path.to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    // with two pages and page 0 already shown, the refresh must ask for Flickr page 2
    let second_page_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/services/rest")
            .query_param("page", "2");
        then.status(200).json_body(serde_json::json!({
            "photos": {
                "pages": 2,
                "photo": [{"title": "Other", "url_n": "https://img.example/2.jpg"}]
            },
            "stat": "ok"
        }));
    });

    let search_mock = server.mock(|when, then| {
        when.method(GET).path("/services/rest");
        then.status(200).json_body(serde_json::json!({
            "photos": {
                "pages": 2,
                "photo": [{"title": "Only", "url_n": "https://img.example/1.jpg"}]
            },
            "stat": "ok"
        }));
    });

    let config = config_for(&server, &store_path);
    let store = Arc::new(JsonFileStore::open(&config.store.path).await.unwrap());
    let source = Arc::new(FlickrSource::new(&config.source).unwrap());
    let pin = store
        .add_pin(Coordinate::new(10.0, 10.0).unwrap())
        .await
        .unwrap();

    let (session, _events) =
        AlbumSession::open(pin, Arc::clone(&store), source, &config.album_settings());
    session.ensure_album().finished().await;
    session.refresh_album().finished().await;

    second_page_mock.assert_hits(1);
    search_mock.assert_hits(1);
    let photos = session.photos().await.unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].title, "Other");
}
