use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use test_utils::artwork_fixture;
use test_utils::artwork_page_fixture;

use super::ArtworksApi;
use crate::domain::models::ArtworkQuery;
use crate::domain::models::ArtworkSource;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::GalleryQuery;
use crate::domain::models::GallerySort;
use crate::domain::models::ImageSource;
use crate::domain::models::NewArtwork;
use crate::domain::models::PortfolioTab;
use crate::domain::models::Publication;
use crate::domain::models::PublicScope;
use crate::domain::services::SessionManager;
use crate::domain::services::SessionTiming;
use crate::infrastructure::gateway::RequestGateway;
use crate::infrastructure::navigators::recording::RecordingNavigator;
use crate::infrastructure::storage::memory::MemoryStorage;

fn api(url: &str) -> Result<ArtworksApi> {
    let session = Arc::new(SessionManager::new(
        Arc::new(MemoryStorage::default()),
        Arc::new(RecordingNavigator::default()),
        SessionTiming::default(),
    ));
    let gateway = RequestGateway::new(url, Duration::from_secs(5), session)?;
    return Ok(ArtworksApi::new(Arc::new(gateway)));
}

#[tokio::test]
async fn it_lists_a_portfolio_tab() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/artworks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), "0".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("is_public".into(), "true".into()),
        ]))
        .with_status(200)
        .with_body(artwork_page_fixture())
        .create_async()
        .await;

    let query = ArtworkQuery {
        tab: PortfolioTab::Public,
        ..Default::default()
    };
    let artworks = api(&server.url())?.list(&query).await?;

    mock.assert_async().await;
    assert_eq!(artworks.len(), 3);
    assert_eq!(artworks[0].id, "41");
    assert_eq!(artworks[0].status, ArtworkStatus::Processing);
    assert_eq!(
        artworks[1].result_image_url,
        Some("https://cdn.example.com/results/42.png".to_string())
    );
    return Ok(());
}

#[tokio::test]
async fn it_fetches_progress() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/artworks/42/progress")
        .with_status(200)
        .with_body(r#"{"status": "completed", "progress": 100, "result_image_url": "https://x/y.png"}"#)
        .create_async()
        .await;

    let report = api(&server.url())?.progress(&"42".to_string()).await?;

    mock.assert_async().await;
    assert_eq!(report.status, ArtworkStatus::Completed);
    assert_eq!(report.artwork_url, Some("https://x/y.png".to_string()));
    return Ok(());
}

#[tokio::test]
async fn it_creates_publishes_and_deletes() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let create_mock = server
        .mock("POST", "/artworks")
        .match_body(Matcher::Json(json!({
            "style_id": 3,
            "image_url": "https://cdn.example.com/sources/44.jpg"
        })))
        .with_status(200)
        .with_body(artwork_fixture(44, "processing").to_string())
        .create_async()
        .await;
    let publish_mock = server
        .mock("PATCH", "/artworks/44/publish")
        .match_body(Matcher::Json(json!({
            "is_public": true,
            "public_scope": "all"
        })))
        .with_status(200)
        .with_body(artwork_fixture(44, "completed").to_string())
        .create_async()
        .await;
    let delete_mock = server
        .mock("DELETE", "/artworks/44")
        .with_status(200)
        .with_body(r#"{"message": "deleted"}"#)
        .create_async()
        .await;

    let api = api(&server.url())?;
    let created = api
        .create(&NewArtwork::new(
            3,
            ImageSource::Url("https://cdn.example.com/sources/44.jpg".to_string()),
        ))
        .await?;
    assert!(created.is_processing());

    let published = api
        .publish(
            &created.id,
            &Publication {
                is_public: true,
                public_scope: PublicScope::All,
            },
        )
        .await?;
    assert_eq!(published.status, ArtworkStatus::Completed);

    api.delete(&created.id).await?;

    create_mock.assert_async().await;
    publish_mock.assert_async().await;
    delete_mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_browses_the_gallery_by_popularity() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mut item = artwork_fixture(42, "completed");
    item["is_public"] = json!(true);
    item["views_count"] = json!(31);
    item["likes_count"] = json!(4);
    let mock = server
        .mock("GET", "/artworks/gallery")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), "10".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("is_public".into(), "true".into()),
            Matcher::UrlEncoded("order_by".into(), "views_count".into()),
            Matcher::UrlEncoded("order_desc".into(), "true".into()),
        ]))
        .with_status(200)
        .with_body(format!("[{item}]"))
        .create_async()
        .await;

    let query = GalleryQuery {
        skip: 10,
        sort: GallerySort::Popular,
        ..Default::default()
    };
    let artworks = api(&server.url())?.gallery(&query).await?;

    mock.assert_async().await;
    assert_eq!(artworks.len(), 1);
    assert_eq!(artworks[0].views_count, 31);
    assert_eq!(artworks[0].likes_count, 4);
    return Ok(());
}

#[tokio::test]
async fn it_records_artwork_views() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/artworks/42/view")
        .with_status(200)
        .with_body(r#"{"views_count": 32}"#)
        .create_async()
        .await;

    api(&server.url())?.record_view("42").await?;

    mock.assert_async().await;
    return Ok(());
}
