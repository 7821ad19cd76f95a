#[cfg(test)]
#[path = "artworks_test.rs"]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::domain::models::Artwork;
use crate::domain::models::ArtworkId;
use crate::domain::models::ArtworkProgress;
use crate::domain::models::ArtworkQuery;
use crate::domain::models::ArtworkSource;
use crate::domain::models::GalleryQuery;
use crate::domain::models::GatewayError;
use crate::domain::models::NewArtwork;
use crate::domain::models::Publication;
use crate::infrastructure::gateway::RequestGateway;

/// Artwork endpoints of the backend.
pub struct ArtworksApi {
    gateway: Arc<RequestGateway>,
}

impl ArtworksApi {
    pub fn new(gateway: Arc<RequestGateway>) -> ArtworksApi {
        return ArtworksApi { gateway };
    }

    pub async fn show(&self, id: &str) -> Result<Artwork, GatewayError> {
        return self.gateway.get(&format!("/artworks/{id}")).await;
    }

    pub async fn create(&self, artwork: &NewArtwork) -> Result<Artwork, GatewayError> {
        return self.gateway.post("/artworks", artwork).await;
    }

    pub async fn publish(&self, id: &str, publication: &Publication) -> Result<Artwork, GatewayError> {
        return self
            .gateway
            .patch(&format!("/artworks/{id}/publish"), publication)
            .await;
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        return self.gateway.delete(&format!("/artworks/{id}")).await;
    }

    /// Public artworks of every user.
    pub async fn gallery(&self, query: &GalleryQuery) -> Result<Vec<Artwork>, GatewayError> {
        return self
            .gateway
            .get_with_query("/artworks/gallery", &query.to_params())
            .await;
    }

    pub async fn record_view(&self, id: &str) -> Result<(), GatewayError> {
        self.gateway
            .send::<Value, Value>(Method::POST, &format!("/artworks/{id}/view"), &[], None)
            .await?;
        return Ok(());
    }
}

#[async_trait]
impl ArtworkSource for ArtworksApi {
    #[allow(clippy::implicit_return)]
    async fn list(&self, query: &ArtworkQuery) -> Result<Vec<Artwork>, GatewayError> {
        return self
            .gateway
            .get_with_query("/artworks", &query.to_params())
            .await;
    }

    #[allow(clippy::implicit_return)]
    async fn progress(&self, id: &ArtworkId) -> Result<ArtworkProgress, GatewayError> {
        return self.gateway.get(&format!("/artworks/{id}/progress")).await;
    }
}
