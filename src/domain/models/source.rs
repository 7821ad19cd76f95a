use async_trait::async_trait;

use super::Artwork;
use super::ArtworkId;
use super::ArtworkProgress;
use super::ArtworkQuery;
use super::GatewayError;
use super::Order;
use super::PaymentStatus;

/// Where artwork lists and generation status come from.
#[async_trait]
pub trait ArtworkSource {
    async fn list(&self, query: &ArtworkQuery) -> Result<Vec<Artwork>, GatewayError>;

    async fn progress(&self, id: &ArtworkId) -> Result<ArtworkProgress, GatewayError>;
}

#[async_trait]
pub trait OrderSource {
    async fn payment_status(&self, order_id: i64) -> Result<PaymentStatus, GatewayError>;

    async fn order(&self, order_id: i64) -> Result<Order, GatewayError>;
}
