#[cfg(test)]
#[path = "orders_test.rs"]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::models::GatewayError;
use crate::domain::models::Order;
use crate::domain::models::OrderSource;
use crate::domain::models::Paging;
use crate::domain::models::PaymentStatus;
use crate::infrastructure::gateway::RequestGateway;

pub struct OrdersApi {
    gateway: Arc<RequestGateway>,
}

impl OrdersApi {
    pub fn new(gateway: Arc<RequestGateway>) -> OrdersApi {
        return OrdersApi { gateway };
    }

    /// The signed in user's orders, newest first.
    pub async fn list(&self, paging: &Paging) -> Result<Vec<Order>, GatewayError> {
        return self
            .gateway
            .get_with_query("/orders", &paging.to_params())
            .await;
    }
}

#[async_trait]
impl OrderSource for OrdersApi {
    #[allow(clippy::implicit_return)]
    async fn payment_status(&self, order_id: i64) -> Result<PaymentStatus, GatewayError> {
        return self
            .gateway
            .get(&format!("/orders/payment-status/{order_id}"))
            .await;
    }

    #[allow(clippy::implicit_return)]
    async fn order(&self, order_id: i64) -> Result<Order, GatewayError> {
        return self.gateway.get(&format!("/orders/{order_id}")).await;
    }
}
