#[cfg(test)]
#[path = "account_test.rs"]
mod tests;

use std::sync::Arc;

use serde_json::json;
use serde_json::Value;

use crate::domain::models::CardKeyActivation;
use crate::domain::models::CreditBalance;
use crate::domain::models::CreditRecord;
use crate::domain::models::GatewayError;
use crate::domain::models::Paging;
use crate::domain::models::Product;
use crate::domain::models::Style;
use crate::domain::models::StyleCategory;
use crate::infrastructure::gateway::RequestGateway;

pub struct AccountApi {
    gateway: Arc<RequestGateway>,
}

impl AccountApi {
    pub fn new(gateway: Arc<RequestGateway>) -> AccountApi {
        return AccountApi { gateway };
    }

    pub async fn me(&self) -> Result<Value, GatewayError> {
        return self.gateway.get("/users/me").await;
    }

    pub async fn balance(&self) -> Result<CreditBalance, GatewayError> {
        return self.gateway.get("/credits/balance").await;
    }

    pub async fn activate_card(&self, card_key: &str) -> Result<CardKeyActivation, GatewayError> {
        return self
            .gateway
            .post("/card-keys/activate", &json!({ "card_key": card_key }))
            .await;
    }

    pub async fn credit_records(&self, paging: &Paging) -> Result<Vec<CreditRecord>, GatewayError> {
        return self
            .gateway
            .get_with_query("/credits/records", &paging.to_params())
            .await;
    }

    /// Active styles, optionally narrowed to one category.
    pub async fn styles(&self, category_id: Option<i64>) -> Result<Vec<Style>, GatewayError> {
        let mut params = vec![];
        if let Some(id) = category_id {
            params.push(("category_id".to_string(), id.to_string()));
        }

        return self.gateway.get_with_query("/styles", &params).await;
    }

    pub async fn categories(&self) -> Result<Vec<StyleCategory>, GatewayError> {
        return self.gateway.get("/categories").await;
    }

    pub async fn products(&self) -> Result<Vec<Product>, GatewayError> {
        return self.gateway.get("/products").await;
    }
}
