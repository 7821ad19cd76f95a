use serde::Deserialize;
use serde::Serialize;

/// Body of `GET /orders/payment-status/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub order_id: i64,
    pub status: String,
    pub paid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentStatus {
    pub fn is_abandoned(&self) -> bool {
        return self.status == "cancelled" || self.status == "refunded";
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub order_no: Option<String>,
    pub credits: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid { order_id: i64, credits: Option<i64> },
    NotCompleted { message: String },
    /// Attempts ran out without a definite answer.
    Unknown { message: String },
}
