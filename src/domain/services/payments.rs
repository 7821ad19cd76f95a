#[cfg(test)]
#[path = "payments_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::time;

use crate::domain::models::PaymentOutcome;
use crate::infrastructure::api::OrderSourceBox;

const STILL_PROCESSING: &str =
    "The payment may still be processing, check the order status again later.";
const QUERY_FAILED: &str = "Could not confirm the payment, check the order status again later.";

/// Confirms an order after checkout by polling its payment status.
pub struct PaymentWatcher {
    source: OrderSourceBox,
    retries: u32,
    interval: Duration,
    processing: AtomicBool,
}

impl PaymentWatcher {
    pub fn new(source: OrderSourceBox, retries: u32, interval: Duration) -> PaymentWatcher {
        return PaymentWatcher {
            source,
            retries: retries.max(1),
            interval,
            processing: AtomicBool::new(false),
        };
    }

    pub fn is_processing(&self) -> bool {
        return self.processing.load(Ordering::SeqCst);
    }

    /// Polls until the order is paid, abandoned, or attempts run out. Only
    /// one confirmation runs at a time.
    pub async fn confirm(&self, order_id: i64) -> Result<PaymentOutcome> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            bail!("A payment is already being confirmed");
        }

        let outcome = self.poll(order_id).await;
        self.processing.store(false, Ordering::SeqCst);

        tracing::info!(order_id = order_id, outcome = ?outcome, "Payment confirmation finished");
        return Ok(outcome);
    }

    async fn poll(&self, order_id: i64) -> PaymentOutcome {
        let mut last_failed = false;

        for attempt in 1..=self.retries {
            match self.source.payment_status(order_id).await {
                Ok(status) if status.paid => {
                    let credits = match self.source.order(order_id).await {
                        Ok(order) => Some(order.credits),
                        Err(err) => {
                            tracing::warn!(error = ?err, order_id = order_id, "Paid order could not be loaded");
                            None
                        }
                    };
                    return PaymentOutcome::Paid { order_id, credits };
                }
                Ok(status) if status.is_abandoned() => {
                    return PaymentOutcome::NotCompleted {
                        message: status
                            .message
                            .unwrap_or_else(|| return "The order was cancelled or refunded.".to_string()),
                    };
                }
                Ok(status) => {
                    tracing::debug!(order_id = order_id, attempt = attempt, status = %status.status, "Payment pending");
                    last_failed = false;
                }
                Err(err) => {
                    tracing::warn!(error = ?err, order_id = order_id, attempt = attempt, "Payment status query failed");
                    last_failed = true;
                }
            }

            if attempt < self.retries {
                time::sleep(self.interval).await;
            }
        }

        let message = if last_failed { QUERY_FAILED } else { STILL_PROCESSING };
        return PaymentOutcome::Unknown {
            message: message.to_string(),
        };
    }
}
