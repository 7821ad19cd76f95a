use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use crate::domain::models::Artwork;
use crate::domain::models::ArtworkId;
use crate::domain::models::ArtworkProgress;
use crate::domain::models::ArtworkQuery;
use crate::domain::models::ArtworkSource;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::GatewayError;
use crate::domain::models::Order;
use crate::domain::models::OrderSource;
use crate::domain::models::PaymentStatus;

pub fn processing(progress: f64) -> ArtworkProgress {
    return ArtworkProgress {
        status: ArtworkStatus::Processing,
        progress: Some(progress),
        artwork_url: None,
        error_message: None,
    };
}

pub fn completed(url: &str) -> ArtworkProgress {
    return ArtworkProgress {
        status: ArtworkStatus::Completed,
        progress: Some(100.0),
        artwork_url: Some(url.to_string()),
        error_message: None,
    };
}

pub fn failed(reason: &str) -> ArtworkProgress {
    return ArtworkProgress {
        status: ArtworkStatus::Failed,
        progress: None,
        artwork_url: None,
        error_message: Some(reason.to_string()),
    };
}

pub fn artwork(id: &str, status: ArtworkStatus) -> Artwork {
    return Artwork {
        id: id.to_string(),
        status,
        source_image_url: Some(format!("https://cdn.example.com/sources/{id}.jpg")),
        result_image_url: None,
        progress: None,
        style_name: Some("Ink Wash".to_string()),
        is_public: false,
        public_scope: None,
        error_message: None,
        created_at: None,
        likes_count: 0,
        views_count: 0,
    };
}

struct Reply<T> {
    delay: Duration,
    res: Result<T, GatewayError>,
}

/// Source that answers from queued replies. Ids without a queued reply
/// report as still processing.
#[derive(Default)]
pub struct ScriptedSource {
    progress: Mutex<HashMap<ArtworkId, VecDeque<Reply<ArtworkProgress>>>>,
    pages: Mutex<VecDeque<Reply<Vec<Artwork>>>>,
    queries: Mutex<Vec<ArtworkQuery>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn reply(&self, id: &str, res: Result<ArtworkProgress, GatewayError>) -> &ScriptedSource {
        return self.reply_after(id, Duration::ZERO, res);
    }

    pub fn reply_after(
        &self,
        id: &str,
        delay: Duration,
        res: Result<ArtworkProgress, GatewayError>,
    ) -> &ScriptedSource {
        self.progress
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(Reply { delay, res });
        return self;
    }

    pub fn page(&self, res: Result<Vec<Artwork>, GatewayError>) -> &ScriptedSource {
        return self.page_after(Duration::ZERO, res);
    }

    pub fn page_after(
        &self,
        delay: Duration,
        res: Result<Vec<Artwork>, GatewayError>,
    ) -> &ScriptedSource {
        self.pages.lock().unwrap().push_back(Reply { delay, res });
        return self;
    }

    pub fn progress_calls(&self) -> usize {
        return self.calls.load(Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<ArtworkQuery> {
        return self.queries.lock().unwrap().clone();
    }
}

#[async_trait]
impl ArtworkSource for ScriptedSource {
    #[allow(clippy::implicit_return)]
    async fn list(&self, query: &ArtworkQuery) -> Result<Vec<Artwork>, GatewayError> {
        self.queries.lock().unwrap().push(query.clone());
        let reply = self.pages.lock().unwrap().pop_front();

        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    time::sleep(reply.delay).await;
                }
                return reply.res;
            }
            None => return Ok(vec![]),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn progress(&self, id: &ArtworkId) -> Result<ArtworkProgress, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .progress
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(|e| return e.pop_front());

        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    time::sleep(reply.delay).await;
                }
                return reply.res;
            }
            None => {
                return Ok(ArtworkProgress {
                    status: ArtworkStatus::Processing,
                    progress: None,
                    artwork_url: None,
                    error_message: None,
                })
            }
        }
    }
}

/// Order source answering payment polls in sequence. The last status
/// repeats once the queue runs dry.
#[derive(Default)]
pub struct ScriptedOrders {
    statuses: Mutex<VecDeque<Result<PaymentStatus, GatewayError>>>,
    order: Mutex<Option<Result<Order, GatewayError>>>,
    calls: AtomicUsize,
}

impl ScriptedOrders {
    pub fn status(&self, res: Result<PaymentStatus, GatewayError>) -> &ScriptedOrders {
        self.statuses.lock().unwrap().push_back(res);
        return self;
    }

    pub fn order(&self, res: Result<Order, GatewayError>) -> &ScriptedOrders {
        *self.order.lock().unwrap() = Some(res);
        return self;
    }

    pub fn status_calls(&self) -> usize {
        return self.calls.load(Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderSource for ScriptedOrders {
    #[allow(clippy::implicit_return)]
    async fn payment_status(&self, _order_id: i64) -> Result<PaymentStatus, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap();
        }

        return statuses
            .front()
            .cloned()
            .unwrap_or_else(|| return Err(GatewayError::NetworkError("no reply scripted".to_string())));
    }

    #[allow(clippy::implicit_return)]
    async fn order(&self, order_id: i64) -> Result<Order, GatewayError> {
        return self.order.lock().unwrap().clone().unwrap_or_else(|| {
            return Err(GatewayError::RequestFailed {
                status: 404,
                message: format!("Order {order_id} not found"),
            });
        });
    }
}
