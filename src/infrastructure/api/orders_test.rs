use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;

use super::OrdersApi;
use crate::domain::models::OrderSource;
use crate::domain::models::Paging;
use crate::domain::services::SessionManager;
use crate::domain::services::SessionTiming;
use crate::infrastructure::gateway::RequestGateway;
use crate::infrastructure::navigators::recording::RecordingNavigator;
use crate::infrastructure::storage::memory::MemoryStorage;

fn api(url: &str) -> Result<OrdersApi> {
    let session = Arc::new(SessionManager::new(
        Arc::new(MemoryStorage::default()),
        Arc::new(RecordingNavigator::default()),
        SessionTiming::default(),
    ));
    let gateway = RequestGateway::new(url, Duration::from_secs(5), session)?;
    return Ok(OrdersApi::new(Arc::new(gateway)));
}

#[tokio::test]
async fn it_lists_orders() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/orders")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), "0".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[{"id": 12, "order_no": "AT20240501", "user_id": 7, "product_id": 1, "amount": 9.9, "credits": 100, "status": "paid", "created_at": "2024-05-01T10:00:00"}]"#,
        )
        .create_async()
        .await;

    let orders = api(&server.url())?.list(&Paging::default()).await?;

    mock.assert_async().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_no, Some("AT20240501".to_string()));
    assert_eq!(orders[0].status, Some("paid".to_string()));
    return Ok(());
}

#[tokio::test]
async fn it_reads_payment_status_and_order() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let status_mock = server
        .mock("GET", "/orders/payment-status/12")
        .with_status(200)
        .with_body(r#"{"order_id": 12, "status": "pending", "paid": false}"#)
        .create_async()
        .await;
    let order_mock = server
        .mock("GET", "/orders/12")
        .with_status(200)
        .with_body(r#"{"id": 12, "credits": 100}"#)
        .create_async()
        .await;

    let api = api(&server.url())?;
    let status = api.payment_status(12).await?;
    assert!(!status.paid);
    assert_eq!(status.message, None);
    assert_eq!(api.order(12).await?.credits, 100);

    status_mock.assert_async().await;
    order_mock.assert_async().await;
    return Ok(());
}
