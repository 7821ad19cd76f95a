use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::GenerationPoller;
use super::PollerPhase;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::GatewayError;
use crate::domain::models::PollEvent;
use crate::domain::services::Portfolio;
use crate::infrastructure::api::scripted::artwork;
use crate::infrastructure::api::scripted::completed;
use crate::infrastructure::api::scripted::failed;
use crate::infrastructure::api::scripted::processing;
use crate::infrastructure::api::scripted::ScriptedSource;

const INTERVAL: Duration = Duration::from_secs(5);

fn poller(
    source: &Arc<ScriptedSource>,
    portfolio: &Arc<Portfolio>,
    events: Option<mpsc::UnboundedSender<PollEvent>>,
) -> GenerationPoller {
    return GenerationPoller::new(source.clone(), portfolio.clone(), INTERVAL, events);
}

fn generating() -> Arc<Portfolio> {
    return Arc::new(Portfolio::with_artworks(vec![
        artwork("A42", ArtworkStatus::Processing),
        artwork("A43", ArtworkStatus::Completed),
    ]));
}

#[tokio::test(start_paused = true)]
async fn it_follows_an_artwork_until_it_completes() {
    let source = Arc::new(ScriptedSource::default());
    source
        .reply("A42", Ok(processing(40.0)))
        .reply("A42", Ok(completed("https://x/y.png")));
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);

    assert!(poller.register("A42"));
    assert_eq!(poller.phase(), PollerPhase::Polling);

    assert!(poller.tick().await);
    let artwork = portfolio.get("A42").unwrap();
    assert_eq!(artwork.status, ArtworkStatus::Processing);
    assert_eq!(artwork.progress, Some(40.0));
    assert_eq!(poller.tracked(), vec!["A42".to_string()]);

    assert!(!poller.tick().await);
    let artwork = portfolio.get("A42").unwrap();
    assert_eq!(artwork.status, ArtworkStatus::Completed);
    assert_eq!(artwork.result_image_url, Some("https://x/y.png".to_string()));
    assert!(poller.tracked().is_empty());
    assert_eq!(poller.phase(), PollerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn it_polls_on_the_timer_and_stops_when_idle() -> Result<()> {
    let source = Arc::new(ScriptedSource::default());
    source
        .reply("A42", Ok(processing(40.0)))
        .reply("A42", Ok(completed("https://x/y.png")));
    let portfolio = generating();
    let (tx, mut rx) = mpsc::unbounded_channel::<PollEvent>();
    let poller = poller(&source, &portfolio, Some(tx));
    poller.register("A42");

    time::sleep(Duration::from_millis(4900)).await;
    assert_eq!(source.progress_calls(), 0);

    time::sleep(Duration::from_millis(200)).await;
    assert_eq!(rx.try_recv()?, PollEvent::Progress("A42".to_string(), Some(40.0)));

    time::sleep(INTERVAL).await;
    assert_eq!(
        rx.try_recv()?,
        PollEvent::Completed("A42".to_string(), Some("https://x/y.png".to_string()))
    );
    assert_eq!(rx.try_recv()?, PollEvent::Idle());
    assert_eq!(poller.phase(), PollerPhase::Idle);

    time::sleep(INTERVAL * 4).await;
    assert_eq!(source.progress_calls(), 2);
    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_registers_each_processing_artwork_once() {
    let source = Arc::new(ScriptedSource::default());
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);

    assert!(poller.register("A42"));
    assert!(!poller.register("A42"));
    assert!(!poller.register("A43"));
    assert!(!poller.register("A99"));
    assert_eq!(poller.tracked(), vec!["A42".to_string()]);

    time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(source.progress_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn it_does_not_start_a_timer_for_terminal_artworks() {
    let source = Arc::new(ScriptedSource::default());
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);

    assert!(!poller.register("A43"));
    assert_eq!(poller.phase(), PollerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn it_keeps_tracking_after_a_failed_poll() {
    let source = Arc::new(ScriptedSource::default());
    source
        .reply("A42", Err(GatewayError::NetworkError("timed out".to_string())))
        .reply("A42", Ok(completed("https://x/y.png")));
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);
    poller.register("A42");

    assert!(poller.tick().await);
    assert_eq!(portfolio.status_of("A42"), Some(ArtworkStatus::Processing));
    assert_eq!(poller.tracked(), vec!["A42".to_string()]);
    assert_eq!(poller.phase(), PollerPhase::Polling);

    assert!(!poller.tick().await);
    assert_eq!(portfolio.status_of("A42"), Some(ArtworkStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn it_reports_failed_generations() -> Result<()> {
    let source = Arc::new(ScriptedSource::default());
    source.reply("A42", Ok(failed("Style model unavailable")));
    let portfolio = generating();
    let (tx, mut rx) = mpsc::unbounded_channel::<PollEvent>();
    let poller = poller(&source, &portfolio, Some(tx));
    poller.register("A42");

    assert!(!poller.tick().await);

    assert_eq!(
        rx.try_recv()?,
        PollEvent::Failed("A42".to_string(), Some("Style model unavailable".to_string()))
    );
    assert_eq!(rx.try_recv()?, PollEvent::Idle());
    assert_eq!(portfolio.status_of("A42"), Some(ArtworkStatus::Failed));
    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_ignores_answers_that_arrive_after_teardown() {
    let source = Arc::new(ScriptedSource::default());
    source.reply_after(
        "A42",
        Duration::from_secs(3),
        Ok(completed("https://x/y.png")),
    );
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);
    poller.register("A42");

    let (still_polling, _) = tokio::join!(poller.tick(), async {
        time::sleep(Duration::from_secs(1)).await;
        poller.teardown();
    });

    assert!(!still_polling);
    assert_eq!(portfolio.status_of("A42"), Some(ArtworkStatus::Processing));
    assert_eq!(poller.phase(), PollerPhase::Idle);

    time::sleep(INTERVAL * 4).await;
    assert_eq!(source.progress_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn it_drops_answers_from_an_older_tick() {
    let source = Arc::new(ScriptedSource::default());
    source
        .reply_after(
            "A42",
            Duration::from_secs(3),
            Ok(completed("https://x/stale.png")),
        )
        .reply("A42", Ok(processing(60.0)));
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);
    poller.register("A42");

    let (first, second) = tokio::join!(poller.tick(), async {
        time::sleep(Duration::from_secs(1)).await;
        return poller.tick().await;
    });

    assert!(first);
    assert!(second);
    let artwork = portfolio.get("A42").unwrap();
    assert_eq!(artwork.status, ArtworkStatus::Processing);
    assert_eq!(artwork.progress, Some(60.0));
    assert_eq!(artwork.result_image_url, None);
}

#[tokio::test(start_paused = true)]
async fn it_untracks_artworks_that_left_the_portfolio() {
    let source = Arc::new(ScriptedSource::default());
    let portfolio = generating();
    let poller = poller(&source, &portfolio, None);
    poller.register("A42");

    portfolio.remove("A42");

    assert!(!poller.tick().await);
    assert!(poller.tracked().is_empty());
    assert_eq!(poller.phase(), PollerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn it_stops_the_timer_when_dropped() {
    let source = Arc::new(ScriptedSource::default());
    let portfolio = generating();
    {
        let poller = poller(&source, &portfolio, None);
        poller.register("A42");
    }

    time::sleep(INTERVAL * 4).await;
    assert_eq!(source.progress_calls(), 0);
}
