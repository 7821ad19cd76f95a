#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::time::Duration;

use futures::future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use super::Portfolio;
use crate::domain::models::ArtworkId;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::PollEvent;
use crate::infrastructure::api::ArtworkSourceBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum PollerPhase {
    Idle,
    Polling,
}

#[derive(Default)]
struct Tracking {
    ids: HashSet<ArtworkId>,
    /// Tick that last asked about each id. Older answers are dropped.
    issued: HashMap<ArtworkId, u64>,
    timer: Option<JoinHandle<()>>,
    tick: u64,
}

struct PollerCore {
    source: ArtworkSourceBox,
    portfolio: Arc<Portfolio>,
    interval: Duration,
    events: Option<mpsc::UnboundedSender<PollEvent>>,
    tracking: Mutex<Tracking>,
}

impl PollerCore {
    fn tracking(&self) -> MutexGuard<'_, Tracking> {
        return self.tracking.lock().unwrap_or_else(|e| return e.into_inner());
    }

    fn emit(&self, event: PollEvent) {
        if let Some(tx) = &self.events {
            // Nobody listening is fine.
            let _ = tx.send(event);
        }
    }

    fn start_timer(core: &Arc<PollerCore>) -> JoinHandle<()> {
        let weak: Weak<PollerCore> = Arc::downgrade(core);
        let period = core.interval;

        return tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let core = match weak.upgrade() {
                    Some(core) => core,
                    None => return,
                };
                if !core.tick().await {
                    return;
                }
            }
        });
    }

    async fn tick(&self) -> bool {
        let (tick, ids) = {
            let mut tracking = self.tracking();
            tracking.tick += 1;
            let tick = tracking.tick;
            let ids: Vec<ArtworkId> = tracking.ids.iter().cloned().collect();
            for id in &ids {
                tracking.issued.insert(id.clone(), tick);
            }
            (tick, ids)
        };

        if ids.is_empty() {
            return self.stop_when_idle();
        }

        tracing::debug!(tick = tick, tracked = ids.len(), "Polling generation status");

        let responses = future::join_all(ids.iter().map(|id| {
            return async move {
                return (id, self.source.progress(id).await);
            };
        }))
        .await;

        for (id, res) in responses {
            if !self.is_current(id, tick) {
                tracing::debug!(id = id.as_str(), tick = tick, "Dropping stale status response");
                continue;
            }

            match res {
                Ok(report) => match self.portfolio.apply(id, &report) {
                    Some(true) => {
                        self.untrack(id);
                        let artwork = self.portfolio.get(id);
                        if report.status == ArtworkStatus::Completed {
                            tracing::info!(id = id.as_str(), "Generation completed");
                            self.emit(PollEvent::Completed(
                                id.clone(),
                                artwork.and_then(|e| return e.result_image_url),
                            ));
                        } else {
                            tracing::info!(id = id.as_str(), "Generation failed");
                            self.emit(PollEvent::Failed(
                                id.clone(),
                                artwork.and_then(|e| return e.error_message),
                            ));
                        }
                    }
                    Some(false) => {
                        let progress = self.portfolio.get(id).and_then(|e| return e.progress);
                        self.emit(PollEvent::Progress(id.clone(), progress));
                    }
                    None => {
                        tracing::debug!(id = id.as_str(), "Artwork left the portfolio");
                        self.untrack(id);
                    }
                },
                Err(err) => {
                    // Stays tracked, the next tick tries again.
                    tracing::warn!(error = ?err, id = id.as_str(), "Status poll failed");
                }
            }
        }

        return self.stop_when_idle();
    }

    fn is_current(&self, id: &ArtworkId, tick: u64) -> bool {
        let tracking = self.tracking();
        return tracking.ids.contains(id) && tracking.issued.get(id) == Some(&tick);
    }

    fn untrack(&self, id: &ArtworkId) {
        let mut tracking = self.tracking();
        tracking.ids.remove(id);
        tracking.issued.remove(id);
    }

    /// Returns whether polling goes on.
    fn stop_when_idle(&self) -> bool {
        let timer = {
            let mut tracking = self.tracking();
            if !tracking.ids.is_empty() {
                return true;
            }
            tracking.timer.take()
        };

        if let Some(timer) = timer {
            tracing::debug!("Nothing left to poll, stopping timer");
            timer.abort();
            self.emit(PollEvent::Idle());
        }

        return false;
    }

    fn teardown(&self) {
        let mut tracking = self.tracking();
        tracking.ids.clear();
        tracking.issued.clear();
        if let Some(timer) = tracking.timer.take() {
            timer.abort();
        }
    }
}

/// Tracks generating artworks and polls their status on one shared timer.
/// The timer runs exactly while something is tracked.
pub struct GenerationPoller {
    core: Arc<PollerCore>,
}

impl GenerationPoller {
    pub fn new(
        source: ArtworkSourceBox,
        portfolio: Arc<Portfolio>,
        interval: Duration,
        events: Option<mpsc::UnboundedSender<PollEvent>>,
    ) -> GenerationPoller {
        return GenerationPoller {
            core: Arc::new(PollerCore {
                source,
                portfolio,
                interval,
                events,
                tracking: Mutex::new(Tracking::default()),
            }),
        };
    }

    /// Starts tracking an artwork that is still processing. Returns false
    /// when it is unknown, already terminal, or already tracked.
    pub fn register(&self, id: &str) -> bool {
        if self.core.portfolio.status_of(id) != Some(ArtworkStatus::Processing) {
            return false;
        }

        let mut tracking = self.core.tracking();
        if !tracking.ids.insert(id.to_string()) {
            return false;
        }

        if tracking.timer.is_none() {
            tracing::debug!(interval = ?self.core.interval, "Starting status timer");
            tracking.timer = Some(PollerCore::start_timer(&self.core));
        }

        tracing::debug!(id = id, "Tracking artwork");
        return true;
    }

    /// Runs one poll round now. Returns whether polling goes on.
    pub async fn tick(&self) -> bool {
        return self.core.tick().await;
    }

    /// Stops the timer and forgets everything. Answers still in flight are
    /// dropped when they arrive.
    pub fn teardown(&self) {
        self.core.teardown();
    }

    pub fn phase(&self) -> PollerPhase {
        if self.core.tracking().timer.is_some() {
            return PollerPhase::Polling;
        }

        return PollerPhase::Idle;
    }

    pub fn tracked(&self) -> Vec<ArtworkId> {
        let mut ids: Vec<ArtworkId> = self.core.tracking().ids.iter().cloned().collect();
        ids.sort();
        return ids;
    }
}

impl Drop for GenerationPoller {
    fn drop(&mut self) {
        self.core.teardown();
    }
}
