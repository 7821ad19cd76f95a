#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time;
use tokio::time::Instant;

use crate::domain::models::Credentials;
use crate::domain::models::LoginResponse;
use crate::domain::models::SessionState;
use crate::domain::models::StorageKey;
use crate::domain::models::LOGIN_PAGE;
use crate::infrastructure::gateway::RequestGateway;
use crate::infrastructure::navigators::NavigatorBox;
use crate::infrastructure::storage::StorageBox;

const PROTECTED_PAGES: [&str; 4] = [
    "/pages/credits/credits",
    "/pages/portfolio/portfolio",
    "/pages/profile/profile",
    "/pages/create/create",
];

pub fn page_needs_login(path: &str) -> bool {
    return PROTECTED_PAGES.iter().any(|page| return path.starts_with(page));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTiming {
    /// Pause before navigating so the expiry notification can be read.
    pub redirect_delay: Duration,
    /// Minimum gap between two accepted login redirects.
    pub debounce_window: Duration,
}

impl Default for SessionTiming {
    fn default() -> SessionTiming {
        return SessionTiming {
            redirect_delay: Duration::from_millis(1000),
            debounce_window: Duration::from_millis(2000),
        };
    }
}

#[derive(Clone, Copy, Debug)]
struct RedirectMark {
    id: u64,
    started: Instant,
}

/// Owns the credential lifecycle. Everything else only reads the token.
pub struct SessionManager {
    storage: StorageBox,
    navigator: NavigatorBox,
    timing: SessionTiming,
    redirect: Mutex<Option<RedirectMark>>,
    next_mark: AtomicU64,
    /// Id of the last redirect that reached the navigator.
    navigated: watch::Sender<u64>,
}

impl SessionManager {
    pub fn new(storage: StorageBox, navigator: NavigatorBox, timing: SessionTiming) -> SessionManager {
        return SessionManager {
            storage,
            navigator,
            timing,
            redirect: Mutex::new(None),
            next_mark: AtomicU64::new(1),
            navigated: watch::channel(0).0,
        };
    }

    pub fn token(&self) -> Option<String> {
        return self
            .storage
            .get(StorageKey::Token)
            .filter(|token| return !token.is_empty());
    }

    pub fn profile(&self) -> Option<Value> {
        let payload = self.storage.get(StorageKey::User)?;
        return serde_json::from_str(&payload).ok();
    }

    pub fn state(&self) -> SessionState {
        if self.token().is_some() {
            return SessionState::LoggedIn;
        }

        return SessionState::LoggedOut;
    }

    pub fn redirect_in_flight(&self) -> bool {
        let redirect = self.redirect.lock().unwrap_or_else(|e| return e.into_inner());
        if let Some(mark) = *redirect {
            return mark.started.elapsed() < self.timing.debounce_window;
        }

        return false;
    }

    /// Waits until a scheduled login redirect has reached the navigator.
    pub async fn settle(&self) {
        let pending = {
            let redirect = self.redirect.lock().unwrap_or_else(|e| return e.into_inner());
            redirect.map(|mark| return mark.id)
        };

        if let Some(id) = pending {
            let mut navigated = self.navigated.subscribe();
            let _ = navigated.wait_for(|done| return *done >= id).await;
        }
    }

    pub async fn login(
        &self,
        gateway: &RequestGateway,
        credentials: &Credentials,
    ) -> Result<LoginResponse> {
        let res: LoginResponse = gateway
            .post(credentials.path(), &credentials.body())
            .await?;

        self.storage.set(StorageKey::Token, &res.access_token)?;
        self.storage
            .set(StorageKey::User, &serde_json::to_string(&res.profile())?)?;

        tracing::info!(path = credentials.path(), "Logged in");
        return Ok(res);
    }

    /// Drops credentials. Navigation afterwards is up to the caller.
    pub fn logout(&self) -> Result<()> {
        self.storage.remove(StorageKey::Token)?;
        self.storage.remove(StorageKey::User)?;

        tracing::info!("Logged out");
        return Ok(());
    }

    /// Validates a stored token against the backend. Any failure counts as
    /// logged out, a rejected token has already been dealt with by the
    /// gateway.
    pub async fn auto_login(&self, gateway: &RequestGateway) -> bool {
        if self.token().is_none() {
            tracing::debug!("No token stored, login required");
            return false;
        }

        match gateway.get::<Value>("/users/me").await {
            Ok(_) => return true,
            Err(err) => {
                tracing::debug!(error = ?err, "Stored token was not accepted");
                return false;
            }
        }
    }

    pub fn take_redirect_after_login(&self) -> Option<String> {
        let location = self.storage.get(StorageKey::RedirectAfterLogin)?;
        if let Err(err) = self.storage.remove(StorageKey::RedirectAfterLogin) {
            tracing::warn!(error = ?err, "Failed to clear return location");
        }

        return Some(location);
    }

    /// Called by the gateway for every 401.
    pub fn handle_unauthorized(self: &Arc<Self>) {
        self.clear_credentials();

        let mark = match self.begin_redirect() {
            Some(mark) => mark,
            None => {
                tracing::warn!("Login redirect already in flight, skipping 401 handling");
                return;
            }
        };

        self.remember_location();
        self.navigator.notify("Login expired, please sign in again.");
        self.schedule_redirect(mark, self.timing.redirect_delay);
    }

    /// Returns whether a token is present. Without one the user is sent to
    /// login, unless a redirect is already on its way or they are there.
    pub fn check_login(self: &Arc<Self>) -> bool {
        if self.token().is_some() {
            return true;
        }

        if self.redirect_in_flight() {
            tracing::debug!("Login redirect in flight, not starting another");
            return false;
        }

        let location = self.navigator.current_location();
        if location.as_deref() == Some(LOGIN_PAGE) {
            return false;
        }

        if let Some(mark) = self.begin_redirect() {
            self.remember_location();
            self.schedule_redirect(mark, Duration::ZERO);
        }

        return false;
    }

    fn clear_credentials(&self) {
        // Several failing requests can race here, clearing twice is harmless.
        for key in [StorageKey::Token, StorageKey::User] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(error = ?err, key = %key, "Failed to clear credential");
            }
        }
    }

    fn remember_location(&self) {
        if let Some(location) = self.navigator.current_location() {
            if let Err(err) = self.storage.set(StorageKey::RedirectAfterLogin, &location) {
                tracing::warn!(error = ?err, "Failed to record return location");
            }
        }
    }

    fn begin_redirect(&self) -> Option<RedirectMark> {
        let mut redirect = self.redirect.lock().unwrap_or_else(|e| return e.into_inner());
        if let Some(current) = *redirect {
            if current.started.elapsed() < self.timing.debounce_window {
                return None;
            }
        }

        let mark = RedirectMark {
            id: self.next_mark.fetch_add(1, Ordering::SeqCst),
            started: Instant::now(),
        };
        *redirect = Some(mark);

        let stamp = Utc::now().timestamp_millis().to_string();
        if let Err(err) = self.storage.set(StorageKey::LoginNavigating, &stamp) {
            tracing::warn!(error = ?err, "Failed to persist redirect marker");
        }

        return Some(mark);
    }

    fn schedule_redirect(self: &Arc<Self>, mark: RedirectMark, delay: Duration) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            if !delay.is_zero() {
                time::sleep(delay).await;
            }

            if let Err(err) = session.navigator.navigate_to_login().await {
                tracing::warn!(error = ?err, "Navigation to login failed");
            }
            session.navigated.send_replace(mark.id);

            time::sleep(session.timing.debounce_window).await;
            session.finish_redirect(mark);
        });
    }

    fn finish_redirect(&self, mark: RedirectMark) {
        let mut redirect = self.redirect.lock().unwrap_or_else(|e| return e.into_inner());
        // A newer redirect owns the marker now.
        if redirect.map(|current| return current.id) != Some(mark.id) {
            return;
        }

        *redirect = None;
        if let Err(err) = self.storage.remove(StorageKey::LoginNavigating) {
            tracing::warn!(error = ?err, "Failed to clear redirect marker");
        }
    }
}
