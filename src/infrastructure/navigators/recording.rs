use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Navigator;

/// Navigator that remembers what it was asked to do.
#[derive(Default)]
pub struct RecordingNavigator {
    pub location: Mutex<Option<String>>,
    pub notifications: Mutex<Vec<String>>,
    navigations: AtomicUsize,
    pub fail_navigation: bool,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> RecordingNavigator {
        return RecordingNavigator {
            location: Mutex::new(Some(location.to_string())),
            ..Default::default()
        };
    }

    /// A navigator whose login redirects always fail.
    pub fn failing() -> RecordingNavigator {
        return RecordingNavigator {
            fail_navigation: true,
            ..Default::default()
        };
    }

    pub fn navigations(&self) -> usize {
        return self.navigations.load(Ordering::SeqCst);
    }

    pub fn notifications(&self) -> Vec<String> {
        return self.notifications.lock().unwrap().clone();
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    fn current_location(&self) -> Option<String> {
        return self.location.lock().unwrap().clone();
    }

    fn notify(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }

    #[allow(clippy::implicit_return)]
    async fn navigate_to_login(&self) -> Result<()> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        if self.fail_navigation {
            bail!("navigation refused");
        }

        return Ok(());
    }
}
