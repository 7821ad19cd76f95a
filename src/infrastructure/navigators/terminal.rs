use anyhow::Result;
use async_trait::async_trait;
use owo_colors::OwoColorize;

use crate::domain::models::Navigator;

/// Renders navigation for a command line session. The "page" is the command
/// being run, and going to login means telling the user how to sign in.
pub struct TerminalNavigator {
    location: String,
}

impl TerminalNavigator {
    pub fn new(location: &str) -> TerminalNavigator {
        return TerminalNavigator {
            location: location.to_string(),
        };
    }
}

#[async_trait]
impl Navigator for TerminalNavigator {
    fn current_location(&self) -> Option<String> {
        if self.location.is_empty() {
            return None;
        }

        return Some(self.location.to_string());
    }

    fn notify(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    #[allow(clippy::implicit_return)]
    async fn navigate_to_login(&self) -> Result<()> {
        eprintln!(
            "{} Run `{}` or `{}` to sign in again.",
            "Login required.".bold(),
            "atelier login --code <CODE>".cyan(),
            "atelier login --username <NAME> --password <PASSWORD>".cyan()
        );

        return Ok(());
    }
}
