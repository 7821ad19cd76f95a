#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::io;
use std::process;
use std::sync::Arc;

use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::GatewayError;
use crate::domain::models::StorageName;
use crate::domain::services::actions::ActionSettings;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::SessionManager;
use crate::domain::services::SessionTiming;
use crate::infrastructure::gateway::RequestGateway;
use crate::infrastructure::navigators::terminal::TerminalNavigator;
use crate::infrastructure::storage::StorageManager;

fn handle_error(err: Error) {
    // The session has already told the user how to sign in again.
    if let Some(gateway_err) = err.downcast_ref::<GatewayError>() {
        if gateway_err.is_unauthorized() {
            process::exit(1);
        }
        eprintln!("{}", gateway_err.to_string().red());
        process::exit(1);
    }

    eprintln!(
        "{}",
        format!(
            "Atelier has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn run(action: Action) -> Result<()> {
    let storage_name = StorageName::parse(Config::get(ConfigKey::Storage))
        .ok_or_else(|| return anyhow::anyhow!("Unknown storage {}", Config::get(ConfigKey::Storage)))?;
    let storage = StorageManager::get(storage_name)?;
    let navigator = Arc::new(TerminalNavigator::new(action.page()));

    let session = Arc::new(SessionManager::new(
        storage,
        navigator,
        SessionTiming {
            redirect_delay: Config::millis(ConfigKey::RedirectDelay)?,
            debounce_window: Config::millis(ConfigKey::RedirectDebounce)?,
        },
    ));
    let gateway = Arc::new(RequestGateway::new(
        &Config::get(ConfigKey::ApiURL),
        Config::millis(ConfigKey::RequestTimeout)?,
        session.clone(),
    )?);

    let service = ActionsService::new(
        session.clone(),
        gateway,
        ActionSettings {
            poll_interval: Config::millis(ConfigKey::PollInterval)?,
            payment_retries: Config::count(ConfigKey::PaymentRetries)?,
            payment_interval: Config::millis(ConfigKey::PaymentInterval)?,
        },
    );

    let res = service.run(action, &mut io::stdout()).await;
    // Let a pending login prompt reach the terminal before exiting.
    session.settle().await;

    return res;
}

#[tokio::main]
async fn main() {
    better_panic::install();

    let debug_log_dir = env::var("ATELIER_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(|| return env::temp_dir())
            .join("atelier")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("atelier")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let action = match cli::parse().await {
        Ok(Some(action)) => action,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    if let Err(err) = run(action).await {
        handle_error(err);
    }

    process::exit(0);
}
