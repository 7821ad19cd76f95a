#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time;

use super::page_needs_login;
use super::PaymentWatcher;
use super::PollerPhase;
use super::PortfolioView;
use super::SessionManager;
use crate::domain::models::display_name;
use crate::domain::models::Action;
use crate::domain::models::Artwork;
use crate::domain::models::ArtworkSource;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::CreditRecord;
use crate::domain::models::Order;
use crate::domain::models::PaymentOutcome;
use crate::domain::models::PollEvent;
use crate::domain::models::PortfolioTab;
use crate::infrastructure::api::account::AccountApi;
use crate::infrastructure::api::artworks::ArtworksApi;
use crate::infrastructure::api::orders::OrdersApi;
use crate::infrastructure::gateway::RequestGateway;

pub fn format_artwork(artwork: &Artwork) -> String {
    let style = artwork.style_name.as_deref().unwrap_or("unknown style");
    let mut line = format!("- ({}) {style} [{}]", artwork.id, artwork.status);

    match artwork.status {
        ArtworkStatus::Processing => {
            if let Some(progress) = artwork.progress {
                line.push_str(&format!(" {progress:.0}%"));
            }
        }
        ArtworkStatus::Completed => {
            if let Some(url) = &artwork.result_image_url {
                line.push_str(&format!(" {url}"));
            }
        }
        ArtworkStatus::Failed => {
            if let Some(reason) = &artwork.error_message {
                line.push_str(&format!(" {reason}"));
            }
        }
    }

    if artwork.is_public {
        line.push_str(" (public)");
    }

    return line;
}

pub fn format_gallery_item(artwork: &Artwork) -> String {
    let style = artwork.style_name.as_deref().unwrap_or("unknown style");
    let url = artwork.result_image_url.as_deref().unwrap_or("no image yet");
    return format!(
        "- ({}) {style} {url} ({} likes, {} views)",
        artwork.id, artwork.likes_count, artwork.views_count
    );
}

pub fn format_credit_record(record: &CreditRecord) -> String {
    let when = record.created_at.as_deref().unwrap_or("-");
    let mut line = format!(
        "- {when} {:+} {} (balance {})",
        record.amount, record.kind, record.balance
    );
    if let Some(description) = &record.description {
        line.push_str(&format!(": {description}"));
    }

    return line;
}

pub fn format_order(order: &Order) -> String {
    let mut line = format!("- Order {}: {} credits", order.id, order.credits);
    if let Some(amount) = order.amount {
        line.push_str(&format!(" for {amount:.2}"));
    }
    if let Some(status) = &order.status {
        line.push_str(&format!(" [{status}]"));
    }
    if let Some(created_at) = &order.created_at {
        line.push_str(&format!(" {created_at}"));
    }

    return line;
}

pub fn format_event(event: &PollEvent) -> String {
    match event {
        PollEvent::Progress(id, Some(progress)) => return format!("Artwork {id} at {progress:.0}%"),
        PollEvent::Progress(id, None) => return format!("Artwork {id} is generating"),
        PollEvent::Completed(id, Some(url)) => return format!("Artwork {id} completed: {url}"),
        PollEvent::Completed(id, None) => return format!("Artwork {id} completed"),
        PollEvent::Failed(id, Some(reason)) => return format!("Artwork {id} failed: {reason}"),
        PollEvent::Failed(id, None) => return format!("Artwork {id} failed"),
        PollEvent::Idle() => return "All generations finished".to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSettings {
    pub poll_interval: Duration,
    pub payment_retries: u32,
    pub payment_interval: Duration,
}

impl Default for ActionSettings {
    fn default() -> ActionSettings {
        return ActionSettings {
            poll_interval: Duration::from_millis(5000),
            payment_retries: 5,
            payment_interval: Duration::from_millis(2000),
        };
    }
}

pub struct ActionsService {
    session: Arc<SessionManager>,
    gateway: Arc<RequestGateway>,
    artworks: Arc<ArtworksApi>,
    account: AccountApi,
    orders: Arc<OrdersApi>,
    payments: PaymentWatcher,
    poll_interval: Duration,
}

impl ActionsService {
    pub fn new(
        session: Arc<SessionManager>,
        gateway: Arc<RequestGateway>,
        settings: ActionSettings,
    ) -> ActionsService {
        let orders = Arc::new(OrdersApi::new(gateway.clone()));

        return ActionsService {
            artworks: Arc::new(ArtworksApi::new(gateway.clone())),
            account: AccountApi::new(gateway.clone()),
            payments: PaymentWatcher::new(
                orders.clone(),
                settings.payment_retries,
                settings.payment_interval,
            ),
            poll_interval: settings.poll_interval,
            orders,
            session,
            gateway,
        };
    }

    /// Runs one action, writing what the user should see to `out`. Actions
    /// on protected pages hand over to the login flow when signed out.
    pub async fn run<W: Write + Send>(&self, action: Action, out: &mut W) -> Result<()> {
        if page_needs_login(action.page()) && !self.session.check_login() {
            tracing::debug!(page = action.page(), "Action needs a session");
            return Ok(());
        }

        match action {
            Action::Login(credentials) => {
                let res = self.session.login(&self.gateway, &credentials).await?;
                writeln!(out, "Logged in as {}", display_name(&res.profile()))?;
                if let Some(location) = self.session.take_redirect_after_login() {
                    writeln!(out, "You can go back to {location}")?;
                }
            }
            Action::Logout() => {
                self.session.logout()?;
                writeln!(out, "Logged out")?;
            }
            Action::WhoAmI() => {
                let profile = self.account.me().await?;
                writeln!(out, "{}", display_name(&profile))?;
                if let Some(credits) = profile.get("credits") {
                    writeln!(out, "Credits: {credits}")?;
                }
            }
            Action::ArtworkList(query) => {
                let artworks = self.artworks.list(&query).await?;
                if artworks.is_empty() {
                    writeln!(out, "No artworks yet.")?;
                }
                for artwork in &artworks {
                    writeln!(out, "{}", format_artwork(artwork))?;
                }
            }
            Action::ArtworkShow(id) => {
                let artwork = self.artworks.show(&id).await?;
                writeln!(out, "{}", format_artwork(&artwork))?;
                if let Some(source) = &artwork.source_image_url {
                    writeln!(out, "Source: {source}")?;
                }
                if let Some(created_at) = &artwork.created_at {
                    writeln!(out, "Created: {created_at}")?;
                }
            }
            Action::ArtworkProgress(id) => {
                let report = self.artworks.progress(&id).await?;
                let line = match report.status {
                    ArtworkStatus::Processing => {
                        format_event(&PollEvent::Progress(id, report.progress))
                    }
                    ArtworkStatus::Completed => {
                        format_event(&PollEvent::Completed(id, report.artwork_url))
                    }
                    ArtworkStatus::Failed => {
                        format_event(&PollEvent::Failed(id, report.error_message))
                    }
                };
                writeln!(out, "{line}")?;
            }
            Action::ArtworkCreate(new_artwork) => {
                let artwork = self.artworks.create(&new_artwork).await?;
                writeln!(out, "{}", format_artwork(&artwork))?;
                if artwork.is_processing() {
                    writeln!(out, "Run `atelier artworks watch` to follow the generation.")?;
                }
            }
            Action::ArtworkPublish(id, publication) => {
                let artwork = self.artworks.publish(&id, &publication).await?;
                if publication.is_public {
                    writeln!(out, "Artwork {} is public ({})", artwork.id, publication.public_scope)?;
                } else {
                    writeln!(out, "Artwork {} is private", artwork.id)?;
                }
            }
            Action::ArtworkDelete(id) => {
                self.artworks.delete(&id).await?;
                writeln!(out, "Deleted artwork {id}")?;
            }
            Action::ArtworkWatch(tab) => {
                self.watch(tab, out).await?;
            }
            Action::GalleryList(query) => {
                let artworks = self.artworks.gallery(&query).await?;
                if artworks.is_empty() {
                    writeln!(out, "The gallery is empty.")?;
                }
                for artwork in &artworks {
                    writeln!(out, "{}", format_gallery_item(artwork))?;
                }
            }
            Action::GalleryOpen(id) => {
                let artwork = self.artworks.show(&id).await?;
                // View counting is best effort.
                if let Err(err) = self.artworks.record_view(&id).await {
                    tracing::warn!(error = ?err, id = %id, "Failed to record artwork view");
                }
                writeln!(out, "{}", format_gallery_item(&artwork))?;
                if let Some(source) = &artwork.source_image_url {
                    writeln!(out, "Source: {source}")?;
                }
            }
            Action::OrderStatus(order_id) => match self.payments.confirm(order_id).await? {
                PaymentOutcome::Paid { order_id, credits } => match credits {
                    Some(credits) => writeln!(out, "Order {order_id} paid, {credits} credits added")?,
                    None => writeln!(out, "Order {order_id} paid")?,
                },
                PaymentOutcome::NotCompleted { message } => {
                    writeln!(out, "Payment not completed: {message}")?;
                }
                PaymentOutcome::Unknown { message } => writeln!(out, "{message}")?,
            },
            Action::OrderList(paging) => {
                let orders = self.orders.list(&paging).await?;
                if orders.is_empty() {
                    writeln!(out, "No orders yet.")?;
                }
                for order in &orders {
                    writeln!(out, "{}", format_order(order))?;
                }
            }
            Action::ProductList() => {
                for product in self.account.products().await? {
                    writeln!(
                        out,
                        "- ({}) {}: {} credits for {:.2}",
                        product.id, product.name, product.credits, product.price
                    )?;
                }
            }
            Action::CreditHistory(paging) => {
                let records = self.account.credit_records(&paging).await?;
                if records.is_empty() {
                    writeln!(out, "No credit records yet.")?;
                }
                for record in &records {
                    writeln!(out, "{}", format_credit_record(record))?;
                }
            }
            Action::Credits() => {
                let balance = self.account.balance().await?;
                writeln!(out, "Credits: {}", balance.balance)?;
            }
            Action::CardActivate(card_key) => {
                let res = self.account.activate_card(&card_key).await?;
                writeln!(
                    out,
                    "Activated {} credits, balance is now {}",
                    res.credits, res.balance
                )?;
            }
            Action::StyleList(category_id) => {
                let styles = self.account.styles(category_id).await?;
                for style in styles {
                    writeln!(
                        out,
                        "- ({}) {}: {} credits",
                        style.id, style.name, style.credits_cost
                    )?;
                }
            }
            Action::CategoryList() => {
                for category in self.account.categories().await? {
                    writeln!(out, "- ({}) {}", category.id, category.name)?;
                }
            }
        }

        return Ok(());
    }

    async fn watch<W: Write + Send>(&self, tab: PortfolioTab, out: &mut W) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<PollEvent>();
        let view = PortfolioView::new(self.artworks.clone(), tab, self.poll_interval, Some(tx));
        view.load(true).await?;
        // Older pages may still hold generations.
        while view.portfolio().has_more() {
            if view.load(false).await? == 0 {
                break;
            }
        }

        for artwork in view.portfolio().artworks() {
            writeln!(out, "{}", format_artwork(&artwork))?;
        }
        if view.poller().phase() == PollerPhase::Idle {
            writeln!(out, "Nothing is generating.")?;
            return Ok(());
        }

        writeln!(
            out,
            "Watching {} generating artworks, Ctrl+C to stop.",
            view.poller().tracked().len()
        )?;

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(PollEvent::Idle()) | None => {
                        writeln!(out, "{}", format_event(&PollEvent::Idle()))?;
                        break;
                    }
                    Some(event) => writeln!(out, "{}", format_event(&event))?,
                },
                _ = time::sleep(self.poll_interval) => {
                    if self.session.token().is_none() {
                        view.hide();
                        writeln!(out, "Session ended, stopped watching.")?;
                        break;
                    }
                }
                _ = signal::ctrl_c() => {
                    view.hide();
                    writeln!(out, "Stopped watching.")?;
                    break;
                }
            }
        }

        return Ok(());
    }
}
