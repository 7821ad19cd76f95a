#[cfg(test)]
#[path = "portfolio_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use tokio::sync::mpsc;

use super::GenerationPoller;
use crate::domain::models::Artwork;
use crate::domain::models::ArtworkId;
use crate::domain::models::ArtworkProgress;
use crate::domain::models::ArtworkQuery;
use crate::domain::models::ArtworkStatus;
use crate::domain::models::GatewayError;
use crate::domain::models::PollEvent;
use crate::domain::models::PortfolioTab;
use crate::infrastructure::api::ArtworkSourceBox;

struct Page {
    artworks: Vec<Artwork>,
    tab: PortfolioTab,
    limit: usize,
    skip: usize,
    no_more_data: bool,
    loading: bool,
    generation: u64,
    hidden: bool,
}

/// A reserved page request. Its answer only counts while the portfolio is
/// still on the generation it was issued for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub query: ArtworkQuery,
    generation: u64,
}

/// The artworks a view is currently showing. Shared between the view and
/// the poller, which is the only thing that moves statuses forward.
pub struct Portfolio {
    page: Mutex<Page>,
}

impl Portfolio {
    pub fn new(tab: PortfolioTab, limit: usize) -> Portfolio {
        return Portfolio {
            page: Mutex::new(Page {
                artworks: vec![],
                tab,
                limit,
                skip: 0,
                no_more_data: false,
                loading: false,
                generation: 0,
                hidden: false,
            }),
        };
    }

    #[cfg(test)]
    pub fn with_artworks(artworks: Vec<Artwork>) -> Portfolio {
        let portfolio = Portfolio::new(PortfolioTab::All, ArtworkQuery::default().limit);
        portfolio.page().artworks = artworks;
        return portfolio;
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        return self.page.lock().unwrap_or_else(|e| return e.into_inner());
    }

    pub fn artworks(&self) -> Vec<Artwork> {
        return self.page().artworks.clone();
    }

    pub fn get(&self, id: &str) -> Option<Artwork> {
        return self
            .page()
            .artworks
            .iter()
            .find(|artwork| return artwork.id == id)
            .cloned();
    }

    pub fn status_of(&self, id: &str) -> Option<ArtworkStatus> {
        return self.get(id).map(|artwork| return artwork.status);
    }

    pub fn processing_ids(&self) -> Vec<ArtworkId> {
        return self
            .page()
            .artworks
            .iter()
            .filter(|artwork| return artwork.is_processing())
            .map(|artwork| return artwork.id.clone())
            .collect();
    }

    #[cfg(test)]
    pub fn tab(&self) -> PortfolioTab {
        return self.page().tab;
    }

    pub fn has_more(&self) -> bool {
        return !self.page().no_more_data;
    }

    /// Folds a report into the matching artwork. None when the artwork is no
    /// longer shown, otherwise whether it is now terminal.
    pub fn apply(&self, id: &str, report: &ArtworkProgress) -> Option<bool> {
        let mut page = self.page();
        let artwork = page.artworks.iter_mut().find(|artwork| return artwork.id == id)?;
        return Some(artwork.apply(report));
    }

    #[cfg(test)]
    pub fn remove(&self, id: &str) -> Option<Artwork> {
        let mut page = self.page();
        let idx = page.artworks.iter().position(|artwork| return artwork.id == id)?;
        return Some(page.artworks.remove(idx));
    }

    /// Reserves the next page. None while hidden, while a load is running,
    /// or when the end was reached and this is not a refresh.
    pub fn next_query(&self, refresh: bool) -> Option<PageTicket> {
        let mut page = self.page();
        if page.hidden || page.loading || (!refresh && page.no_more_data) {
            return None;
        }

        page.loading = true;
        let skip = if refresh { 0 } else { page.skip };
        return Some(PageTicket {
            query: ArtworkQuery {
                skip,
                limit: page.limit,
                tab: page.tab,
            },
            generation: page.generation,
        });
    }

    /// Stores an answered page. False when the ticket is from an earlier
    /// generation, in which case nothing changes.
    pub fn receive(&self, ticket: &PageTicket, artworks: Vec<Artwork>) -> bool {
        let mut page = self.page();
        if ticket.generation != page.generation {
            return false;
        }

        page.loading = false;
        if ticket.query.skip == 0 {
            page.artworks.clear();
        }

        page.no_more_data = artworks.len() < ticket.query.limit;
        page.skip = ticket.query.skip + artworks.len();
        page.artworks.extend(artworks);
        return true;
    }

    pub fn load_failed(&self, ticket: &PageTicket) -> bool {
        let mut page = self.page();
        if ticket.generation != page.generation {
            return false;
        }

        page.loading = false;
        return true;
    }

    /// Starts over on another tab. Pages still in flight for the old tab
    /// are dropped when they arrive.
    pub fn switch_tab(&self, tab: PortfolioTab) {
        let mut page = self.page();
        page.generation += 1;
        page.loading = false;
        page.tab = tab;
        page.skip = 0;
        page.no_more_data = false;
        page.artworks.clear();
    }

    pub fn hide(&self) {
        let mut page = self.page();
        page.generation += 1;
        page.loading = false;
        page.hidden = true;
    }

    pub fn show(&self) {
        self.page().hidden = false;
    }
}

/// A portfolio screen: pages artworks in and keeps the generating ones
/// polled for as long as it is shown.
pub struct PortfolioView {
    portfolio: Arc<Portfolio>,
    source: ArtworkSourceBox,
    poller: GenerationPoller,
}

impl PortfolioView {
    pub fn new(
        source: ArtworkSourceBox,
        tab: PortfolioTab,
        poll_interval: Duration,
        events: Option<mpsc::UnboundedSender<PollEvent>>,
    ) -> PortfolioView {
        let portfolio = Arc::new(Portfolio::new(tab, ArtworkQuery::default().limit));
        let poller = GenerationPoller::new(
            source.clone(),
            portfolio.clone(),
            poll_interval,
            events,
        );

        return PortfolioView {
            portfolio,
            source,
            poller,
        };
    }

    pub fn portfolio(&self) -> &Arc<Portfolio> {
        return &self.portfolio;
    }

    pub fn poller(&self) -> &GenerationPoller {
        return &self.poller;
    }

    /// Loads the first page again, or the next one. Returns how many
    /// artworks arrived, zero when nothing was loaded.
    pub async fn load(&self, refresh: bool) -> Result<usize, GatewayError> {
        let ticket = match self.portfolio.next_query(refresh) {
            Some(ticket) => ticket,
            None => return Ok(0),
        };
        let query = &ticket.query;

        let artworks = match self.source.list(query).await {
            Ok(artworks) => artworks,
            Err(err) => {
                if !self.portfolio.load_failed(&ticket) {
                    return Ok(0);
                }
                return Err(err);
            }
        };

        let count = artworks.len();
        if !self.portfolio.receive(&ticket, artworks) {
            tracing::debug!(skip = query.skip, tab = %query.tab, "Dropped a page the view moved away from");
            return Ok(0);
        }
        self.track_processing();

        tracing::debug!(skip = query.skip, count = count, tab = %query.tab, "Portfolio page loaded");
        return Ok(count);
    }

    pub async fn switch_tab(&self, tab: PortfolioTab) -> Result<usize, GatewayError> {
        self.portfolio.switch_tab(tab);
        self.poller.teardown();
        return self.load(true).await;
    }

    /// The view is gone. Polling stops and late pages are ignored until
    /// `resume`.
    pub fn hide(&self) {
        self.portfolio.hide();
        self.poller.teardown();
    }

    pub async fn resume(&self) -> Result<usize, GatewayError> {
        self.portfolio.show();
        return self.load(true).await;
    }

    fn track_processing(&self) {
        for id in self.portfolio.processing_ids() {
            self.poller.register(&id);
        }
    }
}
