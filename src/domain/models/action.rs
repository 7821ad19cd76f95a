use super::ArtworkId;
use super::ArtworkQuery;
use super::Credentials;
use super::GalleryQuery;
use super::NewArtwork;
use super::Paging;
use super::PortfolioTab;
use super::Publication;

/// A client operation requested from the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Login(Credentials),
    Logout(),
    WhoAmI(),
    ArtworkList(ArtworkQuery),
    ArtworkShow(ArtworkId),
    ArtworkProgress(ArtworkId),
    ArtworkCreate(NewArtwork),
    ArtworkPublish(ArtworkId, Publication),
    ArtworkDelete(ArtworkId),
    ArtworkWatch(PortfolioTab),
    GalleryList(GalleryQuery),
    /// Shows a public artwork and counts the view.
    GalleryOpen(ArtworkId),
    OrderStatus(i64),
    OrderList(Paging),
    ProductList(),
    Credits(),
    CreditHistory(Paging),
    CardActivate(String),
    StyleList(Option<i64>),
    CategoryList(),
}

impl Action {
    /// The screen an action belongs to, used to decide whether it needs a
    /// session and where to return after login.
    pub fn page(&self) -> &'static str {
        match self {
            Action::Login(_) | Action::Logout() => return "/pages/login/login",
            Action::WhoAmI() => return "/pages/profile/profile",
            Action::ArtworkList(_) | Action::ArtworkWatch(_) => return "/pages/portfolio/portfolio",
            Action::ArtworkShow(_)
            | Action::ArtworkProgress(_)
            | Action::ArtworkPublish(..)
            | Action::ArtworkDelete(_) => return "/pages/portfolio/portfolio",
            Action::ArtworkCreate(_) => return "/pages/create/create",
            Action::GalleryList(_) | Action::GalleryOpen(_) => return "/pages/gallery/gallery",
            Action::OrderStatus(_) | Action::Credits() | Action::CardActivate(_) => {
                return "/pages/credits/credits"
            }
            Action::OrderList(_) | Action::ProductList() | Action::CreditHistory(_) => {
                return "/pages/profile/profile"
            }
            Action::StyleList(_) | Action::CategoryList() => return "/pages/styles/styles",
        }
    }
}
