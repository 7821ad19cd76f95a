pub mod account;
pub mod artworks;
pub mod orders;
#[cfg(test)]
pub mod scripted;

use std::sync::Arc;

use crate::domain::models::ArtworkSource;
use crate::domain::models::OrderSource;

pub type ArtworkSourceBox = Arc<dyn ArtworkSource + Send + Sync>;
pub type OrderSourceBox = Arc<dyn OrderSource + Send + Sync>;
