#[cfg(test)]
pub mod recording;
pub mod terminal;

use std::sync::Arc;

use crate::domain::models::Navigator;

pub type NavigatorBox = Arc<dyn Navigator + Send + Sync>;
