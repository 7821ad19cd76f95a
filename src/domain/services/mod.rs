pub mod actions;
mod payments;
mod poller;
mod portfolio;
mod session_manager;

pub use payments::*;
pub use poller::*;
pub use portfolio::*;
pub use session_manager::*;
