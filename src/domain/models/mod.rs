mod account;
mod action;
mod artwork;
mod error;
mod event;
mod navigator;
mod order;
mod paging;
mod session;
mod source;
mod storage;

pub use account::*;
pub use action::*;
pub use artwork::*;
pub use error::*;
pub use event::*;
pub use navigator::*;
pub use order::*;
pub use paging::*;
pub use session::*;
pub use source::*;
pub use storage::*;
