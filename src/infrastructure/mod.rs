pub mod api;
pub mod gateway;
pub mod navigators;
pub mod storage;
