pub mod caching;
pub mod janice;
pub mod pushx;

pub use caching::{CachingAppraisalProvider, CachingFreightProvider};
pub use janice::JaniceProvider;
pub use pushx::PushXProvider;
