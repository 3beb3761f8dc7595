pub mod config;
mod error;
pub mod extract;
pub mod fetch;
pub mod identity;
pub mod pipeline;
pub mod resolve;
pub mod scrape;
pub mod store;
pub mod worker;

pub use error::{EngineError, Result};
