pub mod aggregator;
pub mod app_state;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod resolver;
pub mod sources;
pub mod stations;

pub use app_state::{AppState, RadioList};
pub use http::build_router;
