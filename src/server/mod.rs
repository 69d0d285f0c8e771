//! HTTP server for Gatehouse

pub mod http;

pub use http::{route, run, AppState, StoreBackend};
