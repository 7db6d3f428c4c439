pub mod config;
pub mod gemini;
pub mod generation;
pub mod models;
pub mod routes;

pub use config::Config;
pub use routes::{router, AppState};
