pub mod board;
mod client;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod request_context;
pub mod telemetry;
pub mod token;
pub mod types;

pub use board::Board;
pub use client::ForumClient;
pub use config::Config;
pub use dispatcher::{ApiRequest, Dispatcher};
pub use errors::Error;
pub use request_context::RequestDispatchContext;
pub use token::{RefreshCoordinator, SessionPolicy, SessionStatus, TokenPair, TokenStore};

#[cfg(test)]
mod tests;
