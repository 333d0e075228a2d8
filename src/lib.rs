//!
//! Asynchronous client for the Online Game Protocol (OGP).
//!
//! The `rogp` crate retrieves game server information like server metadata, team and player
//! lists, rules, add-ons and limits over UDP.

pub mod color;
pub mod dns;
pub mod errors;
pub mod models;
pub use models::*;
pub mod protocols;

pub use protocols::ogp::{Config, Phase, Sections, Session};

use errors::Result;
use std::time::Duration;

/// Queries a single server with the default configuration and the given total timeout.
pub async fn query(host: &str, port: u16, timeout: Duration) -> Result<Status> {
    let config = Config {
        timeout,
        read_timeout: timeout.min(Config::default().read_timeout),
        ..Default::default()
    };

    Session::new((host, port), config).query_status().await
}
