// wpactl-core: Network profile, scan and connect workflows on top of wpactl-api.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod parse;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::Client;
pub use config::ClientConfig;
pub use error::CoreError;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessPoint, FLAG_CURRENT, FLAG_DISABLED, InvalidMacAddress, MacAddress, Network,
    NetworkList, State,
};

// Transport-level types callers need alongside the client.
pub use wpactl_api::{Event, Session, SessionConfig, Subscription};
