// ── Runtime client configuration ──
//
// These types describe *how* the client drives the daemon. They never
// touch disk: wpactl-config (or the embedding application) builds a
// `ClientConfig` and hands it in.

use std::time::Duration;

use wpactl_api::SessionConfig;

/// Configuration for a single [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a scan waits for a results/failed event before fetching
    /// whatever the daemon has. Default: 2s.
    pub scan_timeout: Duration,

    /// Upper bound on waiting for a connect outcome event.
    /// `None` waits until the daemon reports one (or the session closes).
    pub connect_timeout: Option<Duration>,

    /// Session tuning (event buffer per subscription, message size).
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(2),
            connect_timeout: None,
            session: SessionConfig::default(),
        }
    }
}
