// ── Core error types ──
//
// User-facing errors from wpactl-core. Consumers never see raw socket
// errors directly: the `From<wpactl_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Control socket failure: {reason}")]
    Transport { reason: String },

    #[error("Daemon session closed")]
    DaemonDisconnected,

    // ── Reply errors ─────────────────────────────────────────────────
    #[error("Unexpected daemon reply: {message}")]
    Protocol { message: String },

    #[error("{command} rejected by daemon: {reply}")]
    CommandRejected { command: String, reply: String },

    #[error("Malformed network list: {message}")]
    Parse { message: String },

    // ── Scan outcome ─────────────────────────────────────────────────
    #[error("Scan failed")]
    ScanFailed,

    // ── Connect outcomes ─────────────────────────────────────────────
    #[error("SSID not found")]
    SsidNotFound,

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Disconnected while connecting")]
    Disconnected,

    #[error("Association rejected")]
    AssocRejected,

    #[error("Unexpected event while connecting: {name}")]
    UnexpectedEvent { name: String },

    #[error("No connection outcome after {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },

    // ── Profile errors ───────────────────────────────────────────────
    #[error("Network has no id_str to identify it")]
    NoIdentifier,

    /// A set-command failed part way through writing a profile. Attributes
    /// applied before `field` stay applied on the daemon.
    #[error("Network {id} left partially configured: setting {field} failed")]
    ProfileIncomplete {
        id: i32,
        field: String,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Returns `true` for the named outcome errors of a connect attempt.
    pub fn is_connect_outcome(&self) -> bool {
        matches!(
            self,
            Self::SsidNotFound
                | Self::AuthFailed
                | Self::Disconnected
                | Self::AssocRejected
                | Self::UnexpectedEvent { .. }
                | Self::ConnectTimeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wpactl_api::Error> for CoreError {
    fn from(err: wpactl_api::Error) -> Self {
        match err {
            wpactl_api::Error::Io(e) => CoreError::Transport {
                reason: e.to_string(),
            },
            wpactl_api::Error::Closed => CoreError::DaemonDisconnected,
            wpactl_api::Error::Protocol {
                command,
                reply,
                reason,
            } => CoreError::Protocol {
                message: format!("{command}: {reason} (got {reply:?})"),
            },
            wpactl_api::Error::Rejected { command, reply } => {
                CoreError::CommandRejected { command, reply }
            }
        }
    }
}
