use thiserror::Error;

/// Top-level error type for the `wpactl-api` crate.
///
/// Covers every failure mode of the control socket: transport I/O,
/// session closure, undecodable replies, and explicit daemon rejections.
/// `wpactl-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Socket I/O failed while sending a command.
    #[error("Control socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session was closed (explicitly, or because the reader stopped)
    /// before a reply arrived.
    #[error("Control session closed")]
    Closed,

    // ── Replies ─────────────────────────────────────────────────────
    /// A reply arrived but could not be decoded in the expected shape.
    #[error("Unexpected reply to {command}: {reason} (got {reply:?})")]
    Protocol {
        command: String,
        reply: String,
        reason: String,
    },

    /// The daemon answered a boolean command with something other than `OK`.
    #[error("{command} rejected by daemon: {reply:?}")]
    Rejected { command: String, reply: String },
}

impl Error {
    /// Returns `true` if the session can no longer carry commands.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Closed)
    }

    /// Returns `true` if the daemon explicitly refused the command.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
