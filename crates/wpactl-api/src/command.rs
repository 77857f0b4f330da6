// ── Control-socket wire vocabulary ──
//
// Verbs and reply tokens must match the daemon byte for byte.

pub const STATUS: &str = "STATUS";
pub const PING: &str = "PING";
pub const ATTACH: &str = "ATTACH";
pub const DETACH: &str = "DETACH";

pub const SCAN: &str = "SCAN";
pub const SCAN_RESULTS: &str = "SCAN_RESULTS";

pub const LIST_NETWORKS: &str = "LIST_NETWORKS";
pub const ADD_NETWORK: &str = "ADD_NETWORK";
pub const SET_NETWORK: &str = "SET_NETWORK";
pub const GET_NETWORK: &str = "GET_NETWORK";
pub const ENABLE_NETWORK: &str = "ENABLE_NETWORK";
pub const DISABLE_NETWORK: &str = "DISABLE_NETWORK";
pub const SELECT_NETWORK: &str = "SELECT_NETWORK";
pub const REMOVE_NETWORK: &str = "REMOVE_NETWORK";

pub const SAVE_CONFIG: &str = "SAVE_CONFIG";
pub const RECONFIGURE: &str = "RECONFIGURE";
pub const DISCONNECT: &str = "DISCONNECT";

/// Reply token for a successful boolean command (compared case-insensitively).
pub const REPLY_OK: &str = "OK";
/// Reply token the daemon uses for a failed command.
pub const REPLY_FAIL: &str = "FAIL";
/// Reply to [`PING`].
pub const REPLY_PONG: &str = "PONG";

/// Join command parts into a single wire message.
pub(crate) fn encode(parts: &[&str]) -> String {
    parts.join(" ")
}

/// The verb of a command, used in errors and logs instead of the full
/// message so attribute values (passphrases) never leak.
pub(crate) fn verb<'a>(parts: &[&'a str]) -> &'a str {
    parts.first().copied().unwrap_or_default()
}
