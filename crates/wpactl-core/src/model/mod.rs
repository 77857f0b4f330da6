// ── Domain model ──
//
// Canonical representations of what the daemon reports: stored network
// profiles, scan results, and status snapshots.

pub mod access_point;
pub mod mac;
pub mod network;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

pub use access_point::AccessPoint;
pub use mac::{InvalidMacAddress, MacAddress};
pub use network::{FLAG_CURRENT, FLAG_DISABLED, Network, NetworkList};
pub use state::State;
