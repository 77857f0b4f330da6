// ── Status snapshot ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point-in-time `STATUS` read. Not cached; every call asks the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Id of the selected network, empty when none is selected.
    pub id: String,
    pub bssid: String,
    pub ssid: String,
    pub frequency: String,
    pub mode: String,
    pub key_mgmt: String,
    /// Supplicant state machine position, e.g. `COMPLETED`, `SCANNING`.
    pub wpa_state: String,
    pub ip_address: String,
    /// Our own interface address.
    pub address: String,
    /// Every other key the daemon reported.
    pub extra: BTreeMap<String, String>,
}

impl State {
    pub fn is_completed(&self) -> bool {
        self.wpa_state == "COMPLETED"
    }

    /// Numeric id of the selected network, if any.
    pub fn network_id(&self) -> Option<i32> {
        self.id.parse().ok()
    }
}
