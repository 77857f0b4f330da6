// ── Scan result domain type ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// One access point seen by the latest scan. Transient: never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub bssid: MacAddress,
    pub ssid: String,
    /// Channel frequency in MHz.
    pub frequency: i32,
    /// Signal level in dBm (or the driver's relative scale).
    pub signal_level: i32,
    pub flags: BTreeSet<String>,
}

impl AccessPoint {
    /// `true` if any advertised capability mentions WPA/RSN/WEP.
    pub fn is_secured(&self) -> bool {
        self.flags
            .iter()
            .any(|f| f.starts_with("WPA") || f.starts_with("RSN") || f == "WEP")
    }
}
