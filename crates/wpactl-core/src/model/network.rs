// ── Network profile domain types ──

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Flag the daemon sets on profiles it will not auto-connect to.
pub const FLAG_DISABLED: &str = "DISABLED";
/// Flag on the profile currently in use.
pub const FLAG_CURRENT: &str = "CURRENT";

/// A stored network configuration known (or about to be known) to the daemon.
///
/// `id` is assigned by the daemon and only stable for the lifetime of the
/// daemon process. `id_str` is a caller-chosen alias used to find the same
/// profile again after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: i32,
    pub id_str: String,
    pub ssid: String,
    pub bssid: String,
    pub flags: BTreeSet<String>,
    /// Set once the daemon is confirmed to hold this profile.
    pub known: bool,
    /// Extra `SET_NETWORK` fields, stored in wire form (quoted where the
    /// daemon expects a string, e.g. `psk` → `"\"secret\""`).
    pub attributes: BTreeMap<String, String>,
}

impl Network {
    /// Candidate profile for `ssid`. A non-empty `psk` configures WPA-PSK,
    /// an empty one an open network.
    pub fn new(ssid: impl Into<String>, psk: &str) -> Self {
        let mut network = Self {
            ssid: ssid.into(),
            ..Self::default()
        };
        if psk.is_empty() {
            network.attributes.insert("key_mgmt".into(), "NONE".into());
        } else {
            network.attributes.insert("psk".into(), quote(psk));
        }
        network
    }

    pub fn with_id_str(mut self, id_str: impl Into<String>) -> Self {
        self.id_str = id_str.into();
        self
    }

    /// Add or replace a raw `SET_NETWORK` field.
    pub fn with_attribute(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(FLAG_DISABLED)
    }

    pub fn is_current(&self) -> bool {
        self.flags.contains(FLAG_CURRENT)
    }

    /// Every settable field as `(field, wire value)`, in the order they are
    /// written: `ssid` and `id_str` (each when set), then `attributes` by
    /// key. An empty SSID leaves the stored one untouched.
    pub fn settable_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if !self.ssid.is_empty() {
            fields.push(("ssid".to_owned(), quote(&self.ssid)));
        }
        if !self.id_str.is_empty() {
            fields.push(("id_str".to_owned(), quote(&self.id_str)));
        }
        fields.extend(
            self.attributes
                .iter()
                .filter(|(field, _)| !matches!(field.as_str(), "ssid" | "id_str"))
                .map(|(field, value)| (field.clone(), value.clone())),
        );
        fields
    }
}

/// Wrap a value in double quotes, the daemon's string syntax.
pub fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

/// Strip the daemon's string quoting.
pub fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

/// Lookup helpers over a listing.
pub trait NetworkList {
    fn find_by_id_str(&self, id_str: &str) -> Option<&Network>;
    fn find_by_ssid(&self, ssid: &str) -> Option<&Network>;
}

impl NetworkList for [Network] {
    fn find_by_id_str(&self, id_str: &str) -> Option<&Network> {
        self.iter().find(|n| n.id_str == id_str)
    }

    fn find_by_ssid(&self, ssid: &str) -> Option<&Network> {
        self.iter().find(|n| n.ssid == ssid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_with_psk_quotes_passphrase() {
        let net = Network::new("home", "secret");
        assert_eq!(net.attributes.get("psk").map(String::as_str), Some("\"secret\""));
        assert!(!net.attributes.contains_key("key_mgmt"));
        assert!(!net.known);
    }

    #[test]
    fn new_without_psk_is_open() {
        let net = Network::new("cafe", "");
        assert_eq!(net.attributes.get("key_mgmt").map(String::as_str), Some("NONE"));
    }

    #[test]
    fn settable_fields_order() {
        let net = Network::new("home", "secret")
            .with_id_str("home-alias")
            .with_attribute("scan_ssid", "1");

        assert_eq!(
            net.settable_fields(),
            vec![
                ("ssid".to_owned(), "\"home\"".to_owned()),
                ("id_str".to_owned(), "\"home-alias\"".to_owned()),
                ("psk".to_owned(), "\"secret\"".to_owned()),
                ("scan_ssid".to_owned(), "1".to_owned()),
            ]
        );
    }

    #[test]
    fn settable_fields_skip_empty_alias_and_shadowed_keys() {
        let net = Network::new("home", "").with_attribute("ssid", "\"other\"");
        let fields = net.settable_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("ssid".to_owned(), "\"home\"".to_owned()));
    }

    #[test]
    fn settable_fields_skip_empty_ssid() {
        let net = Network::default()
            .with_id_str("work")
            .with_attribute("priority", "5");

        assert_eq!(
            net.settable_fields(),
            vec![
                ("id_str".to_owned(), "\"work\"".to_owned()),
                ("priority".to_owned(), "5".to_owned()),
            ]
        );
    }

    #[test]
    fn disabled_flag() {
        let mut net = Network::default();
        assert!(!net.is_disabled());
        net.flags.insert(FLAG_DISABLED.into());
        assert!(net.is_disabled());
    }

    #[test]
    fn list_lookups() {
        let nets = vec![
            Network {
                id: 0,
                ssid: "home".into(),
                id_str: "h".into(),
                ..Network::default()
            },
            Network {
                id: 1,
                ssid: "work".into(),
                ..Network::default()
            },
        ];
        assert_eq!(nets.find_by_ssid("work").map(|n| n.id), Some(1));
        assert_eq!(nets.find_by_id_str("h").map(|n| n.id), Some(0));
        assert!(nets.find_by_ssid("cafe").is_none());
    }

    #[test]
    fn unquote_strips_quotes() {
        assert_eq!(unquote("\"alias\""), "alias");
        assert_eq!(unquote("bare"), "bare");
    }
}
