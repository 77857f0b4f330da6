// ── Reply decoders ──
//
// Stateless conversions from the daemon's text replies into domain types.
// Network listings come from the daemon's own storage and are trusted:
// any malformed record fails the whole listing. Scan listings reflect the
// radio environment and routinely contain junk: malformed records are
// skipped.

use std::collections::BTreeSet;

use tracing::trace;

use crate::error::CoreError;
use crate::model::{AccessPoint, MacAddress, Network, State};

const NETWORK_FIELDS: usize = 4;
const SCAN_FIELDS: usize = 5;

/// Records after the header line, blank lines removed.
fn records(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .skip(1)
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
}

/// Decode a `[F1][F2]…` flag list. An empty string is an empty set.
pub fn parse_flags(raw: &str) -> BTreeSet<String> {
    let inner = raw.strip_prefix('[').unwrap_or(raw);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    if inner.is_empty() {
        return BTreeSet::new();
    }
    inner.split("][").map(str::to_owned).collect()
}

/// Decode a `LIST_NETWORKS` reply: header, then `id\tssid\tbssid\tflags`.
pub fn parse_networks(text: &str) -> Result<Vec<Network>, CoreError> {
    records(text)
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            let fields: Vec<&str> = record.split('\t').collect();
            let [id, ssid, bssid, flags] = fields[..] else {
                return Err(CoreError::Parse {
                    message: format!(
                        "record {row}: expected {NETWORK_FIELDS} fields, found {}",
                        fields.len()
                    ),
                });
            };
            let id = id.parse::<i32>().map_err(|e| CoreError::Parse {
                message: format!("record {row}: network id {id:?}: {e}"),
            })?;

            Ok(Network {
                id,
                ssid: ssid.to_owned(),
                bssid: bssid.to_owned(),
                flags: parse_flags(flags),
                ..Network::default()
            })
        })
        .collect()
}

/// Decode a `SCAN_RESULTS` reply: header, then
/// `bssid\tfrequency\tsignal\tflags\tssid`. Malformed records are skipped.
pub fn parse_access_points(text: &str) -> Vec<AccessPoint> {
    records(text).filter_map(parse_access_point).collect()
}

fn parse_access_point(record: &str) -> Option<AccessPoint> {
    let fields: Vec<&str> = record.split('\t').collect();
    let [bssid, frequency, signal, flags, ssid] = fields[..] else {
        trace!(fields = fields.len(), expected = SCAN_FIELDS, "skipping scan record");
        return None;
    };

    let bssid = MacAddress::parse(bssid)
        .inspect_err(|e| trace!(error = %e, "skipping scan record"))
        .ok()?;
    let frequency = frequency
        .parse()
        .inspect_err(|e| trace!(error = %e, "skipping scan record: frequency"))
        .ok()?;
    let signal_level = signal
        .parse()
        .inspect_err(|e| trace!(error = %e, "skipping scan record: signal"))
        .ok()?;

    Some(AccessPoint {
        bssid,
        ssid: ssid.to_owned(),
        frequency,
        signal_level,
        flags: parse_flags(flags),
    })
}

/// Decode a `STATUS` reply of `key=value` lines.
pub fn parse_status(text: &str) -> State {
    let mut state = State::default();

    for (key, value) in text.lines().filter_map(|line| line.split_once('=')) {
        let value = value.trim_end_matches('\r').to_owned();
        match key {
            "id" => state.id = value,
            "bssid" => state.bssid = value,
            "ssid" => state.ssid = value,
            "freq" => state.frequency = value,
            "mode" => state.mode = value,
            "key_mgmt" => state.key_mgmt = value,
            "wpa_state" => state.wpa_state = value,
            "ip_address" => state.ip_address = value,
            "address" => state.address = value,
            other => {
                state.extra.insert(other.to_owned(), value);
            }
        }
    }

    state
}

// ── Tests ────────────────────────────────────────────────────────────
