// ── Hardware address ──
//
// Scan results carry the BSSID as text. Rows whose address does not
// parse are noise from the radio environment and get dropped, so unlike
// a free-form string this type validates on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A 6-octet MAC address, normalized to lowercase colon-separated format
/// (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hardware address: {0:?}")]
pub struct InvalidMacAddress(pub String);

impl MacAddress {
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Parse from colon- or dash-separated octets (`AA-BB-CC-DD-EE-FF`)
    /// or dot-separated groups of four digits (`aabb.ccdd.eeff`).
    pub fn parse(raw: &str) -> Result<Self, InvalidMacAddress> {
        let invalid = || InvalidMacAddress(raw.to_owned());

        let (separator, group_len) = if raw.contains('.') {
            ('.', 4)
        } else if raw.contains('-') {
            ('-', 2)
        } else {
            (':', 2)
        };

        let mut digits = String::with_capacity(12);
        for part in raw.split(separator) {
            if part.len() != group_len || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            digits.push_str(part);
        }
        if digits.len() != 12 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, pair) in octets.iter_mut().zip(digits.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
            *octet = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Self(octets))
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = InvalidMacAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_normalizes_dashes() {
        let mac = MacAddress::parse("AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_address_normalizes_case() {
        let mac: MacAddress = "AA:BB:CC:0D:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:0d:ee:ff");
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0x0d, 0xee, 0xff]);
    }

    #[test]
    fn mac_address_accepts_dotted_groups() {
        let mac = MacAddress::parse("0011.2233.44AA").unwrap();
        assert_eq!(mac.to_string(), "00:11:22:33:44:aa");
    }

    #[test]
    fn mac_address_rejects_garbage() {
        for raw in [
            "",
            "any",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:ff:00",
            "aa:bb:cc:dd:ee:gg",
            "a:bb:cc:dd:ee:ff",
            "aa:bb-cc:dd:ee:ff",
            "0011.2233",
            "0011.2233.4455.6677",
            "011.2233.44556",
            "0011:2233.4455",
        ] {
            assert!(MacAddress::parse(raw).is_err(), "{raw:?} should not parse");
        }
    }
}
