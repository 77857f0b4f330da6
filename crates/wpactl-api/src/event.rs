// ── Unsolicited daemon notifications ──

use std::fmt;

/// Prefix the daemon puts on every unsolicited message (`<3>CTRL-EVENT-…`).
pub const EVENT_MARKER: char = '<';

pub const SCAN_RESULTS_READY: &str = "CTRL-EVENT-SCAN-RESULTS";
pub const SCAN_FAILED: &str = "CTRL-EVENT-SCAN-FAILED";
pub const NETWORK_NOT_FOUND: &str = "CTRL-EVENT-NETWORK-NOT-FOUND";
pub const AUTH_REJECT: &str = "CTRL-EVENT-AUTH-REJECT";
pub const CONNECTED: &str = "CTRL-EVENT-CONNECTED";
pub const DISCONNECTED: &str = "CTRL-EVENT-DISCONNECTED";
pub const ASSOC_REJECT: &str = "CTRL-EVENT-ASSOC-REJECT";

/// A single asynchronous notification.
///
/// `name` is the first token after the marker and priority level, e.g.
/// `CTRL-EVENT-CONNECTED`; `payload` is everything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub payload: String,
}

impl Event {
    /// Parse a raw message into an event.
    ///
    /// Strips the `<N>` priority prefix when present. Returns `None` for
    /// messages with no name token.
    pub fn parse(message: &str) -> Option<Self> {
        let body = match message.strip_prefix(EVENT_MARKER) {
            Some(rest) => rest.split_once('>').map_or(rest, |(_, tail)| tail),
            None => message,
        };
        let body = body.trim();
        let (name, payload) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_owned(),
            payload: payload.trim_start().to_owned(),
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.payload.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.payload)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_priority_prefixed_event() {
        let event =
            Event::parse("<3>CTRL-EVENT-CONNECTED - Connection to 00:11:22:33:44:55 completed")
                .unwrap();
        assert_eq!(event.name, CONNECTED);
        assert_eq!(event.payload, "- Connection to 00:11:22:33:44:55 completed");
    }

    #[test]
    fn parses_event_without_payload() {
        let event = Event::parse("<2>CTRL-EVENT-SCAN-RESULTS \n").unwrap();
        assert_eq!(event.name, SCAN_RESULTS_READY);
        assert!(event.payload.is_empty());
    }

    #[test]
    fn parses_unmarked_message() {
        let event = Event::parse("WPS-AP-AVAILABLE").unwrap();
        assert_eq!(event.name, "WPS-AP-AVAILABLE");
    }

    #[test]
    fn marker_without_level_close_keeps_body() {
        let event = Event::parse("<CTRL-EVENT-SCAN-FAILED ret=-16").unwrap();
        assert_eq!(event.name, "CTRL-EVENT-SCAN-FAILED");
        assert_eq!(event.payload, "ret=-16");
    }

    #[test]
    fn empty_message_is_not_an_event() {
        assert!(Event::parse("").is_none());
        assert!(Event::parse("<3>   ").is_none());
    }

    #[test]
    fn display_round_trips_name_and_payload() {
        let event = Event::parse("<3>CTRL-EVENT-ASSOC-REJECT status_code=1").unwrap();
        assert_eq!(event.to_string(), "CTRL-EVENT-ASSOC-REJECT status_code=1");
    }
}
