// Scripted control-socket peer for client tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::{Arc, Mutex};

use tokio::net::UnixDatagram;
use tokio::task::JoinHandle;

use wpactl_core::{Client, ClientConfig};

pub const NETWORK_HEADER: &str = "network id / ssid / bssid / flags";
pub const SCAN_HEADER: &str = "bssid / frequency / signal level / flags / ssid";

/// Peer end of a client under test. Every received command is logged;
/// the handler returns the messages to send back, reply first, then any
/// events.
pub struct FakeDaemon {
    commands: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeDaemon {
    pub fn start<F>(config: ClientConfig, mut handler: F) -> (Client, Self)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        let (client_socket, daemon_socket) = UnixDatagram::pair().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&commands);

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            while let Ok(len) = daemon_socket.recv(&mut buf).await {
                let command = String::from_utf8_lossy(&buf[..len]).into_owned();
                log.lock().unwrap().push(command.clone());
                for message in handler(&command) {
                    if daemon_socket.send(message.as_bytes()).await.is_err() {
                        return;
                    }
                }
            }
        });

        (Client::open(client_socket, config), Self { commands, task })
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// `true` if any received command starts with `verb`.
    pub fn received(&self, verb: &str) -> bool {
        self.commands()
            .iter()
            .any(|c| c.split(' ').next() == Some(verb))
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ── Canned replies ──────────────────────────────────────────────────

pub fn reply(text: &str) -> Vec<String> {
    vec![text.to_owned()]
}

pub fn ok() -> Vec<String> {
    reply("OK\n")
}

pub fn fail() -> Vec<String> {
    reply("FAIL\n")
}

/// `OK` followed by an unsolicited event.
pub fn ok_then_event(event: &str) -> Vec<String> {
    vec!["OK\n".to_owned(), format!("<3>{event}")]
}

/// A `LIST_NETWORKS` reply from `(id, ssid, flags)` rows.
pub fn network_list(rows: &[(i32, &str, &str)]) -> Vec<String> {
    let mut text = format!("{NETWORK_HEADER}\n");
    for (id, ssid, flags) in rows {
        text.push_str(&format!("{id}\t{ssid}\tany\t{flags}\n"));
    }
    vec![text]
}
