// ── Client orchestration ──
//
// Public entry point for driving the daemon. Composes the session's
// command correlator and event bus into the scan and connect workflows
// and the profile reconciliation logic.

use std::sync::Arc;

use tokio::net::UnixDatagram;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use wpactl_api::command::{
    ADD_NETWORK, DISABLE_NETWORK, DISCONNECT, ENABLE_NETWORK, GET_NETWORK, LIST_NETWORKS,
    RECONFIGURE, REMOVE_NETWORK, REPLY_FAIL, SAVE_CONFIG, SCAN, SCAN_RESULTS, SELECT_NETWORK,
    SET_NETWORK, STATUS,
};
use wpactl_api::event::{
    ASSOC_REJECT, AUTH_REJECT, CONNECTED, DISCONNECTED, NETWORK_NOT_FOUND, SCAN_FAILED,
    SCAN_RESULTS_READY,
};
use wpactl_api::{Event, Session, Subscription};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::network::unquote;
use crate::model::{AccessPoint, Network, NetworkList, State};
use crate::parse;

/// Events that settle a connect attempt.
const CONNECT_OUTCOMES: [&str; 5] = [
    NETWORK_NOT_FOUND,
    AUTH_REJECT,
    CONNECTED,
    DISCONNECTED,
    ASSOC_REJECT,
];

/// How a scan wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    Ready,
    Failed,
    TimedOut,
}

// ── Client ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Every public operation holds
/// the client's operation lock for its whole duration, so a scan, a
/// connect and a profile edit never interleave their commands, even when
/// issued from different tasks.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    session: Session,
    config: ClientConfig,
    /// One logical operation at a time. Held by public methods only;
    /// private helpers assume it is already held.
    op_lock: Mutex<()>,
}

impl Client {
    /// Wrap an already open session.
    pub fn new(session: Session, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                session,
                config,
                op_lock: Mutex::new(()),
            }),
        }
    }

    /// Open a session on a connected control socket and wrap it.
    ///
    /// Must be called from within a tokio runtime. The socket is not
    /// attached; call [`attach`](Self::attach) before relying on events
    /// unless the daemon already delivers them.
    pub fn open(socket: UnixDatagram, config: ClientConfig) -> Self {
        let session = Session::open(socket, config.session.clone());
        Self::new(session, config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The underlying session, for raw commands outside the workflows.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Fresh status snapshot from the daemon.
    pub async fn status(&self) -> Result<State, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        let reply = self.inner.session.send_command(&[STATUS]).await?;
        Ok(parse::parse_status(&reply))
    }

    // ── Scan ─────────────────────────────────────────────────────────

    /// Trigger a scan and return what the daemon found.
    ///
    /// Waits up to [`ClientConfig::scan_timeout`] for the scan to finish.
    /// When the timer wins the results are fetched anyway: the daemon may
    /// already hold a partial list.
    pub async fn scan(&self) -> Result<Vec<AccessPoint>, CoreError> {
        let _op = self.inner.op_lock.lock().await;

        // Both listeners exist before the trigger so a fast outcome is seen.
        let ready = self.inner.session.subscribe([SCAN_RESULTS_READY]);
        let failed = self.inner.session.subscribe([SCAN_FAILED]);

        self.inner.session.send_command_bool(&[SCAN]).await?;
        debug!("scan triggered");

        let outcome = self.await_scan(&ready, &failed).await;
        ready.unsubscribe();
        failed.unsubscribe();

        match outcome? {
            ScanOutcome::Failed => {
                warn!("daemon reported scan failure");
                return Err(CoreError::ScanFailed);
            }
            ScanOutcome::TimedOut => {
                debug!(
                    timeout_ms = self.inner.config.scan_timeout.as_millis(),
                    "scan timer fired, fetching available results"
                );
            }
            ScanOutcome::Ready => {}
        }

        let reply = self.inner.session.send_command(&[SCAN_RESULTS]).await?;
        let access_points = parse::parse_access_points(&reply);
        info!(count = access_points.len(), "scan complete");
        Ok(access_points)
    }

    async fn await_scan(
        &self,
        ready: &Subscription,
        failed: &Subscription,
    ) -> Result<ScanOutcome, CoreError> {
        tokio::select! {
            biased;
            event = failed.next() => event
                .map(|_| ScanOutcome::Failed)
                .ok_or(CoreError::DaemonDisconnected),
            event = ready.next() => event
                .map(|_| ScanOutcome::Ready)
                .ok_or(CoreError::DaemonDisconnected),
            () = tokio::time::sleep(self.inner.config.scan_timeout) => Ok(ScanOutcome::TimedOut),
        }
    }

    // ── Network profiles ─────────────────────────────────────────────

    /// Every stored profile, in daemon order, with its alias read back.
    pub async fn networks(&self) -> Result<Vec<Network>, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.list_networks().await
    }

    /// Store `network`, updating a matching profile instead of adding a
    /// duplicate.
    ///
    /// A stored profile matches on alias first, then on SSID.
    pub async fn add_or_update_network(&self, network: Network) -> Result<Network, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.reconcile(network).await
    }

    /// Create a new profile. The daemon assigns the id; the alias defaults
    /// to the SSID.
    pub async fn add_network(&self, network: Network) -> Result<Network, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.write_new(network).await
    }

    /// Rewrite every settable field of the profile with `network.id`.
    pub async fn update_network(&self, network: Network) -> Result<Network, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.write_existing(network).await
    }

    pub async fn remove_network(&self, id: i32) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.network_command(REMOVE_NETWORK, id).await
    }

    pub async fn enable_network(&self, id: i32) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.network_command(ENABLE_NETWORK, id).await
    }

    pub async fn disable_network(&self, id: i32) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.network_command(DISABLE_NETWORK, id).await
    }

    pub async fn select_network(&self, id: i32) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.network_command(SELECT_NETWORK, id).await
    }

    /// Raw value of one profile field, as the daemon prints it (strings
    /// stay quoted).
    pub async fn network_attribute(&self, id: i32, field: &str) -> Result<String, CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.get_attribute(id, field).await
    }

    /// Persist the daemon's profile store.
    pub async fn save_config(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.send_command_bool(&[SAVE_CONFIG]).await?;
        Ok(())
    }

    /// Make the daemon re-read its configuration file.
    pub async fn reload_config(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.send_command_bool(&[RECONFIGURE]).await?;
        Ok(())
    }

    // ── Connect / disconnect ─────────────────────────────────────────

    /// Store `network` (see [`add_or_update_network`](Self::add_or_update_network))
    /// and switch to it.
    ///
    /// Resolves on the first outcome event. On success the daemon's
    /// configuration is saved and the stored profile is returned. Without
    /// a [`ClientConfig::connect_timeout`] this waits until the daemon
    /// reports an outcome or the session closes.
    pub async fn connect(&self, network: Network) -> Result<Network, CoreError> {
        let _op = self.inner.op_lock.lock().await;

        let network = self.reconcile(network).await?;

        let outcome = self.inner.session.subscribe(CONNECT_OUTCOMES);
        let result = self.switch_to(&network, &outcome).await;
        outcome.unsubscribe();
        result?;

        self.inner.session.send_command_bool(&[SAVE_CONFIG]).await?;
        info!(id = network.id, "connected");
        Ok(network)
    }

    async fn switch_to(&self, network: &Network, outcome: &Subscription) -> Result<(), CoreError> {
        if network.is_disabled() {
            self.network_command(ENABLE_NETWORK, network.id).await?;
        } else {
            self.network_command(SELECT_NETWORK, network.id).await?;
        }
        debug!(id = network.id, "waiting for connect outcome");

        let event = match self.inner.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, outcome.next())
                .await
                .map_err(|_| CoreError::ConnectTimeout {
                    timeout_secs: limit.as_secs(),
                })?,
            None => outcome.next().await,
        };

        let event = event.ok_or(CoreError::DaemonDisconnected)?;
        connect_outcome(&event).inspect_err(|e| {
            warn!(id = network.id, event = %event.name, error = %e, "connect failed");
        })
    }

    pub async fn disconnect(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.send_command_bool(&[DISCONNECT]).await?;
        info!("disconnected");
        Ok(())
    }

    // ── Session passthrough ──────────────────────────────────────────

    /// Ask the daemon to deliver events on this session.
    pub async fn attach(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.attach().await?;
        Ok(())
    }

    pub async fn detach(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.detach().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), CoreError> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.session.ping().await?;
        Ok(())
    }

    /// Listen for arbitrary daemon events by exact name.
    pub fn subscribe<I, S>(&self, topics: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.session.subscribe(topics)
    }

    /// Close the session. Does not take the operation lock: a pending
    /// operation fails with [`CoreError::DaemonDisconnected`] instead.
    pub async fn close(&self) {
        self.inner.session.close().await;
    }

    // ── Helpers (operation lock held) ────────────────────────────────

    async fn network_command(&self, verb: &str, id: i32) -> Result<(), CoreError> {
        let id = id.to_string();
        self.inner.session.send_command_bool(&[verb, &id]).await?;
        debug!(command = verb, id = %id, "network command applied");
        Ok(())
    }

    async fn get_attribute(&self, id: i32, field: &str) -> Result<String, CoreError> {
        let id = id.to_string();
        let reply = self
            .inner
            .session
            .send_command(&[GET_NETWORK, &id, field])
            .await?;
        let value = reply.trim();
        if value == REPLY_FAIL {
            return Err(CoreError::CommandRejected {
                command: GET_NETWORK.to_owned(),
                reply: value.to_owned(),
            });
        }
        Ok(value.to_owned())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, CoreError> {
        let reply = self.inner.session.send_command(&[LIST_NETWORKS]).await?;
        let mut networks = parse::parse_networks(&reply)?;

        for network in &mut networks {
            network.known = true;
            network.id_str = match self.get_attribute(network.id, "id_str").await {
                Ok(value) => unquote(&value).to_owned(),
                Err(CoreError::CommandRejected { .. }) => String::new(),
                Err(e) => return Err(e),
            };
        }

        debug!(count = networks.len(), "listed networks");
        Ok(networks)
    }

    async fn reconcile(&self, mut candidate: Network) -> Result<Network, CoreError> {
        let stored = self.list_networks().await?;

        if !candidate.id_str.is_empty() {
            if let Some(existing) = stored.find_by_id_str(&candidate.id_str) {
                debug!(id = existing.id, "reconciled by alias");
                candidate.id = existing.id;
                candidate.flags.clone_from(&existing.flags);
                return self.write_existing(candidate).await;
            }
        }

        if !candidate.ssid.is_empty() {
            if let Some(existing) = stored.find_by_ssid(&candidate.ssid) {
                debug!(id = existing.id, "reconciled by ssid");
                candidate.id = existing.id;
                candidate.flags.clone_from(&existing.flags);
                if !existing.id_str.is_empty() {
                    candidate.id_str.clone_from(&existing.id_str);
                } else if candidate.id_str.is_empty() {
                    candidate.id_str.clone_from(&candidate.ssid);
                }
                return self.write_existing(candidate).await;
            }
        }

        self.write_new(candidate).await
    }

    async fn write_new(&self, mut network: Network) -> Result<Network, CoreError> {
        network.id = self.inner.session.send_command_int(&[ADD_NETWORK]).await?;
        if network.id_str.is_empty() {
            network.id_str.clone_from(&network.ssid);
        }
        info!(id = network.id, "network added");

        self.apply_fields(&network).await?;
        network.known = true;
        Ok(network)
    }

    async fn write_existing(&self, mut network: Network) -> Result<Network, CoreError> {
        if network.id_str.is_empty() {
            return Err(CoreError::NoIdentifier);
        }

        self.apply_fields(&network).await?;
        network.known = true;
        info!(id = network.id, "network updated");
        Ok(network)
    }

    /// One `SET_NETWORK` per field. Stops at the first rejection; fields
    /// already written stay written.
    async fn apply_fields(&self, network: &Network) -> Result<(), CoreError> {
        let id = network.id.to_string();

        for (field, value) in network.settable_fields() {
            if let Err(e) = self
                .inner
                .session
                .send_command_bool(&[SET_NETWORK, &id, &field, &value])
                .await
            {
                warn!(id = network.id, field = %field, "profile write aborted");
                return Err(CoreError::ProfileIncomplete {
                    id: network.id,
                    field,
                    source: Box::new(e.into()),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.inner.session)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Map a connect outcome event to the attempt's result.
fn connect_outcome(event: &Event) -> Result<(), CoreError> {
    match event.name.as_str() {
        CONNECTED => Ok(()),
        NETWORK_NOT_FOUND => Err(CoreError::SsidNotFound),
        AUTH_REJECT => Err(CoreError::AuthFailed),
        DISCONNECTED => Err(CoreError::Disconnected),
        ASSOC_REJECT => Err(CoreError::AssocRejected),
        other => Err(CoreError::UnexpectedEvent {
            name: other.to_owned(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(name: &str) -> Event {
        Event {
            name: name.to_owned(),
            payload: String::new(),
        }
    }

    #[test]
    fn outcome_mapping() {
        assert!(connect_outcome(&event(CONNECTED)).is_ok());
        assert!(matches!(
            connect_outcome(&event(NETWORK_NOT_FOUND)),
            Err(CoreError::SsidNotFound)
        ));
        assert!(matches!(
            connect_outcome(&event(AUTH_REJECT)),
            Err(CoreError::AuthFailed)
        ));
        assert!(matches!(
            connect_outcome(&event(DISCONNECTED)),
            Err(CoreError::Disconnected)
        ));
        assert!(matches!(
            connect_outcome(&event(ASSOC_REJECT)),
            Err(CoreError::AssocRejected)
        ));
    }

    #[test]
    fn unknown_outcome_is_unexpected_event() {
        let err = connect_outcome(&event("CTRL-EVENT-TERMINATING")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnexpectedEvent { ref name } if name == "CTRL-EVENT-TERMINATING"
        ));
        assert!(err.is_connect_outcome());
    }

    #[test]
    fn outcome_topics_cover_every_mapped_event() {
        for topic in CONNECT_OUTCOMES {
            let mapped = connect_outcome(&event(topic));
            assert!(!matches!(mapped, Err(CoreError::UnexpectedEvent { .. })));
        }
    }
}
