//! Async client for a wpa_supplicant-style control socket.
//!
//! - **[`Session`]** owns the connected socket and a background reader.
//!   Commands are serialized (one in flight) and correlated with their
//!   replies by position; every other message becomes an [`Event`].
//! - **[`EventBus`]** fans events out to [`Subscription`]s filtered by exact
//!   event name, each with its own bounded buffer.
//! - **[`command`]** and **[`event`]** hold the wire vocabulary.

pub mod bus;
pub mod command;
pub mod error;
pub mod event;
pub mod session;

pub use bus::{EventBus, Subscription};
pub use error::Error;
pub use event::Event;
pub use session::{Session, SessionConfig};
