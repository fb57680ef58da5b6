//! argus-session — The real-time event-correlation and connection-lifecycle
//! engine behind the monitoring view.
//!
//! One `MonitorSession` task owns every piece of mutable state: the active
//! backend connection, the correlated anomaly list, and the analysis /
//! reconnect timers. The view layer only ever sees read snapshots published
//! through a `tokio::sync::watch` channel, and steers the session through a
//! small command queue.

pub mod aging;
pub mod correlator;
pub mod endpoint;
pub mod refresh;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod watchdog;

pub use endpoint::StreamSource;
pub use refresh::BackendClient;
pub use session::{spawn, Command, SessionConfig, SessionHandle};
pub use state::SessionState;
pub use supervisor::{ConnEvent, Transport, WsTransport};
