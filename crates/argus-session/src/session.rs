//! The monitor session: a single task that owns all mutable state and
//! consumes the connection event queue, the command queue, and the three
//! timers (aging sweep, analysis watchdog, pending reconnect).

use crate::aging;
use crate::correlator::{self, InsertOutcome, MergeOutcome};
use crate::endpoint::{self, StreamSource};
use crate::refresh::BackendClient;
use crate::state::{
    SessionState, STATUS_ANALYSIS_RUNNING, STATUS_ANALYSIS_TIMEOUT, STATUS_CONNECTED,
    STATUS_CONNECTING, STATUS_DISCONNECTED, STATUS_MONITORING, STATUS_PARSE_ERROR,
};
use crate::supervisor::{ConnEvent, ConnectionSupervisor, Transport, CLOSE_NORMAL};
use crate::watchdog::{AnalysisWatchdog, ANALYSIS_TIMEOUT};
use argus_common::{AnomalyStatus, ConnectionStatus};
use argus_protocol::{classify, Action, ServerMessage};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay before the single reconnect attempt after an abnormal close.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Operator commands accepted by the session.
#[derive(Debug, Clone)]
pub enum Command {
    Connect(StreamSource),
    Disconnect,
    /// Replace the in-memory anomaly list with the backend's authoritative
    /// one.
    Refresh,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket base endpoint, e.g. `ws://localhost:8000`.
    pub ws_base_url: String,
    /// Identity token appended to every connect target.
    pub username: String,
}

/// Cloneable handle for steering the session and reading its snapshots.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn connect(&self, source: StreamSource) {
        let _ = self.cmd_tx.send(Command::Connect(source));
    }

    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    pub fn refresh(&self) {
        let _ = self.cmd_tx.send(Command::Refresh);
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }

    /// Subscribe to state snapshots. The view must treat these as
    /// read-only; all mutation goes through commands.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }
}

/// Spawn the session task and return its handle.
pub fn spawn(
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    backend: Option<BackendClient>,
) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionState::default());

    let session = MonitorSession {
        config,
        state: SessionState::default(),
        state_tx,
        cmd_rx,
        events_rx,
        supervisor: ConnectionSupervisor::new(transport, events_tx),
        watchdog: AnalysisWatchdog::new(),
        backend,
        active_source: None,
        user_closed: false,
        reconnect: None,
    };
    tokio::spawn(session.run());

    SessionHandle { cmd_tx, state_rx }
}

#[derive(Debug, Clone, Copy)]
struct ReconnectPlan {
    at: Instant,
    /// Epoch of the connection whose loss scheduled this attempt; a newer
    /// connection supersedes the plan.
    epoch: u64,
}

struct MonitorSession {
    config: SessionConfig,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    events_rx: mpsc::UnboundedReceiver<ConnEvent>,
    supervisor: ConnectionSupervisor,
    watchdog: AnalysisWatchdog,
    backend: Option<BackendClient>,
    active_source: Option<StreamSource>,
    user_closed: bool,
    reconnect: Option<ReconnectPlan>,
}

/// Sleep until the deadline, or forever when there is none. Keeps the
/// optional timers selectable without borrowing the session.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl MonitorSession {
    async fn run(mut self) {
        // The aging sweep outlives any connection.
        let mut aging_tick = interval(aging::SWEEP_INTERVAL);
        aging_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("monitor session started");
        loop {
            let watchdog_deadline = self.watchdog.deadline();
            let reconnect_deadline = self.reconnect.map(|p| p.at);

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Connect(source)) => self.handle_connect(source).await,
                    Some(Command::Disconnect) => self.handle_disconnect(),
                    Some(Command::Refresh) => self.handle_refresh().await,
                    Some(Command::Shutdown) | None => {
                        self.handle_disconnect();
                        break;
                    }
                },
                Some(event) = self.events_rx.recv() => self.handle_conn_event(event),
                _ = aging_tick.tick() => self.handle_aging_tick(),
                _ = wait_until(watchdog_deadline) => self.handle_watchdog_expiry(),
                _ = wait_until(reconnect_deadline) => self.handle_reconnect_due().await,
            }
        }
        info!("monitor session stopped");
    }

    fn publish(&mut self) {
        self.state_tx.send_replace(self.state.clone());
    }

    async fn handle_connect(&mut self, source: StreamSource) {
        self.user_closed = false;
        self.reconnect = None;
        let url = endpoint::stream_url(&self.config.ws_base_url, &source, &self.config.username);
        info!(source = source.label(), "connecting to {url}");
        self.active_source = Some(source);

        if self.supervisor.is_active() {
            self.state.connection = ConnectionStatus::Closing;
            self.publish();
        }
        self.state.connection = ConnectionStatus::Connecting;
        self.state.status_line = STATUS_CONNECTING.to_string();
        self.publish();

        if let Err(e) = self.supervisor.connect(&url).await {
            warn!("connection attempt failed: {e}");
            self.state.connection = ConnectionStatus::Disconnected;
            self.state.status_line = format!("Connection error: {e}");
            self.publish();
            // Failed opens recover through the same path as abnormal closes.
            self.schedule_reconnect();
        }
    }

    fn handle_disconnect(&mut self) {
        self.user_closed = true;
        self.active_source = None;
        self.reconnect = None;
        self.watchdog.disarm();
        self.state.analysis_in_progress = false;
        self.supervisor.disconnect();
        self.state.reset_for_disconnect();
        self.state.status_line = STATUS_DISCONNECTED.to_string();
        info!("disconnected by user");
        self.publish();
    }

    async fn handle_refresh(&mut self) {
        let Some(backend) = self.backend.clone() else {
            debug!("refresh requested but no backend client is configured");
            return;
        };
        match backend.fetch_anomalies().await {
            Ok(records) => {
                info!(count = records.len(), "anomaly list replaced from backend");
                self.state.anomalies = records;
                self.publish();
            }
            Err(e) => {
                warn!("anomaly refresh failed: {e}");
                self.state.status_line = format!("Failed to refresh anomaly list: {e}");
                self.publish();
            }
        }
    }

    fn handle_conn_event(&mut self, event: ConnEvent) {
        if event.epoch() != self.supervisor.epoch() {
            debug!(epoch = event.epoch(), "dropping event from replaced connection");
            return;
        }
        match event {
            ConnEvent::Opened { .. } => {
                info!("connection established");
                self.state.connection = ConnectionStatus::Connected;
                self.state.last_error = None;
                self.state.status_line = STATUS_CONNECTED.to_string();
                self.publish();
            }
            ConnEvent::Message { text, .. } => self.handle_message(&text),
            ConnEvent::Error { message, .. } => {
                warn!("connection error: {message}");
                self.state.status_line = format!("Connection error: {message}");
                self.publish();
            }
            ConnEvent::Closed { code, clean, .. } => self.handle_closed(code, clean),
        }
    }

    fn handle_closed(&mut self, code: Option<u16>, clean: bool) {
        info!(?code, clean, "connection closed");
        self.state.reset_for_disconnect();
        self.state.status_line = STATUS_DISCONNECTED.to_string();

        let abnormal = !clean || code != Some(CLOSE_NORMAL);
        if abnormal && !self.user_closed && self.active_source.is_some() {
            self.schedule_reconnect();
        }
        self.publish();
    }

    fn schedule_reconnect(&mut self) {
        if self.active_source.is_none() {
            return;
        }
        info!("scheduling reconnect in {RECONNECT_DELAY:?}");
        self.reconnect = Some(ReconnectPlan {
            at: Instant::now() + RECONNECT_DELAY,
            epoch: self.supervisor.epoch(),
        });
    }

    async fn handle_reconnect_due(&mut self) {
        let Some(plan) = self.reconnect.take() else {
            return;
        };
        if plan.epoch != self.supervisor.epoch() {
            debug!("reconnect superseded by a newer connection");
            return;
        }
        let Some(source) = self.active_source.clone() else {
            return;
        };
        info!("attempting reconnect");
        self.handle_connect(source).await;
    }

    fn handle_message(&mut self, text: &str) {
        let msg = match ServerMessage::parse(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("failed to parse server message: {e}");
                self.state.status_line = STATUS_PARSE_ERROR.to_string();
                self.publish();
                return;
            }
        };

        let classified = classify(msg);
        if let Some(frame) = classified.frame {
            self.state.current_frame = Some(frame);
        }
        if let Some(video_file) = classified.video_file {
            self.state.video_file = Some(video_file);
        }

        match classified.action {
            Action::ReportError(error) => {
                warn!("backend reported error: {error}");
                self.state.status_line = format!("Error: {error}");
                self.state.last_error = Some(error);
            }
            Action::AnalysisStarted { subject_id } => {
                debug!(?subject_id, "deep analysis started");
                self.begin_analysis();
                self.state.status_line = STATUS_ANALYSIS_RUNNING.to_string();
            }
            Action::AnalysisCompleted(outcome) => {
                match correlator::attach_result(&mut self.state.anomalies, outcome) {
                    MergeOutcome::Matched { id, severity } => {
                        info!(%id, ?severity, "deep analysis attached");
                    }
                    MergeOutcome::Discarded => {}
                }
                self.watchdog.disarm();
                self.state.analysis_in_progress = false;
            }
            Action::Detection(detection) => {
                self.state.anomaly_status = AnomalyStatus::Detected;
                self.state.status_line = detection.details.clone();
                match correlator::insert(
                    &mut self.state.anomalies,
                    &detection,
                    Utc::now(),
                    Instant::now(),
                ) {
                    InsertOutcome::Inserted => {
                        info!(
                            total = self.state.anomalies.len(),
                            "anomaly recorded, awaiting deep analysis"
                        );
                        // Every first-pass detection triggers a deep pass.
                        self.begin_analysis();
                    }
                    InsertOutcome::Duplicate => {
                        debug!("duplicate detection suppressed");
                    }
                }
            }
            Action::Heartbeat { details } => {
                self.state.anomaly_status = AnomalyStatus::Normal;
                if !self.state.analysis_in_progress {
                    self.state.status_line =
                        details.unwrap_or_else(|| STATUS_MONITORING.to_string());
                }
            }
        }
        self.publish();
    }

    fn begin_analysis(&mut self) {
        self.watchdog.arm(Instant::now() + ANALYSIS_TIMEOUT);
        self.state.analysis_in_progress = true;
    }

    fn handle_watchdog_expiry(&mut self) {
        self.watchdog.disarm();
        if self.state.analysis_in_progress {
            warn!("deep analysis did not complete within {ANALYSIS_TIMEOUT:?}");
            self.state.analysis_in_progress = false;
            self.state.status_line = STATUS_ANALYSIS_TIMEOUT.to_string();
            self.publish();
        }
    }

    fn handle_aging_tick(&mut self) {
        let flipped = aging::sweep(&mut self.state.anomalies, Instant::now());
        if flipped > 0 {
            debug!(flipped, "aged anomalies to seen");
            self.publish();
        }
    }
}
