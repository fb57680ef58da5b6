//! argus-protocol — Wire model for the detection backend's event stream
//! and the ordered message classifier.
//!
//! The backend sends one JSON object per WebSocket text frame. Frames are
//! heterogeneous: live image payloads, tier-1 detection pushes, tier-2
//! analysis lifecycle messages, steady-state heartbeats, and bare error
//! objects all share the same channel. This crate parses them permissively
//! and reduces each frame to a single dispatch decision.

pub mod classify;
pub mod history;
pub mod message;

pub use classify::{classify, Action, AnalysisOutcome, Classified, DetectionEvent};
pub use history::{AnomalyEventsResponse, StoredAnomaly};
pub use message::ServerMessage;
