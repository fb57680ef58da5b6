//! argus-common — Shared types and errors used across all Argus crates.

pub mod error;
pub mod types;

pub use error::{ArgusError, Result};
pub use types::{
    AnomalyRecord, AnomalyStatus, ConnectionStatus, Freshness, SeverityBand, Tier2Analysis,
};
