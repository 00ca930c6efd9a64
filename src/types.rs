use serde::{Deserialize, Serialize};

/// State of a probed port. Closed and filtered ports are indistinguishable
/// from the outside with a connect scan, so they are dropped rather than
/// reported and only `Open` is ever produced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => f.pad("open"),
        }
    }
}

/// One open port discovered during a scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    pub state: PortState,
    pub service: String,
}

/// Message sent to a progress sink while a scan is in flight.
///
/// Result order within `Completed` follows completion order, which is
/// non-deterministic across runs; sort by port before display if a stable
/// order matters. `fraction` is derived from the dequeued port number, so
/// values may arrive non-monotonically when workers race.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanUpdate {
    InProgress { fraction: f64 },
    Completed { results: Vec<PortResult> },
    Failed { error: String },
}
