use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use market::types::InstrumentId;

/// Direction of the move that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Price fell a threshold percentage below the retained maximum.
    Dip,
    /// Price rose a threshold percentage above the window minimum.
    Spike,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::Dip => "DIP",
            AlertKind::Spike => "SPIKE",
        };
        f.write_str(s)
    }
}

impl FromStr for AlertKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIP" => Ok(AlertKind::Dip),
            "SPIKE" => Ok(AlertKind::Spike),
            other => Err(anyhow::anyhow!("Invalid AlertKind value: {}", other)),
        }
    }
}

/// Which algorithm produced the alert. Persisted with the audit record so
/// "why did this fire" stays reconstructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSource {
    Trailing,
    Rolling,
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertSource::Trailing => "trailing",
            AlertSource::Rolling => "rolling",
        };
        f.write_str(s)
    }
}

impl FromStr for AlertSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trailing" => Ok(AlertSource::Trailing),
            "rolling" => Ok(AlertSource::Rolling),
            other => Err(anyhow::anyhow!("Invalid AlertSource value: {}", other)),
        }
    }
}

/// Output of one evaluator run. Immutable; the orchestrator enriches it with
/// the subscriber identity before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub instrument: InstrumentId,
    /// Unsigned magnitude of the move, in percent.
    pub percent: f64,
    /// The price that triggered the alert.
    pub price: f64,
    pub ts_ms: u64,
    pub source: AlertSource,
}
