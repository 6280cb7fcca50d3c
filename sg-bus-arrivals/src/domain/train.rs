//! Train service alert types and per-line status derivation.

use std::collections::BTreeMap;

use serde::Serialize;

/// Train line codes tracked for service alerts.
pub const TRAIN_LINES: &[&str] = &[
    "bpl", "ccl", "cel", "cgl", "dtl", "ewl", "nel", "nsl", "plrt", "slrt", "tel",
];

/// Possible per-line statuses, as displayed.
pub const TRAIN_STATUSES: &[&str] = &["normal", "disrupted"];

/// Status of a single train line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainStatus {
    Normal,
    Disrupted,
}

impl TrainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainStatus::Normal => "normal",
            TrainStatus::Disrupted => "disrupted",
        }
    }
}

/// Derived alert state for one train line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainServiceAlert {
    pub status: TrainStatus,
    /// Alert messages mentioning this line. Empty when normal.
    pub messages: Vec<String>,
}

impl TrainServiceAlert {
    pub fn normal() -> Self {
        Self {
            status: TrainStatus::Normal,
            messages: Vec::new(),
        }
    }
}

/// Alert state keyed by line code, one entry per [`TRAIN_LINES`] code.
pub type TrainAlerts = BTreeMap<String, TrainServiceAlert>;

/// Derive per-line status from a flat list of alert messages.
///
/// A line is disrupted if and only if some message contains its code,
/// in either lower or upper case.
pub fn derive_train_service_alerts(messages: &[String]) -> TrainAlerts {
    TRAIN_LINES
        .iter()
        .map(|&line| {
            let upper = line.to_uppercase();
            let matching: Vec<String> = messages
                .iter()
                .filter(|m| m.contains(line) || m.contains(upper.as_str()))
                .cloned()
                .collect();

            let alert = if matching.is_empty() {
                TrainServiceAlert::normal()
            } else {
                TrainServiceAlert {
                    status: TrainStatus::Disrupted,
                    messages: matching,
                }
            };
            (line.to_string(), alert)
        })
        .collect()
}
