//! Historical Record Type
//!
//! One appended observation in a per-symbol/per-pair value series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp rendering used for the derived `datetime` field.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One observation in a value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Series the record belongs to (symbol or currency pair).
    pub series: String,
    /// Observed value (price, rate, or index level).
    pub value: f64,
    /// Traded volume, for quote series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// Observation time.
    pub timestamp: DateTime<Utc>,
    /// Human-readable rendering of `timestamp`.
    pub datetime: String,
}

impl HistoryRecord {
    /// Build a record, deriving the `datetime` field from the timestamp.
    #[must_use]
    pub fn new(
        series: impl Into<String>,
        value: f64,
        volume: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            series: series.into(),
            value,
            volume,
            timestamp,
            datetime: timestamp.format(DATETIME_FORMAT).to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn derives_datetime_from_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let record = HistoryRecord::new("AUD/USD", 0.67, None, ts);
        assert_eq!(record.datetime, "2025-03-14 09:26:53");
        assert_eq!(record.series, "AUD/USD");
        assert!(record.volume.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let record = HistoryRecord::new("BHP.AX", 44.5, Some(9_000), Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: HistoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
