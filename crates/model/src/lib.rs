use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};

mod draft;

pub use draft::{PitStopDraft, ValidationError, ValidationErrors, MAX_TIRES_CHANGED};

/// Identity of a pit stop. `0` marks a record that has not been assigned one yet.
pub type PitStopId = u64;

pub const UNASSIGNED_ID: PitStopId = 0;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl TireCompound {
    pub const ALL: [TireCompound; 5] = [
        TireCompound::Soft,
        TireCompound::Medium,
        TireCompound::Hard,
        TireCompound::Intermediate,
        TireCompound::Wet,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TireCompound::Soft => "Soft",
            TireCompound::Medium => "Medium",
            TireCompound::Hard => "Hard",
            TireCompound::Intermediate => "Intermediate",
            TireCompound::Wet => "Wet",
        }
    }
}

impl fmt::Display for TireCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for TireCompound {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TireCompound::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseLabelError { kind: "tire compound", value: s.to_string() })
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum PitStopStatus {
    Ok,
    Failed,
}

impl fmt::Display for PitStopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitStopStatus::Ok => f.pad("OK"),
            PitStopStatus::Failed => f.pad("Failed"),
        }
    }
}

impl FromStr for PitStopStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(PitStopStatus::Ok),
            // "fallido" is the label older screens stored for failed stops
            "failed" | "fallido" => Ok(PitStopStatus::Failed),
            _ => Err(ParseLabelError { kind: "status", value: s.to_string() }),
        }
    }
}

/// One observed pit stop.
///
/// Build these through [`PitStopDraft::validate`]: it guarantees a `Failed` record carries a
/// non-empty `failure_reason` and an `Ok` record carries none.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PitStopRecord {
    pub id: PitStopId,
    pub pilot: String,
    pub team: String,
    pub elapsed_seconds: f64,
    pub tire_compound: TireCompound,
    pub tires_changed: u8,
    pub status: PitStopStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub mechanic: String,
    pub timestamp: PrimitiveDateTime,
}

impl PitStopRecord {
    pub fn is_ok(&self) -> bool {
        self.status == PitStopStatus::Ok
    }
}

/// Current wall-clock time as a date-time without offset, the default for new form entries.
pub fn now_timestamp() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Parses `YYYY-MM-DD HH:MM`, the precision the date and time pickers offer.
pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s.trim(), format_description!("[year]-[month]-[day] [hour]:[minute]"))
}

pub fn format_timestamp(ts: &PrimitiveDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn compound_parses_any_case() {
        assert_eq!("soft".parse::<TireCompound>(), Ok(TireCompound::Soft));
        assert_eq!(" INTERMEDIATE ".parse::<TireCompound>(), Ok(TireCompound::Intermediate));
        assert!("slick".parse::<TireCompound>().is_err());
    }

    #[test]
    fn status_accepts_legacy_label() {
        assert_eq!("OK".parse::<PitStopStatus>(), Ok(PitStopStatus::Ok));
        assert_eq!("Fallido".parse::<PitStopStatus>(), Ok(PitStopStatus::Failed));
        assert_eq!(PitStopStatus::Failed.to_string(), "Failed");
    }

    #[test]
    fn timestamp_round_trips_through_picker_format() {
        let ts = parse_timestamp("2024-05-26 14:05").unwrap();
        assert_eq!(ts, datetime!(2024-05-26 14:05));
        assert_eq!(format_timestamp(&ts), "2024-05-26 14:05");
        assert!(parse_timestamp("26/05/2024").is_err());
    }

    #[test]
    fn ok_record_serializes_without_reason() {
        let rec = PitStopRecord {
            id: 1,
            pilot: "Lewis Hamilton".into(),
            team: "Mercedes".into(),
            elapsed_seconds: 2.35,
            tire_compound: TireCompound::Soft,
            tires_changed: 4,
            status: PitStopStatus::Ok,
            failure_reason: None,
            mechanic: "Juan".into(),
            timestamp: datetime!(2024-05-26 14:05),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("failure_reason").is_none());
        assert_eq!(v["tire_compound"], "Soft");
        assert!(rec.is_ok());
    }
}
