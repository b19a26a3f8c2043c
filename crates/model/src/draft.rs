use std::fmt;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{now_timestamp, PitStopId, PitStopRecord, PitStopStatus, TireCompound, UNASSIGNED_ID};

pub const MAX_TIRES_CHANGED: u8 = 4;

/// Raw form input. Numeric fields stay as typed text until [`PitStopDraft::validate`] runs.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PitStopDraft {
    #[serde(default)]
    pub id: PitStopId,
    pub pilot: String,
    pub team: String,
    pub elapsed_seconds: String,
    pub tire_compound: TireCompound,
    pub tires_changed: String,
    pub status: PitStopStatus,
    #[serde(default)]
    pub failure_reason: String,
    pub mechanic: String,
    pub timestamp: PrimitiveDateTime,
}

impl Default for PitStopDraft {
    fn default() -> Self {
        Self {
            id: UNASSIGNED_ID,
            pilot: String::new(),
            team: String::new(),
            elapsed_seconds: String::new(),
            tire_compound: TireCompound::Hard,
            tires_changed: MAX_TIRES_CHANGED.to_string(),
            status: PitStopStatus::Ok,
            failure_reason: String::new(),
            mechanic: String::new(),
            timestamp: now_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid time (use decimals, e.g. 2.35).")]
    InvalidElapsed,
    #[error("Tires changed must be between 0 and 4.")]
    TiresOutOfRange,
    #[error("Pilot is required.")]
    MissingPilot,
    #[error("Team is required.")]
    MissingTeam,
    #[error("Lead mechanic is required.")]
    MissingMechanic,
    #[error("Failure reason is required when the status is Failed.")]
    MissingFailureReason,
}

/// Every rule a draft broke, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn contains(&self, err: &ValidationError) -> bool {
        self.0.contains(err)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl PitStopDraft {
    pub fn validate(&self) -> Result<PitStopRecord, ValidationErrors> {
        let mut errs = Vec::new();

        let elapsed = self
            .elapsed_seconds
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite() && *t > 0.0);
        if elapsed.is_none() {
            errs.push(ValidationError::InvalidElapsed);
        }

        let tires = self
            .tires_changed
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|n| *n <= MAX_TIRES_CHANGED);
        if tires.is_none() {
            errs.push(ValidationError::TiresOutOfRange);
        }

        let pilot = self.pilot.trim();
        if pilot.is_empty() {
            errs.push(ValidationError::MissingPilot);
        }
        let team = self.team.trim();
        if team.is_empty() {
            errs.push(ValidationError::MissingTeam);
        }
        let mechanic = self.mechanic.trim();
        if mechanic.is_empty() {
            errs.push(ValidationError::MissingMechanic);
        }

        let reason = self.failure_reason.trim();
        if self.status == PitStopStatus::Failed && reason.is_empty() {
            errs.push(ValidationError::MissingFailureReason);
        }

        match (elapsed, tires) {
            (Some(elapsed_seconds), Some(tires_changed)) if errs.is_empty() => Ok(PitStopRecord {
                id: self.id,
                pilot: pilot.to_string(),
                team: team.to_string(),
                elapsed_seconds,
                tire_compound: self.tire_compound,
                tires_changed,
                status: self.status,
                failure_reason: match self.status {
                    PitStopStatus::Failed => Some(reason.to_string()),
                    PitStopStatus::Ok => None,
                },
                mechanic: mechanic.to_string(),
                timestamp: self.timestamp,
            }),
            _ => Err(ValidationErrors(errs)),
        }
    }
}
