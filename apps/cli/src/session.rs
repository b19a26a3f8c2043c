use std::fmt;

use analysis as an;
use ledger::PitStopLedger;
use model::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;

/// Toast-style acknowledgement shown after a user action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notice {
    Recorded { id: PitStopId, pilot: String, elapsed_seconds: f64, status: PitStopStatus },
    Deleted { id: PitStopId, pilot: String, before: usize, after: usize },
    NotFound { id: PitStopId },
    StatisticsUpdated { revision: u64 },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Recorded { id, pilot, elapsed_seconds, status } => {
                write!(f, "New pit stop #{id} recorded: {pilot} • {elapsed_seconds}s • {status}")
            }
            Notice::Deleted { id, pilot, before, after } => {
                write!(f, "Pit stop #{id} of {pilot} deleted ({before} → {after})")
            }
            Notice::NotFound { id } => write!(f, "Pit stop #{id} to delete was not found"),
            Notice::StatisticsUpdated { .. } => f.write_str("List updated, statistics refreshed"),
        }
    }
}

/// Owns the authoritative ledger for the running session.
pub struct HomeSession {
    ledger: PitStopLedger,
    config: AppConfig,
    stats_revision: u64,
}

impl HomeSession {
    pub fn new(config: AppConfig) -> Self {
        Self { ledger: PitStopLedger::new(), config, stats_revision: 0 }
    }

    pub fn ledger(&self) -> &PitStopLedger {
        &self.ledger
    }

    /// Bumped every time new data is merged back from a sub-flow.
    pub fn stats_revision(&self) -> u64 {
        self.stats_revision
    }

    fn statistics_updated(&mut self) -> Notice {
        self.stats_revision += 1;
        info!(revision = self.stats_revision, records = self.ledger.len(), "statistics updated");
        Notice::StatisticsUpdated { revision: self.stats_revision }
    }

    pub fn begin_add(&self) -> FormFlow {
        FormFlow::new()
    }

    /// Merges the form result back. A cancelled form changes nothing.
    pub fn finish_add(&mut self, outcome: FormOutcome) -> Option<Notice> {
        match outcome {
            FormOutcome::Cancelled => {
                debug!("form cancelled");
                None
            }
            FormOutcome::Saved(record) => {
                let pilot = record.pilot.clone();
                let (elapsed_seconds, status) = (record.elapsed_seconds, record.status);
                let id = self.ledger.append(record);
                self.statistics_updated();
                Some(Notice::Recorded { id, pilot, elapsed_seconds, status })
            }
        }
    }

    pub fn open_list(&self) -> ListFlow {
        ListFlow { working: self.ledger.checkout() }
    }

    /// Takes the list screen's working copy as the new authoritative state.
    pub fn close_list(&mut self, flow: ListFlow) -> Notice {
        self.ledger.checkin(flow.finish());
        self.statistics_updated()
    }

    pub fn summary(&self) -> an::HomeSummary {
        an::home_summary(self.ledger.records(), self.config.recent_len, self.config.chart_len)
    }

    pub fn chart(&self) -> Vec<an::ChartBar> {
        an::chart_series(self.ledger.records(), self.config.chart_len)
    }

    pub fn pilot_stats(&self, pilot: &str) -> an::PilotStats {
        an::pilot_stats(self.ledger.records(), pilot)
    }

    pub fn roster(&self) -> Vec<an::PilotCard> {
        an::roster_summary(self.ledger.records(), &self.config.roster)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Saved(PitStopRecord),
    Cancelled,
}

/// The add-entry form: edits a draft and emits at most one validated record.
#[derive(Debug, Clone, Default)]
pub struct FormFlow {
    draft: PitStopDraft,
}

impl FormFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: PitStopDraft) -> Self {
        Self { draft }
    }

    pub fn draft_mut(&mut self) -> &mut PitStopDraft {
        &mut self.draft
    }

    /// Validates the draft; on failure the form stays open so the user can fix it.
    pub fn submit(&self) -> Result<FormOutcome, ValidationErrors> {
        self.draft.validate().map(FormOutcome::Saved)
    }

    pub fn cancel(self) -> FormOutcome {
        FormOutcome::Cancelled
    }
}

/// The list screen: search and delete over its own working copy.
pub struct ListFlow {
    working: PitStopLedger,
}

impl ListFlow {
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a PitStopRecord> + Clone + 'a {
        self.working.filter_by_pilot_substring(query)
    }

    pub fn delete(&mut self, id: PitStopId) -> Notice {
        let before = self.working.len();
        match self.working.remove_by_id(id) {
            Ok(removed) => {
                Notice::Deleted { id, pilot: removed.pilot, before, after: self.working.len() }
            }
            Err(_) => Notice::NotFound { id },
        }
    }

    pub fn finish(self) -> PitStopLedger {
        self.working
    }
}

/// The three stops the app has always shipped as sample data.
pub fn sample_drafts() -> Vec<PitStopDraft> {
    let at = now_timestamp();
    let draft = |pilot: &str,
                 team: &str,
                 secs: &str,
                 compound: TireCompound,
                 status: PitStopStatus,
                 reason: &str,
                 mechanic: &str| {
        PitStopDraft {
            pilot: pilot.into(),
            team: team.into(),
            elapsed_seconds: secs.into(),
            tire_compound: compound,
            tires_changed: "4".into(),
            status,
            failure_reason: reason.into(),
            mechanic: mechanic.into(),
            timestamp: at,
            ..PitStopDraft::default()
        }
    };
    vec![
        draft("Lewis Hamilton", "Mercedes", "2.35", TireCompound::Soft, PitStopStatus::Ok, "", "Juan"),
        draft("Max Verstappen", "Red Bull", "2.10", TireCompound::Medium, PitStopStatus::Failed, "Wheel nut", "Ana"),
        draft("Charles Leclerc", "Ferrari", "2.60", TireCompound::Hard, PitStopStatus::Ok, "", "Luis"),
    ]
}

/// Pushes the sample stops through the form flow.
pub fn seed(session: &mut HomeSession) -> Result<(), ValidationErrors> {
    for draft in sample_drafts() {
        let outcome = FormFlow::with_draft(draft).submit()?;
        session.finish_add(outcome);
    }
    Ok(())
}
