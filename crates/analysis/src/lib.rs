use model::*;
use serde::{Deserialize, Serialize};

/// How many of the latest stops the home screen lists.
pub const RECENT_LEN: usize = 5;
/// How many of the latest stops feed the bar chart.
pub const CHART_LEN: usize = 10;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    All,
    #[default]
    OkOnly,
}

impl StatusFilter {
    pub fn admits(&self, r: &PitStopRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::OkOnly => r.is_ok(),
        }
    }
}

/// Records whose pilot contains `query`, ignoring case. An empty query matches everything.
///
/// The returned iterator is lazy and can be cloned to walk the matches again.
pub fn filter_by_pilot_substring<'a, I>(
    records: I,
    query: &str,
) -> impl Iterator<Item = &'a PitStopRecord> + Clone
where
    I: IntoIterator<Item = &'a PitStopRecord>,
    I::IntoIter: Clone,
{
    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(move |r| needle.is_empty() || r.pilot.to_lowercase().contains(&needle))
}

/// Exact pilot match, ignoring case.
pub fn matches_pilot(r: &PitStopRecord, pilot: &str) -> bool {
    r.pilot.to_lowercase() == pilot.trim().to_lowercase()
}

/// Fastest stop among the admitted records; the first one wins a tie.
pub fn fastest_among<'a, I>(records: I, filter: StatusFilter) -> Option<&'a PitStopRecord>
where
    I: IntoIterator<Item = &'a PitStopRecord>,
{
    records
        .into_iter()
        .filter(|r| filter.admits(r))
        .min_by(|a, b| a.elapsed_seconds.total_cmp(&b.elapsed_seconds))
}

/// Mean elapsed time of the admitted records, `0.0` when none are admitted.
pub fn average_elapsed<'a, I>(records: I, filter: StatusFilter) -> f64
where
    I: IntoIterator<Item = &'a PitStopRecord>,
{
    let (sum, n) = records
        .into_iter()
        .filter(|r| filter.admits(r))
        .fold((0.0_f64, 0usize), |(s, n), r| (s + r.elapsed_seconds, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

pub fn count_by_status<'a, I>(records: I, status: PitStopStatus) -> usize
where
    I: IntoIterator<Item = &'a PitStopRecord>,
{
    records.into_iter().filter(|r| r.status == status).count()
}

/// Percentage of `Ok` stops, `0.0` for an empty input.
pub fn success_rate<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a PitStopRecord>,
{
    let (ok, total) = records
        .into_iter()
        .fold((0usize, 0usize), |(ok, total), r| (ok + r.is_ok() as usize, total + 1));
    if total == 0 {
        0.0
    } else {
        100.0 * ok as f64 / total as f64
    }
}

/// The `n` most recently appended records, or all of them if there are fewer.
pub fn last_n(records: &[PitStopRecord], n: usize) -> &[PitStopRecord] {
    &records[records.len().saturating_sub(n)..]
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChartBar {
    pub index: usize,
    pub pilot: String,
    pub elapsed_seconds: f64,
    pub status: PitStopStatus,
}

/// Bar chart input: one bar per recent stop, oldest on the left.
pub fn chart_series(records: &[PitStopRecord], n: usize) -> Vec<ChartBar> {
    last_n(records, n)
        .iter()
        .enumerate()
        .map(|(index, r)| ChartBar {
            index,
            pilot: r.pilot.clone(),
            elapsed_seconds: r.elapsed_seconds,
            status: r.status,
        })
        .collect()
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct HomeSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub fastest: Option<PitStopRecord>,
    pub average_seconds: f64,
    pub success_rate: f64,
    pub recent: Vec<PitStopRecord>,
    pub chart: Vec<ChartBar>,
}

pub fn home_summary(records: &[PitStopRecord], recent_len: usize, chart_len: usize) -> HomeSummary {
    HomeSummary {
        total: records.len(),
        ok: count_by_status(records, PitStopStatus::Ok),
        failed: count_by_status(records, PitStopStatus::Failed),
        fastest: fastest_among(records, StatusFilter::OkOnly).cloned(),
        average_seconds: average_elapsed(records, StatusFilter::OkOnly),
        success_rate: success_rate(records),
        recent: last_n(records, recent_len).to_vec(),
        chart: chart_series(records, chart_len),
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PilotStats {
    pub pilot: String,
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub fastest_seconds: Option<f64>,
    pub average_seconds: f64,
    pub success_rate: f64,
    /// Newest first.
    pub history: Vec<PitStopRecord>,
}

pub fn pilot_stats(records: &[PitStopRecord], pilot: &str) -> PilotStats {
    let mut history: Vec<PitStopRecord> =
        records.iter().filter(|r| matches_pilot(r, pilot)).cloned().collect();

    let stats = PilotStats {
        pilot: pilot.trim().to_string(),
        total: history.len(),
        ok: count_by_status(&history, PitStopStatus::Ok),
        failed: count_by_status(&history, PitStopStatus::Failed),
        fastest_seconds: fastest_among(&history, StatusFilter::OkOnly).map(|r| r.elapsed_seconds),
        average_seconds: average_elapsed(&history, StatusFilter::OkOnly),
        success_rate: success_rate(&history),
        history: Vec::new(),
    };

    // stable: equal timestamps keep ledger order
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    PilotStats { history, ..stats }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub pilot: String,
    pub team: String,
}

impl RosterEntry {
    pub fn new(pilot: impl Into<String>, team: impl Into<String>) -> Self {
        Self { pilot: pilot.into(), team: team.into() }
    }
}

pub fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("Lewis Hamilton", "Mercedes"),
        RosterEntry::new("Max Verstappen", "Red Bull"),
        RosterEntry::new("Charles Leclerc", "Ferrari"),
        RosterEntry::new("Lando Norris", "McLaren"),
        RosterEntry::new("Fernando Alonso", "Aston Martin"),
    ]
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PilotCard {
    pub pilot: String,
    pub team: String,
    pub total: usize,
    pub successful: usize,
    pub fastest_seconds: Option<f64>,
}

pub fn roster_summary(records: &[PitStopRecord], roster: &[RosterEntry]) -> Vec<PilotCard> {
    roster
        .iter()
        .map(|e| {
            let mine: Vec<&PitStopRecord> =
                records.iter().filter(|r| matches_pilot(r, &e.pilot)).collect();
            PilotCard {
                pilot: e.pilot.clone(),
                team: e.team.clone(),
                total: mine.len(),
                successful: count_by_status(mine.iter().copied(), PitStopStatus::Ok),
                fastest_seconds: fastest_among(mine.iter().copied(), StatusFilter::OkOnly)
                    .map(|r| r.elapsed_seconds),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    fn stop(id: PitStopId, pilot: &str, secs: f64, status: PitStopStatus) -> PitStopRecord {
        PitStopRecord {
            id,
            pilot: pilot.to_string(),
            team: "test_team".to_string(),
            elapsed_seconds: secs,
            tire_compound: TireCompound::Medium,
            tires_changed: 4,
            status,
            failure_reason: (status == PitStopStatus::Failed).then(|| "Wheel nut".to_string()),
            mechanic: "Juan".to_string(),
            timestamp: datetime!(2024-05-26 14:00),
        }
    }

    fn fixture() -> Vec<PitStopRecord> {
        vec![
            stop(1, "Lewis Hamilton", 2.35, PitStopStatus::Ok),
            stop(2, "Max Verstappen", 2.10, PitStopStatus::Failed),
            stop(3, "Charles Leclerc", 2.60, PitStopStatus::Ok),
        ]
    }

    #[test]
    fn fastest_ok_skips_failed_stops() {
        let recs = fixture();
        let f = fastest_among(&recs, StatusFilter::OkOnly).unwrap();
        assert_eq!(f.id, 1);
        assert_eq!(f.elapsed_seconds, 2.35);
        assert_eq!(fastest_among(&recs, StatusFilter::All).unwrap().id, 2);
    }

    #[test]
    fn fastest_tie_goes_to_first() {
        let recs = vec![
            stop(1, "A", 2.5, PitStopStatus::Ok),
            stop(2, "B", 2.2, PitStopStatus::Ok),
            stop(3, "C", 2.2, PitStopStatus::Ok),
        ];
        assert_eq!(fastest_among(&recs, StatusFilter::OkOnly).unwrap().id, 2);
        let none: [PitStopRecord; 0] = [];
        assert!(fastest_among(&none, StatusFilter::All).is_none());
    }

    #[test]
    fn average_ok_and_empty_sentinel() {
        let recs = fixture();
        assert!((average_elapsed(&recs, StatusFilter::OkOnly) - 2.475).abs() < 1e-9);

        let only_failed: Vec<_> =
            recs.iter().filter(|r| r.status == PitStopStatus::Failed).cloned().collect();
        let avg = average_elapsed(&only_failed, StatusFilter::OkOnly);
        assert_eq!(avg, 0.0);
        assert!(!avg.is_nan());
    }

    #[test]
    fn counts_and_success_rate() {
        let recs = fixture();
        assert_eq!(count_by_status(&recs, PitStopStatus::Ok), 2);
        assert_eq!(count_by_status(&recs, PitStopStatus::Failed), 1);
        assert!((success_rate(&recs) - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(success_rate(&Vec::<PitStopRecord>::new()), 0.0);
    }

    #[test]
    fn pilot_search_ignores_case() {
        let recs = fixture();
        let hits: Vec<_> = filter_by_pilot_substring(&recs, "leW").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pilot, "Lewis Hamilton");

        let all = filter_by_pilot_substring(&recs, "");
        assert_eq!(all.clone().count(), 3);
        let ids: Vec<_> = all.map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(filter_by_pilot_substring(&recs, "zz").count(), 0);
    }

    #[test]
    fn last_n_takes_the_tail() {
        let recs: Vec<_> = (1..=7).map(|i| stop(i, "A", 2.0 + i as f64, PitStopStatus::Ok)).collect();
        let ids: Vec<_> = last_n(&recs, 5).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);
        assert_eq!(last_n(&recs, 10).len(), 7);
        assert!(last_n(&[], 5).is_empty());
    }

    #[test]
    fn chart_series_indexes_recent_stops() {
        let recs: Vec<_> = (1..=12).map(|i| stop(i, "A", i as f64, PitStopStatus::Ok)).collect();
        let bars = chart_series(&recs, CHART_LEN);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].index, 0);
        assert_eq!(bars[0].elapsed_seconds, 3.0);
        assert_eq!(bars[9].elapsed_seconds, 12.0);
        assert!(chart_series(&[], CHART_LEN).is_empty());
    }

    #[test]
    fn home_summary_over_fixture() {
        let s = home_summary(&fixture(), RECENT_LEN, CHART_LEN);
        assert_eq!((s.total, s.ok, s.failed), (3, 2, 1));
        assert_eq!(s.fastest.map(|r| r.id), Some(1));
        assert_eq!(s.recent.len(), 3);
        assert_eq!(s.chart.len(), 3);

        let empty = home_summary(&[], RECENT_LEN, CHART_LEN);
        assert_eq!(empty.fastest, None);
        assert_eq!(empty.average_seconds, 0.0);
        assert_eq!(empty.success_rate, 0.0);
    }

    #[test]
    fn pilot_stats_exact_match_newest_first() {
        let mut recs = fixture();
        let mut later = stop(4, "lewis hamilton", 2.20, PitStopStatus::Ok);
        later.timestamp = datetime!(2024-05-26 15:00);
        recs.push(later);
        recs.push(stop(5, "Lewis Hamilton", 3.10, PitStopStatus::Failed));
        recs.push(stop(6, "Lewis", 1.90, PitStopStatus::Ok));

        let s = pilot_stats(&recs, "Lewis Hamilton");
        assert_eq!((s.total, s.ok, s.failed), (3, 2, 1));
        assert_eq!(s.fastest_seconds, Some(2.20));
        assert!((s.average_seconds - 2.275).abs() < 1e-9);
        let order: Vec<_> = s.history.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![4, 1, 5]);

        let nobody = pilot_stats(&recs, "Lando Norris");
        assert_eq!(nobody.total, 0);
        assert_eq!(nobody.fastest_seconds, None);
        assert_eq!(nobody.average_seconds, 0.0);
        assert_eq!(nobody.success_rate, 0.0);
    }

    #[test]
    fn roster_cards_follow_roster_order() {
        let cards = roster_summary(&fixture(), &default_roster());
        assert_eq!(cards.len(), 5);
        assert_eq!(cards[0].pilot, "Lewis Hamilton");
        assert_eq!((cards[0].total, cards[0].successful), (1, 1));
        assert_eq!(cards[0].fastest_seconds, Some(2.35));
        assert_eq!((cards[1].total, cards[1].successful), (1, 0));
        assert_eq!(cards[1].fastest_seconds, None);
        assert_eq!(cards[3].total, 0);
    }
}
