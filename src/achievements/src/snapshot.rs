//! Activity snapshot consumed by one evaluation pass

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type GameId = String;

/// Per-game aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub playtime_minutes: u64,
    /// 0.0 to 100.0
    pub completion_percent: f64,
    /// 0.0 means unrated
    pub rating: f64,
    pub screenshots: u32,
    pub launches: u32,
}

/// One recorded play session. Timestamps are absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Immutable aggregate of user activity.
///
/// Built with [`SnapshotBuilder`] at the start of an evaluation pass and
/// dropped afterwards. Wall-clock times and calendar dates are derived in a
/// single UTC offset carried by the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    games: BTreeMap<GameId, GameStats>,
    mod_count: usize,
    roadmap_total: usize,
    roadmap_completed: usize,
    group_count: usize,
    /// Sorted by start time
    sessions: Vec<SessionRecord>,
    offset: FixedOffset,
}

impl StatsSnapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    pub fn games(&self) -> &BTreeMap<GameId, GameStats> {
        &self.games
    }

    pub fn library_size(&self) -> usize {
        self.games.len()
    }

    pub fn mod_count(&self) -> usize {
        self.mod_count
    }

    pub fn roadmap_total(&self) -> usize {
        self.roadmap_total
    }

    pub fn roadmap_completed(&self) -> usize {
        self.roadmap_completed
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn total_playtime_minutes(&self) -> u64 {
        self.games
            .values()
            .fold(0u64, |acc, g| acc.saturating_add(g.playtime_minutes))
    }

    pub fn total_launches(&self) -> u64 {
        self.games.values().map(|g| u64::from(g.launches)).sum()
    }

    /// Number of distinct games launched at least once
    pub fn launched_games(&self) -> usize {
        self.games.values().filter(|g| g.launches > 0).count()
    }

    pub fn max_launches(&self) -> u32 {
        self.games.values().map(|g| g.launches).max().unwrap_or(0)
    }

    pub fn max_completion(&self) -> f64 {
        self.games
            .values()
            .map(|g| g.completion_percent)
            .fold(0.0, f64::max)
    }

    pub fn completed_games(&self) -> usize {
        self.games
            .values()
            .filter(|g| g.completion_percent >= 100.0)
            .count()
    }

    pub fn rated_games(&self) -> usize {
        self.games.values().filter(|g| g.rating > 0.0).count()
    }

    pub fn total_screenshots(&self) -> u64 {
        self.games.values().map(|g| u64::from(g.screenshots)).sum()
    }

    /// Session start times converted to the snapshot's wall clock.
    pub fn local_starts(&self) -> impl Iterator<Item = DateTime<FixedOffset>> + '_ {
        self.sessions
            .iter()
            .map(|s| s.started_at.with_timezone(&self.offset))
    }

    /// Distinct calendar dates with at least one session start, ascending.
    pub fn session_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.local_starts().map(|t| t.date_naive()).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        SnapshotBuilder::new().build()
    }
}

/// Accumulates collaborator data into a [`StatsSnapshot`].
///
/// Per-game setters add the game to the library if it is not there yet.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    games: BTreeMap<GameId, GameStats>,
    mod_count: usize,
    roadmap_total: usize,
    roadmap_completed: usize,
    group_count: usize,
    sessions: Vec<SessionRecord>,
    offset: FixedOffset,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            games: BTreeMap::new(),
            mod_count: 0,
            roadmap_total: 0,
            roadmap_completed: 0,
            group_count: 0,
            sessions: Vec::new(),
            offset: Utc.fix(),
        }
    }

    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Add a game with no activity
    pub fn game(mut self, id: impl Into<GameId>) -> Self {
        self.games.entry(id.into()).or_default();
        self
    }

    pub fn game_stats(mut self, id: impl Into<GameId>, stats: GameStats) -> Self {
        self.games.insert(id.into(), stats);
        self
    }

    pub fn playtime(mut self, id: impl Into<GameId>, minutes: u64) -> Self {
        self.games.entry(id.into()).or_default().playtime_minutes = minutes;
        self
    }

    pub fn completion(mut self, id: impl Into<GameId>, percent: f64) -> Self {
        self.games.entry(id.into()).or_default().completion_percent = percent;
        self
    }

    pub fn rating(mut self, id: impl Into<GameId>, rating: f64) -> Self {
        self.games.entry(id.into()).or_default().rating = rating;
        self
    }

    pub fn screenshots(mut self, id: impl Into<GameId>, count: u32) -> Self {
        self.games.entry(id.into()).or_default().screenshots = count;
        self
    }

    pub fn launches(mut self, id: impl Into<GameId>, count: u32) -> Self {
        self.games.entry(id.into()).or_default().launches = count;
        self
    }

    pub fn mods(mut self, count: usize) -> Self {
        self.mod_count = count;
        self
    }

    pub fn roadmap(mut self, total: usize, completed: usize) -> Self {
        self.roadmap_total = total;
        self.roadmap_completed = completed.min(total);
        self
    }

    pub fn groups(mut self, count: usize) -> Self {
        self.group_count = count;
        self
    }

    pub fn session(mut self, started_at: DateTime<Utc>, ended_at: Option<DateTime<Utc>>) -> Self {
        self.sessions.push(SessionRecord {
            started_at,
            ended_at,
        });
        self
    }

    pub fn build(mut self) -> StatsSnapshot {
        self.sessions.sort_by_key(|s| s.started_at);
        StatsSnapshot {
            games: self.games,
            mod_count: self.mod_count,
            roadmap_total: self.roadmap_total,
            roadmap_completed: self.roadmap_completed,
            group_count: self.group_count,
            sessions: self.sessions,
            offset: self.offset,
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn per_game_setters_grow_the_library() {
        let snapshot = StatsSnapshot::builder()
            .game("a")
            .playtime("b", 90)
            .launches("b", 3)
            .screenshots("c", 4)
            .build();

        assert_eq!(snapshot.library_size(), 3);
        assert_eq!(snapshot.total_playtime_minutes(), 90);
        assert_eq!(snapshot.launched_games(), 1);
        assert_eq!(snapshot.total_screenshots(), 4);
    }

    #[test]
    fn roadmap_completed_never_exceeds_total() {
        let snapshot = StatsSnapshot::builder().roadmap(2, 5).build();
        assert_eq!(snapshot.roadmap_completed(), 2);
    }

    #[test]
    fn session_dates_use_snapshot_offset() {
        // 23:30 UTC on the 1st is already the 2nd at UTC+2
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let utc = StatsSnapshot::builder().session(start, None).build();
        let plus_two = StatsSnapshot::builder()
            .utc_offset(FixedOffset::east_opt(2 * 3600).unwrap())
            .session(start, None)
            .build();

        assert_eq!(utc.session_dates(), vec![NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()]);
        assert_eq!(plus_two.session_dates(), vec![NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()]);
    }

    #[test]
    fn sessions_are_sorted_by_start() {
        let late = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let snapshot = StatsSnapshot::builder()
            .session(late, None)
            .session(early, None)
            .build();
        assert_eq!(snapshot.sessions()[0].started_at, early);
    }
}
