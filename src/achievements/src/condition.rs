//! Condition evaluators
//!
//! One pure rule per [`ConditionKind`]. Evaluators never look at stored
//! progress; monotonicity and permanence are enforced by the engine.

use crate::definition::{AchievementDefinition, ConditionKind};
use crate::snapshot::StatsSnapshot;
use chrono::{NaiveDate, Timelike};

/// Night window: [23:00, 05:00)
pub const NIGHT_START_HOUR: u32 = 23;
pub const NIGHT_END_HOUR: u32 = 5;
/// Morning window: [05:00, 08:00)
pub const MORNING_START_HOUR: u32 = 5;
pub const MORNING_END_HOUR: u32 = 8;

/// Result of checking one definition against one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub satisfied: bool,
    pub progress: f64,
}

impl Evaluation {
    fn threshold(value: f64, target: f64) -> Self {
        Self {
            satisfied: value >= target,
            progress: value,
        }
    }

    fn flag(hit: bool) -> Self {
        Self {
            satisfied: hit,
            progress: if hit { 1.0 } else { 0.0 },
        }
    }
}

/// Check a definition against a snapshot
pub fn evaluate(definition: &AchievementDefinition, snapshot: &StatsSnapshot) -> Evaluation {
    let target = definition.target_value;

    match definition.condition_kind {
        ConditionKind::Manual => Evaluation {
            satisfied: false,
            progress: 0.0,
        },
        ConditionKind::LibrarySize => Evaluation::threshold(snapshot.library_size() as f64, target),
        ConditionKind::ModsCount => Evaluation::threshold(snapshot.mod_count() as f64, target),
        ConditionKind::RoadmapCompleted => {
            Evaluation::threshold(snapshot.roadmap_completed() as f64, target)
        }
        ConditionKind::GamesLaunchedCount => {
            Evaluation::threshold(snapshot.launched_games() as f64, target)
        }
        ConditionKind::SingleGameLaunches => {
            Evaluation::threshold(f64::from(snapshot.max_launches()), target)
        }
        ConditionKind::PlayTimeHours => {
            let hours = snapshot.total_playtime_minutes() as f64 / 60.0;
            Evaluation {
                satisfied: hours >= target,
                progress: hours.floor(),
            }
        }
        ConditionKind::CompletionPercent => {
            Evaluation::threshold(snapshot.max_completion(), target)
        }
        ConditionKind::GamesCompleted => {
            Evaluation::threshold(snapshot.completed_games() as f64, target)
        }
        ConditionKind::GamesRated => Evaluation::threshold(snapshot.rated_games() as f64, target),
        ConditionKind::ScreenshotsCount => {
            Evaluation::threshold(snapshot.total_screenshots() as f64, target)
        }
        ConditionKind::GroupsCount => Evaluation::threshold(snapshot.group_count() as f64, target),
        ConditionKind::SessionCount => {
            Evaluation::threshold(snapshot.sessions().len() as f64, target)
        }
        ConditionKind::PlayAtNight => {
            Evaluation::flag(snapshot.local_starts().any(|t| is_night_hour(t.hour())))
        }
        ConditionKind::PlayAtMorning => {
            Evaluation::flag(snapshot.local_starts().any(|t| is_morning_hour(t.hour())))
        }
        ConditionKind::ConsecutiveDays => {
            Evaluation::threshold(f64::from(longest_streak(&snapshot.session_dates())), target)
        }
    }
}

pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

pub fn is_morning_hour(hour: u32) -> bool {
    (MORNING_START_HOUR..MORNING_END_HOUR).contains(&hour)
}

/// Longest run of consecutive calendar days.
///
/// Input order and duplicates do not matter.
pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    let mut days = dates.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }

    longest
}
