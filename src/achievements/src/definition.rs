//! Achievement definitions and condition kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The rule family an achievement is checked with.
///
/// The set is closed: custom definitions pick one of these by name and the
/// evaluator dispatches on it with a single exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Only unlocked by an explicit call
    Manual,
    LibrarySize,
    ModsCount,
    RoadmapCompleted,
    /// Distinct games launched at least once
    GamesLaunchedCount,
    /// Launches of the most launched game
    SingleGameLaunches,
    PlayTimeHours,
    /// Highest completion percent of any single game
    CompletionPercent,
    GamesCompleted,
    GamesRated,
    ScreenshotsCount,
    GroupsCount,
    SessionCount,
    /// A session started between 23:00 and 05:00
    PlayAtNight,
    /// A session started between 05:00 and 08:00
    PlayAtMorning,
    /// Longest run of calendar days with at least one session
    ConsecutiveDays,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 16] = [
        ConditionKind::Manual,
        ConditionKind::LibrarySize,
        ConditionKind::ModsCount,
        ConditionKind::RoadmapCompleted,
        ConditionKind::GamesLaunchedCount,
        ConditionKind::SingleGameLaunches,
        ConditionKind::PlayTimeHours,
        ConditionKind::CompletionPercent,
        ConditionKind::GamesCompleted,
        ConditionKind::GamesRated,
        ConditionKind::ScreenshotsCount,
        ConditionKind::GroupsCount,
        ConditionKind::SessionCount,
        ConditionKind::PlayAtNight,
        ConditionKind::PlayAtMorning,
        ConditionKind::ConsecutiveDays,
    ];

    /// External name used in exported files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Manual => "manual",
            ConditionKind::LibrarySize => "library_size",
            ConditionKind::ModsCount => "mods_count",
            ConditionKind::RoadmapCompleted => "roadmap_completed",
            ConditionKind::GamesLaunchedCount => "games_launched_count",
            ConditionKind::SingleGameLaunches => "single_game_launches",
            ConditionKind::PlayTimeHours => "play_time_hours",
            ConditionKind::CompletionPercent => "completion_percent",
            ConditionKind::GamesCompleted => "games_completed",
            ConditionKind::GamesRated => "games_rated",
            ConditionKind::ScreenshotsCount => "screenshots_count",
            ConditionKind::GroupsCount => "groups_count",
            ConditionKind::SessionCount => "session_count",
            ConditionKind::PlayAtNight => "play_at_night",
            ConditionKind::PlayAtMorning => "play_at_morning",
            ConditionKind::ConsecutiveDays => "consecutive_days",
        }
    }

    /// Whether the engine evaluates this kind automatically.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, ConditionKind::Manual)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unsupported condition kind `{}`", s))
    }
}

/// An achievement definition.
///
/// Definitions never change after creation; progress lives in the
/// [`ProgressStore`](crate::ProgressStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub points: u32,
    pub condition_kind: ConditionKind,
    /// Threshold for the condition, ignored by manual and time-window kinds
    pub target_value: f64,
    pub is_custom: bool,
}

impl AchievementDefinition {
    /// A built-in definition.
    pub fn builtin(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        points: u32,
        condition_kind: ConditionKind,
        target_value: f64,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            points,
            condition_kind,
            target_value,
            is_custom: false,
        }
    }
}

/// Get all built-in achievement definitions, in display order
pub fn builtin_achievements() -> Vec<AchievementDefinition> {
    use ConditionKind::*;

    vec![
        // Library
        AchievementDefinition::builtin("first_game", "First Steps", "Add your first game to the library", "🎮", 10, LibrarySize, 1.0),
        AchievementDefinition::builtin("collector", "Collector", "Have 10 games in your library", "📚", 20, LibrarySize, 10.0),
        AchievementDefinition::builtin("archivist", "Archivist", "Have 50 games in your library", "🏛️", 50, LibrarySize, 50.0),
        AchievementDefinition::builtin("organizer", "Organizer", "Create 3 game groups", "🗂️", 15, GroupsCount, 3.0),
        // Launching and sessions
        AchievementDefinition::builtin("first_launch", "Press Start", "Launch a game for the first time", "▶️", 10, GamesLaunchedCount, 1.0),
        AchievementDefinition::builtin("explorer", "Explorer", "Launch 10 different games", "🧭", 30, GamesLaunchedCount, 10.0),
        AchievementDefinition::builtin("devoted", "Devoted", "Launch the same game 25 times", "❤️", 25, SingleGameLaunches, 25.0),
        AchievementDefinition::builtin("regular", "Regular", "Record 50 play sessions", "📅", 25, SessionCount, 50.0),
        // Playtime
        AchievementDefinition::builtin("warming_up", "Warming Up", "Play for 10 hours in total", "⏱️", 10, PlayTimeHours, 10.0),
        AchievementDefinition::builtin("dedicated", "Dedicated", "Play for 100 hours in total", "⌛", 40, PlayTimeHours, 100.0),
        AchievementDefinition::builtin("night_owl", "Night Owl", "Start a session between 23:00 and 05:00", "🦉", 15, PlayAtNight, 1.0),
        AchievementDefinition::builtin("early_bird", "Early Bird", "Start a session between 05:00 and 08:00", "🐦", 15, PlayAtMorning, 1.0),
        AchievementDefinition::builtin("streak_week", "On a Roll", "Play on 7 consecutive days", "🔥", 30, ConsecutiveDays, 7.0),
        // Completion and ratings
        AchievementDefinition::builtin("halfway", "Halfway There", "Reach 50% completion in a game", "🏁", 10, CompletionPercent, 50.0),
        AchievementDefinition::builtin("finisher", "Finisher", "Complete a game", "🏆", 25, GamesCompleted, 1.0),
        AchievementDefinition::builtin("completionist", "Completionist", "Complete 10 games", "👑", 60, GamesCompleted, 10.0),
        AchievementDefinition::builtin("critic", "Critic", "Rate 10 games", "⭐", 15, GamesRated, 10.0),
        // Extras
        AchievementDefinition::builtin("photographer", "Photographer", "Take 50 screenshots", "📷", 15, ScreenshotsCount, 50.0),
        AchievementDefinition::builtin("modder", "Modder", "Install 5 mods", "🔧", 15, ModsCount, 5.0),
        AchievementDefinition::builtin("planner", "Planner", "Complete 5 roadmap items", "🗺️", 20, RoadmapCompleted, 5.0),
    ]
}
