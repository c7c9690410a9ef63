//! Collaborator data the achievement engine reads from
//!
//! The launcher's library, session log, mod list, roadmap, groups and
//! screenshots. The engine only ever sees them through [`collect_snapshot`].

use achievements::{GameId, SnapshotBuilder, StatsSnapshot};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("game `{0}` is not in the library")]
    UnknownGame(GameId),
    #[error("game `{0}` is already in the library")]
    DuplicateGame(GameId),
    #[error("roadmap item `{0}` does not exist")]
    UnknownRoadmapItem(String),
    #[error("session for `{0}` ends before it starts")]
    InvalidSession(GameId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub playtime_minutes: u64,
    pub completion_percent: f64,
    pub rating: f64,
    pub launch_count: u32,
}

impl Game {
    pub fn new(id: impl Into<GameId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            playtime_minutes: 0,
            completion_percent: 0.0,
            rating: 0.0,
            launch_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySession {
    pub game_id: GameId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModEntry {
    pub game_id: GameId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub game_ids: Vec<GameId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub game_id: GameId,
    pub path: PathBuf,
}

pub trait GameSource {
    fn games(&self) -> &[Game];
}

pub trait SessionSource {
    fn sessions(&self) -> &[PlaySession];
}

pub trait ModSource {
    fn mod_count(&self) -> usize;
}

pub trait RoadmapSource {
    /// (total, completed)
    fn roadmap_progress(&self) -> (usize, usize);
}

pub trait GroupSource {
    fn group_count(&self) -> usize;
}

pub trait ScreenshotSource {
    fn screenshot_counts(&self) -> BTreeMap<GameId, u32>;
}

/// Everything a snapshot is collected from
pub trait ActivitySources:
    GameSource + SessionSource + ModSource + RoadmapSource + GroupSource + ScreenshotSource
{
}

impl<T> ActivitySources for T where
    T: GameSource + SessionSource + ModSource + RoadmapSource + GroupSource + ScreenshotSource
{
}

/// Aggregate collaborator data into a snapshot.
///
/// Screenshots of games no longer in the library are ignored.
pub fn collect_snapshot<S: ActivitySources + ?Sized>(
    sources: &S,
    offset: FixedOffset,
) -> StatsSnapshot {
    let screenshots = sources.screenshot_counts();
    let (roadmap_total, roadmap_completed) = sources.roadmap_progress();

    let mut builder = SnapshotBuilder::new()
        .utc_offset(offset)
        .mods(sources.mod_count())
        .roadmap(roadmap_total, roadmap_completed)
        .groups(sources.group_count());

    for game in sources.games() {
        builder = builder.game_stats(
            game.id.clone(),
            achievements::GameStats {
                playtime_minutes: game.playtime_minutes,
                completion_percent: game.completion_percent,
                rating: game.rating,
                screenshots: screenshots.get(&game.id).copied().unwrap_or(0),
                launches: game.launch_count,
            },
        );
    }
    for session in sources.sessions() {
        builder = builder.session(session.started_at, session.ended_at);
    }

    builder.build()
}

/// In-memory collaborator store.
///
/// `version()` goes up on every mutation and is used as the engine's change
/// token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryStore {
    games: Vec<Game>,
    sessions: Vec<PlaySession>,
    mods: Vec<ModEntry>,
    roadmap: Vec<RoadmapItem>,
    groups: Vec<Group>,
    screenshots: Vec<Screenshot>,
    #[serde(skip)]
    version: u64,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn game(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    fn game_mut(&mut self, id: &str) -> Result<&mut Game, LibraryError> {
        self.games
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| LibraryError::UnknownGame(id.to_string()))
    }

    pub fn add_game(&mut self, game: Game) -> Result<(), LibraryError> {
        if self.game(&game.id).is_some() {
            return Err(LibraryError::DuplicateGame(game.id));
        }
        self.games.push(game);
        self.touch();
        Ok(())
    }

    /// Remove a game with its sessions, mods and screenshots
    pub fn remove_game(&mut self, id: &str) -> Result<Game, LibraryError> {
        let index = self
            .games
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| LibraryError::UnknownGame(id.to_string()))?;
        let game = self.games.remove(index);
        self.sessions.retain(|s| s.game_id != id);
        self.mods.retain(|m| m.game_id != id);
        self.screenshots.retain(|s| s.game_id != id);
        for group in &mut self.groups {
            group.game_ids.retain(|g| g != id);
        }
        self.touch();
        Ok(game)
    }

    pub fn record_launch(&mut self, id: &str) -> Result<(), LibraryError> {
        let game = self.game_mut(id)?;
        game.launch_count = game.launch_count.saturating_add(1);
        self.touch();
        Ok(())
    }

    /// Log a session; finished sessions add their length to the game's playtime
    pub fn record_session(
        &mut self,
        id: &str,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<(), LibraryError> {
        if ended_at.is_some_and(|end| end < started_at) {
            return Err(LibraryError::InvalidSession(id.to_string()));
        }
        let game = self.game_mut(id)?;
        if let Some(end) = ended_at {
            let minutes = u64::try_from((end - started_at).num_minutes()).unwrap_or(0);
            game.playtime_minutes = game.playtime_minutes.saturating_add(minutes);
        }
        self.sessions.push(PlaySession {
            game_id: id.to_string(),
            started_at,
            ended_at,
        });
        self.touch();
        Ok(())
    }

    pub fn set_completion(&mut self, id: &str, percent: f64) -> Result<(), LibraryError> {
        self.game_mut(id)?.completion_percent = percent.clamp(0.0, 100.0);
        self.touch();
        Ok(())
    }

    pub fn set_rating(&mut self, id: &str, rating: f64) -> Result<(), LibraryError> {
        self.game_mut(id)?.rating = rating.max(0.0);
        self.touch();
        Ok(())
    }

    pub fn add_mod(&mut self, id: &str, name: impl Into<String>) -> Result<(), LibraryError> {
        self.game_mut(id)?;
        self.mods.push(ModEntry {
            game_id: id.to_string(),
            name: name.into(),
        });
        self.touch();
        Ok(())
    }

    pub fn add_roadmap_item(&mut self, id: impl Into<String>, title: impl Into<String>) {
        self.roadmap.push(RoadmapItem {
            id: id.into(),
            title: title.into(),
            completed: false,
        });
        self.touch();
    }

    pub fn complete_roadmap_item(&mut self, id: &str) -> Result<(), LibraryError> {
        let item = self
            .roadmap
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| LibraryError::UnknownRoadmapItem(id.to_string()))?;
        item.completed = true;
        self.touch();
        Ok(())
    }

    pub fn add_group(&mut self, name: impl Into<String>, game_ids: Vec<GameId>) {
        self.groups.push(Group {
            name: name.into(),
            game_ids,
        });
        self.touch();
    }

    pub fn add_screenshot(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<(), LibraryError> {
        self.game_mut(id)?;
        self.screenshots.push(Screenshot {
            game_id: id.to_string(),
            path: path.into(),
        });
        self.touch();
        Ok(())
    }
}

impl GameSource for LibraryStore {
    fn games(&self) -> &[Game] {
        &self.games
    }
}

impl SessionSource for LibraryStore {
    fn sessions(&self) -> &[PlaySession] {
        &self.sessions
    }
}

impl ModSource for LibraryStore {
    fn mod_count(&self) -> usize {
        self.mods.len()
    }
}

impl RoadmapSource for LibraryStore {
    fn roadmap_progress(&self) -> (usize, usize) {
        let completed = self.roadmap.iter().filter(|i| i.completed).count();
        (self.roadmap.len(), completed)
    }
}

impl GroupSource for LibraryStore {
    fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl ScreenshotSource for LibraryStore {
    fn screenshot_counts(&self) -> BTreeMap<GameId, u32> {
        let mut counts = BTreeMap::new();
        for shot in &self.screenshots {
            let count: &mut u32 = counts.entry(shot.game_id.clone()).or_default();
            *count = count.saturating_add(1);
        }
        counts
    }
}
