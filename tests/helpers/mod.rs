//! Test helpers and builders for launcher scenarios.
//!
//! Sets up deterministic libraries and throwaway data directories shared by
//! the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use game_launcher::library::Game;
use game_launcher::{Launcher, LauncherConfig, LibraryStore};
use tempfile::TempDir;

/// Noon UTC on 2024-03-01, the start of every scripted timeline
pub fn day_zero() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn at(day: i64, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap() + Duration::days(day)
}

/// Builder for scripted libraries
pub struct TestLibraryBuilder {
    store: LibraryStore,
}

impl TestLibraryBuilder {
    pub fn new() -> Self {
        Self {
            store: LibraryStore::new(),
        }
    }

    pub fn with_games(mut self, count: usize) -> Self {
        for i in 0..count {
            let id = format!("game-{}", i);
            self.store
                .add_game(Game::new(id.clone(), format!("Game {}", i)))
                .expect("add game");
        }
        self
    }

    /// One session per listed day at `hour`, all on game-0
    pub fn with_daily_sessions(mut self, days: &[i64], hour: u32) -> Self {
        for &day in days {
            let start = at(day, hour);
            self.store
                .record_session("game-0", start, Some(start + Duration::minutes(30)))
                .expect("record session");
        }
        self
    }

    pub fn build(self) -> LibraryStore {
        self.store
    }
}

/// A launcher over a fresh temporary data directory
pub struct TestLauncher {
    pub launcher: Launcher,
    pub dir: TempDir,
}

impl TestLauncher {
    pub fn new(library: LibraryStore) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let launcher = Launcher::with_library(config_for(&dir), library).expect("open launcher");
        Self { launcher, dir }
    }

    /// Reopen the launcher on the same data directory
    pub fn reopen(self, library: LibraryStore) -> Self {
        let TestLauncher { launcher, dir } = self;
        drop(launcher);
        let launcher = Launcher::with_library(config_for(&dir), library).expect("reopen launcher");
        Self { launcher, dir }
    }
}

pub fn config_for(dir: &TempDir) -> LauncherConfig {
    LauncherConfig {
        data_dir: dir.path().to_path_buf(),
        ..LauncherConfig::default()
    }
}

/// Route engine logs to the test output; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
