//! Launcher facade
//!
//! Ties the collaborator store, the achievement engine and the on-disk
//! achievement store together. All engine access goes through here so there
//! is a single owner; hosts sharing a `Launcher` across threads wrap it in a
//! `Mutex`.

use crate::config::LauncherConfig;
use crate::library::{LibraryStore, collect_snapshot};
use achievements::{
    AchievementEngine, AchievementEvent, AchievementSummary, CatalogManager, ChangeToken, ConflictPolicy,
    CustomAchievement, EvaluationReport, EventListener, ImportSummary, StatsSnapshot,
};
use anyhow::{Context, Result};
use chrono::FixedOffset;
use error::{AchievementError, StoreError};
use save::AchievementStore;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Keeps the most recent notifications for the UI to pick up
#[derive(Clone)]
pub struct NotificationLog {
    events: Arc<Mutex<VecDeque<AchievementEvent>>>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    pub fn drain(&self) -> Vec<AchievementEvent> {
        match self.events.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventListener for NotificationLog {
    fn handle(&mut self, event: &AchievementEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| anyhow::anyhow!("notification log poisoned"))?;
        if self.capacity == 0 {
            return Ok(());
        }
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "notification_log"
    }
}

pub struct Launcher {
    config: LauncherConfig,
    offset: FixedOffset,
    library: LibraryStore,
    engine: AchievementEngine,
    store: AchievementStore,
    notifications: NotificationLog,
    /// Bumped whenever the library is handed out for writing or replaced
    generation: u64,
    /// A state change has not reached disk yet
    unsaved: bool,
}

impl Launcher {
    /// Open the launcher, restoring saved achievements from `config.data_dir`
    pub fn open(config: LauncherConfig) -> Result<Self> {
        Self::with_library(config, LibraryStore::new())
    }

    pub fn with_library(config: LauncherConfig, library: LibraryStore) -> Result<Self> {
        let offset = config.utc_offset()?;
        let store = AchievementStore::new(&config.data_dir)
            .context("Failed to open achievement store")?;
        let mut engine = store
            .load_engine(CatalogManager::new())
            .context("Failed to load achievements")?;

        let notifications = NotificationLog::new(config.notification_history);
        engine.subscribe(Box::new(notifications.clone()));

        tracing::info!(
            achievements = engine.catalog().len(),
            unlocked = engine.unlocked_count(),
            "launcher opened"
        );

        Ok(Self {
            config,
            offset,
            library,
            engine,
            store,
            notifications,
            generation: 0,
            unsaved: false,
        })
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn library(&self) -> &LibraryStore {
        &self.library
    }

    /// Mutable library access; the next refresh always sees a new change token
    pub fn library_mut(&mut self) -> &mut LibraryStore {
        self.generation = self.generation.wrapping_add(1);
        &mut self.library
    }

    /// Swap in a freshly loaded library
    pub fn replace_library(&mut self, library: LibraryStore) -> LibraryStore {
        self.generation = self.generation.wrapping_add(1);
        self.engine.invalidate_cache();
        std::mem::replace(&mut self.library, library)
    }

    /// Change token for the current library state.
    ///
    /// A loaded or rebuilt `LibraryStore` restarts its version at zero, so the
    /// launcher's own generation is folded in.
    pub fn change_token(&self) -> ChangeToken {
        self.generation.rotate_left(32) ^ self.library.version()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn engine(&self) -> &AchievementEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        collect_snapshot(&self.library, self.offset)
    }

    /// Re-evaluate achievements if the library changed since the last call
    pub fn refresh(&mut self) -> Result<EvaluationReport> {
        self.run_evaluation(false)
    }

    /// Re-evaluate achievements even if nothing changed
    pub fn force_refresh(&mut self) -> Result<EvaluationReport> {
        self.run_evaluation(true)
    }

    fn run_evaluation(&mut self, force: bool) -> Result<EvaluationReport> {
        let snapshot = self.snapshot();
        let token = self.change_token();
        let report = self.engine.evaluate(&snapshot, token, force);
        // A failed save is retried on the next refresh, cache hit or not
        if self.config.save_on_change && (report.changed_state() || self.unsaved) {
            self.save()?;
        }
        Ok(report)
    }

    pub fn unlock(&mut self, key: &str) -> Result<bool> {
        let changed = self.engine.unlock(key)?;
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    pub fn lock(&mut self, key: &str) -> Result<bool> {
        let changed = self.engine.lock(key)?;
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    pub fn add_custom(&mut self, draft: CustomAchievement) -> Result<()> {
        self.engine.add_custom(draft)?;
        self.save()
    }

    pub fn remove_custom(&mut self, key: &str) -> Result<()> {
        self.engine.remove_custom(key)?;
        self.save()
    }

    /// Import custom achievements; `None` uses the configured policy
    pub fn import_custom(
        &mut self,
        payload: &str,
        policy: Option<ConflictPolicy>,
    ) -> Result<ImportSummary> {
        let policy = policy.unwrap_or(self.config.import_policy);
        let summary = self.engine.import_custom(payload, policy)?;
        if summary.imported_count() > 0 {
            self.save()?;
        }
        Ok(summary)
    }

    pub fn export_custom(&self) -> Result<String> {
        Ok(self.engine.export_custom()?)
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        save::export_to_file(&self.engine, path)?;
        Ok(())
    }

    pub fn import_from_file(
        &mut self,
        path: impl AsRef<Path>,
        policy: Option<ConflictPolicy>,
    ) -> Result<ImportSummary> {
        let policy = policy.unwrap_or(self.config.import_policy);
        let summary = save::import_from_file(&mut self.engine, path, policy)?;
        if summary.imported_count() > 0 {
            self.save()?;
        }
        Ok(summary)
    }

    /// Save point: persist custom achievements and progress
    pub fn save(&mut self) -> Result<()> {
        self.unsaved = true;
        self.store
            .save(&self.engine)
            .context("Failed to save achievements")?;
        self.unsaved = false;
        Ok(())
    }

    /// Notifications since the last call
    pub fn drain_notifications(&self) -> Vec<AchievementEvent> {
        self.notifications.drain()
    }

    /// Display lines for pending notifications
    pub fn notification_messages(&self) -> Vec<String> {
        self.drain_notifications()
            .into_iter()
            .filter_map(|event| match event {
                AchievementEvent::Unlocked { key } => self
                    .engine
                    .catalog()
                    .get(&key)
                    .map(|def| format!("Achievement unlocked: {} (+{})", def.name, def.points)),
                AchievementEvent::CatalogChanged => None,
            })
            .collect()
    }

    pub fn summary(&self) -> AchievementSummary {
        self.engine.summary()
    }

    pub fn longest_streak(&self) -> u32 {
        self.engine.longest_streak(&self.snapshot())
    }
}

/// Message to show the user for a launcher error, if it should be shown at all
pub fn display_error(err: &anyhow::Error) -> Option<String> {
    if let Some(achievement) = err.downcast_ref::<AchievementError>() {
        return achievement
            .is_user_facing()
            .then(|| error::user_message(achievement));
    }
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .map(error::store_message)
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("data_dir", &self.config.data_dir)
            .field("change_token", &self.change_token())
            .field("unsaved", &self.unsaved)
            .field("engine", &self.engine)
            .finish()
    }
}
