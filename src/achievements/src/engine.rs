//! The achievement engine
//!
//! Owns the catalog, the progress store and the notification sink, and is
//! the only thing allowed to change unlock state.

use crate::catalog::{CatalogManager, ConflictPolicy, CustomAchievement, ImportSummary};
use crate::condition::{self, longest_streak};
use crate::definition::AchievementDefinition;
use crate::events::{AchievementEvent, EventListener, EventSink};
use crate::progress::{AchievementProgress, ProgressStore};
use crate::snapshot::StatsSnapshot;
use chrono::{DateTime, Utc};
use error::AchievementError;
use serde::Serialize;

/// Caller-supplied value that changes whenever source data changes
pub type ChangeToken = u64;

/// Outcome of one `evaluate` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub token: ChangeToken,
    /// Keys unlocked by this pass, catalog order
    pub newly_unlocked: Vec<String>,
    /// Locked keys whose progress went up
    pub advanced: Vec<String>,
    /// True when the report was served from cache without evaluating
    pub from_cache: bool,
}

impl EvaluationReport {
    pub fn changed_state(&self) -> bool {
        !self.from_cache && (!self.newly_unlocked.is_empty() || !self.advanced.is_empty())
    }
}

#[derive(Debug, Clone)]
struct EngineCache {
    token: ChangeToken,
    report: EvaluationReport,
}

/// A definition joined with its progress, for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementView<'a> {
    pub definition: &'a AchievementDefinition,
    pub progress: &'a AchievementProgress,
}

impl AchievementView<'_> {
    /// Progress bar fill in [0.0, 1.0]
    pub fn fraction(&self) -> f64 {
        if self.progress.unlocked {
            return 1.0;
        }
        let target = self.definition.target_value;
        if target <= 0.0 {
            return 0.0;
        }
        (self.progress.current_progress / target).clamp(0.0, 1.0)
    }
}

/// Aggregate numbers for a stats panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AchievementSummary {
    pub total: usize,
    pub unlocked: usize,
    pub completion_rate: f64,
    pub points_earned: u64,
    pub points_available: u64,
}

pub struct AchievementEngine {
    catalog: CatalogManager,
    progress: ProgressStore,
    cache: Option<EngineCache>,
    events: EventSink,
}

impl AchievementEngine {
    /// Build an engine over an existing catalog and progress store.
    ///
    /// Every catalog key gets a progress entry and progress for keys the
    /// catalog no longer has is dropped.
    pub fn new(catalog: CatalogManager, mut progress: ProgressStore) -> Self {
        let pruned = progress.retain_keys(|key| catalog.contains(key));
        if pruned > 0 {
            tracing::debug!(pruned, "dropped progress for unknown achievements");
        }
        for def in catalog.iter() {
            progress.seed(&def.key);
        }

        Self {
            catalog,
            progress,
            cache: None,
            events: EventSink::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogManager {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn progress_of(&self, key: &str) -> Result<&AchievementProgress, AchievementError> {
        self.progress
            .get(key)
            .filter(|_| self.catalog.contains(key))
            .ok_or_else(|| AchievementError::NotFound(key.to_string()))
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.progress.get(key).is_some_and(|p| p.unlocked)
    }

    pub fn view(&self, key: &str) -> Result<AchievementView<'_>, AchievementError> {
        let definition = self
            .catalog
            .get(key)
            .ok_or_else(|| AchievementError::NotFound(key.to_string()))?;
        let progress = self.progress_of(key)?;
        Ok(AchievementView {
            definition,
            progress,
        })
    }

    /// All achievements in catalog order
    pub fn views(&self) -> Vec<AchievementView<'_>> {
        self.catalog
            .iter()
            .filter_map(|definition| {
                self.progress.get(&definition.key).map(|progress| AchievementView {
                    definition,
                    progress,
                })
            })
            .collect()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.events.subscribe(listener);
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Forget the cached report so the next `evaluate` runs in full
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    /// Evaluate every locked automatic achievement against `snapshot`.
    ///
    /// With an unchanged `token` and `force == false` the previous report is
    /// returned without running any evaluator.
    pub fn evaluate(
        &mut self,
        snapshot: &StatsSnapshot,
        token: ChangeToken,
        force: bool,
    ) -> EvaluationReport {
        self.evaluate_at(snapshot, token, force, Utc::now())
    }

    /// [`evaluate`](Self::evaluate) with an explicit unlock time
    pub fn evaluate_at(
        &mut self,
        snapshot: &StatsSnapshot,
        token: ChangeToken,
        force: bool,
        now: DateTime<Utc>,
    ) -> EvaluationReport {
        if !force {
            if let Some(cache) = self.cache.as_ref().filter(|c| c.token == token) {
                tracing::trace!(token, "achievement evaluation served from cache");
                return EvaluationReport {
                    from_cache: true,
                    ..cache.report.clone()
                };
            }
        }

        let mut report = EvaluationReport {
            token,
            ..EvaluationReport::default()
        };

        for def in self.catalog.iter() {
            if !def.condition_kind.is_automatic() {
                continue;
            }
            let entry = self.progress.seed(&def.key);
            if entry.unlocked {
                continue;
            }

            let result = condition::evaluate(def, snapshot);
            let advanced = entry.advance(result.progress);
            if result.satisfied {
                entry.unlock(now);
                report.newly_unlocked.push(def.key.clone());
            } else if advanced {
                report.advanced.push(def.key.clone());
            }
        }

        tracing::debug!(
            token,
            unlocked = report.newly_unlocked.len(),
            advanced = report.advanced.len(),
            "achievements evaluated"
        );

        self.cache = Some(EngineCache {
            token,
            report: report.clone(),
        });

        for key in &report.newly_unlocked {
            tracing::info!(key = %key, "achievement unlocked");
            self.events
                .publish(&AchievementEvent::Unlocked { key: key.clone() });
        }

        report
    }

    /// Unlock an achievement by hand, whatever its condition.
    ///
    /// Returns false if it was already unlocked.
    pub fn unlock(&mut self, key: &str) -> Result<bool, AchievementError> {
        self.unlock_at(key, Utc::now())
    }

    pub fn unlock_at(&mut self, key: &str, now: DateTime<Utc>) -> Result<bool, AchievementError> {
        let def = self
            .catalog
            .get(key)
            .ok_or_else(|| AchievementError::NotFound(key.to_string()))?;
        let entry = self.progress.seed(key);
        if entry.unlocked {
            return Ok(false);
        }

        if !def.condition_kind.is_automatic() {
            entry.advance(1.0);
        }
        entry.unlock(now);
        self.cache = None;

        tracing::info!(key, "achievement unlocked manually");
        self.events
            .publish(&AchievementEvent::Unlocked { key: key.to_string() });
        Ok(true)
    }

    /// Reset an achievement to locked with no progress.
    ///
    /// Returns false if it was already locked.
    pub fn lock(&mut self, key: &str) -> Result<bool, AchievementError> {
        if !self.catalog.contains(key) {
            return Err(AchievementError::NotFound(key.to_string()));
        }
        let entry = self.progress.seed(key);
        if entry.is_locked() {
            return Ok(false);
        }

        entry.lock();
        self.cache = None;
        tracing::info!(key, "achievement locked");
        Ok(true)
    }

    /// Add a custom achievement and start tracking it
    pub fn add_custom(&mut self, draft: CustomAchievement) -> Result<(), AchievementError> {
        let key = self.catalog.add_custom(draft)?.key.clone();
        self.progress.reset(&key);
        self.catalog_changed();
        tracing::info!(key = %key, "custom achievement added");
        Ok(())
    }

    /// Remove a custom achievement and its progress
    pub fn remove_custom(&mut self, key: &str) -> Result<AchievementDefinition, AchievementError> {
        let removed = self.catalog.remove_custom(key)?;
        self.progress.remove(key);
        self.catalog_changed();
        tracing::info!(key, "custom achievement removed");
        Ok(removed)
    }

    /// Import custom achievements; see [`CatalogManager::import_custom`].
    ///
    /// Imported and overwritten entries start locked.
    pub fn import_custom(
        &mut self,
        payload: &str,
        policy: ConflictPolicy,
    ) -> Result<ImportSummary, AchievementError> {
        let summary = self.catalog.import_custom(payload, policy)?;
        for key in &summary.imported {
            self.progress.reset(key);
        }
        if !summary.imported.is_empty() {
            self.catalog_changed();
        }
        tracing::info!(
            imported = summary.imported_count(),
            skipped = summary.skipped_count(),
            rejected = summary.rejected_count(),
            "custom achievements imported"
        );
        Ok(summary)
    }

    pub fn export_custom(&self) -> Result<String, serde_json::Error> {
        self.catalog.export_custom()
    }

    fn catalog_changed(&mut self) {
        self.cache = None;
        self.events.publish(&AchievementEvent::CatalogChanged);
    }

    pub fn unlocked_count(&self) -> usize {
        self.catalog
            .iter()
            .filter(|def| self.is_unlocked(&def.key))
            .count()
    }

    /// Unlocked / total, 0.0 for an empty catalog
    pub fn completion_rate(&self) -> f64 {
        let total = self.catalog.len();
        if total == 0 {
            return 0.0;
        }
        self.unlocked_count() as f64 / total as f64
    }

    pub fn total_points_earned(&self) -> u64 {
        self.catalog
            .iter()
            .filter(|def| self.is_unlocked(&def.key))
            .map(|def| u64::from(def.points))
            .sum()
    }

    /// Longest run of consecutive play days in `snapshot`
    pub fn longest_streak(&self, snapshot: &StatsSnapshot) -> u32 {
        longest_streak(&snapshot.session_dates())
    }

    pub fn summary(&self) -> AchievementSummary {
        AchievementSummary {
            total: self.catalog.len(),
            unlocked: self.unlocked_count(),
            completion_rate: self.completion_rate(),
            points_earned: self.total_points_earned(),
            points_available: self.catalog.total_points(),
        }
    }
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::new(CatalogManager::new(), ProgressStore::new())
    }
}

impl std::fmt::Debug for AchievementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementEngine")
            .field("achievements", &self.catalog.len())
            .field("unlocked", &self.unlocked_count())
            .field("cached_token", &self.cache.as_ref().map(|c| c.token))
            .field("events", &self.events)
            .finish()
    }
}
