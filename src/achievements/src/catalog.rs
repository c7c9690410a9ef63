//! Built-in and custom achievement catalog

use crate::definition::{AchievementDefinition, ConditionKind, builtin_achievements};
use error::AchievementError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A custom achievement in its external form.
///
/// This is both the authoring input for [`CatalogManager::add_custom`] and
/// the element type of the export file. `points` is signed and
/// `condition_kind` is free text so malformed input can be reported instead
/// of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAchievement {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub points: i64,
    pub condition_kind: String,
    #[serde(default)]
    pub target_value: f64,
}

impl CustomAchievement {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        condition_kind: ConditionKind,
        target_value: f64,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            points: 0,
            condition_kind: condition_kind.as_str().to_string(),
            target_value,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    /// Check every field and build the definition
    pub fn validate(&self) -> Result<AchievementDefinition, AchievementError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(AchievementError::validation(&self.key, "key is required"));
        }
        if key != self.key {
            return Err(AchievementError::validation(
                &self.key,
                "key must not start or end with whitespace",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AchievementError::validation(key, "name is required"));
        }
        if self.condition_kind.trim().is_empty() {
            return Err(AchievementError::validation(key, "condition kind is required"));
        }
        let condition_kind: ConditionKind = self
            .condition_kind
            .parse()
            .map_err(|reason: String| AchievementError::validation(key, reason))?;
        if self.points < 0 {
            return Err(AchievementError::validation(key, "points must not be negative"));
        }
        let points = u32::try_from(self.points)
            .map_err(|_| AchievementError::validation(key, "points value is too large"))?;
        if !self.target_value.is_finite() || self.target_value < 0.0 {
            return Err(AchievementError::validation(
                key,
                "target value must be a non-negative number",
            ));
        }

        Ok(AchievementDefinition {
            key: self.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            points,
            condition_kind,
            target_value: self.target_value,
            is_custom: true,
        })
    }
}

impl From<&AchievementDefinition> for CustomAchievement {
    fn from(def: &AchievementDefinition) -> Self {
        Self {
            key: def.key.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            icon: def.icon.clone(),
            points: i64::from(def.points),
            condition_kind: def.condition_kind.as_str().to_string(),
            target_value: def.target_value,
        }
    }
}

/// What to do when an imported key already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    /// Replace an existing custom definition. Built-in keys are never replaced.
    Overwrite,
}

/// One entry refused by an import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRejection {
    /// Position in the imported list
    pub index: usize,
    pub key: Option<String>,
    pub error: AchievementError,
}

/// Per-entry outcome of an import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    /// Keys added or overwritten, in input order
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub rejected: Vec<ImportRejection>,
}

impl ImportSummary {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Ordered catalog: built-ins first, then custom definitions in insertion order
#[derive(Debug, Clone)]
pub struct CatalogManager {
    builtin: Vec<AchievementDefinition>,
    custom: Vec<AchievementDefinition>,
}

impl CatalogManager {
    /// Catalog seeded with the shipped built-in achievements
    pub fn new() -> Self {
        Self::with_builtin(builtin_achievements())
    }

    /// Catalog with a caller-chosen built-in set (duplicate keys keep the first)
    pub fn with_builtin(builtin: Vec<AchievementDefinition>) -> Self {
        let mut seeded: Vec<AchievementDefinition> = Vec::with_capacity(builtin.len());
        for mut def in builtin {
            if seeded.iter().any(|d| d.key == def.key) {
                tracing::warn!(key = %def.key, "duplicate built-in achievement ignored");
                continue;
            }
            def.is_custom = false;
            seeded.push(def);
        }
        Self {
            builtin: seeded,
            custom: Vec::new(),
        }
    }

    /// Catalog with no built-ins
    pub fn empty() -> Self {
        Self::with_builtin(Vec::new())
    }

    /// Restore previously saved custom definitions.
    ///
    /// Entries that no longer validate are dropped and returned as rejections.
    pub fn restore_custom(&mut self, saved: Vec<CustomAchievement>) -> ImportSummary {
        let payload: Vec<Value> = saved
            .into_iter()
            .filter_map(|entry| serde_json::to_value(entry).ok())
            .collect();
        self.import_values(payload, ConflictPolicy::Skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn list_all(&self) -> Vec<&AchievementDefinition> {
        self.iter().collect()
    }

    pub fn list_builtin(&self) -> &[AchievementDefinition] {
        &self.builtin
    }

    pub fn list_custom(&self) -> &[AchievementDefinition] {
        &self.custom
    }

    pub fn get(&self, key: &str) -> Option<&AchievementDefinition> {
        self.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_builtin(&self, key: &str) -> bool {
        self.builtin.iter().any(|d| d.key == key)
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of points over the whole catalog
    pub fn total_points(&self) -> u64 {
        self.iter().map(|d| u64::from(d.points)).sum()
    }

    /// Validate and append a custom definition
    pub fn add_custom(
        &mut self,
        draft: CustomAchievement,
    ) -> Result<&AchievementDefinition, AchievementError> {
        let def = draft.validate()?;
        if self.is_builtin(&def.key) {
            return Err(AchievementError::Conflict(def.key));
        }
        if self.custom.iter().any(|d| d.key == def.key) {
            return Err(AchievementError::validation(def.key, "key already exists"));
        }

        self.custom.push(def);
        let index = self.custom.len() - 1;
        Ok(&self.custom[index])
    }

    /// Remove a custom definition.
    ///
    /// Built-in keys fail with `Conflict` rather than `NotFound`, so callers can
    /// tell "cannot remove" from "no such achievement".
    pub fn remove_custom(&mut self, key: &str) -> Result<AchievementDefinition, AchievementError> {
        if self.is_builtin(key) {
            return Err(AchievementError::Conflict(key.to_string()));
        }
        let index = self
            .custom
            .iter()
            .position(|d| d.key == key)
            .ok_or_else(|| AchievementError::NotFound(key.to_string()))?;
        Ok(self.custom.remove(index))
    }

    /// Custom definitions in their external form, insertion order
    pub fn export_records(&self) -> Vec<CustomAchievement> {
        self.custom.iter().map(CustomAchievement::from).collect()
    }

    /// Custom definitions as a pretty-printed JSON array
    pub fn export_custom(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export_records())
    }

    /// Import a JSON array of custom definitions.
    ///
    /// Each entry is accepted or refused on its own. Only a payload that is
    /// not a JSON array fails the whole call, and then nothing changes.
    pub fn import_custom(
        &mut self,
        payload: &str,
        policy: ConflictPolicy,
    ) -> Result<ImportSummary, AchievementError> {
        let entries: Vec<Value> = serde_json::from_str(payload).map_err(|err| {
            AchievementError::validation("", format!("import payload is not a list: {}", err))
        })?;
        Ok(self.import_values(entries, policy))
    }

    fn import_values(&mut self, entries: Vec<Value>, policy: ConflictPolicy) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for (index, value) in entries.into_iter().enumerate() {
            let key_hint = value.get("key").and_then(Value::as_str).map(str::to_owned);
            let reject = |error: AchievementError| ImportRejection {
                index,
                key: key_hint.clone(),
                error,
            };

            let draft: CustomAchievement = match serde_json::from_value(value) {
                Ok(draft) => draft,
                Err(err) => {
                    let key = key_hint.clone().unwrap_or_default();
                    summary
                        .rejected
                        .push(reject(AchievementError::validation(key, err.to_string())));
                    continue;
                }
            };
            let def = match draft.validate() {
                Ok(def) => def,
                Err(err) => {
                    summary.rejected.push(reject(err));
                    continue;
                }
            };

            if self.is_builtin(&def.key) {
                match policy {
                    ConflictPolicy::Skip => summary.skipped.push(def.key),
                    ConflictPolicy::Overwrite => summary
                        .rejected
                        .push(reject(AchievementError::Conflict(def.key))),
                }
                continue;
            }

            match self.custom.iter().position(|d| d.key == def.key) {
                Some(existing) => match policy {
                    ConflictPolicy::Skip => summary.skipped.push(def.key),
                    ConflictPolicy::Overwrite => {
                        summary.imported.push(def.key.clone());
                        self.custom[existing] = def;
                    }
                },
                None => {
                    summary.imported.push(def.key.clone());
                    self.custom.push(def);
                }
            }
        }

        for rejection in &summary.rejected {
            tracing::warn!(index = rejection.index, error = %rejection.error, "custom achievement rejected");
        }
        summary
    }
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self::new()
    }
}
