// src/save/src/lib.rs

use achievements::{
    AchievementEngine, CatalogManager, ConflictPolicy, CustomAchievement, ImportSummary,
    ProgressStore,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use error::{AchievementError, StoreError};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

/// Current save format version
pub const SAVE_VERSION: u32 = 2;

const SAVE_FILE: &str = "achievements.sav";

/// 成就存档数据（自定义成就 + 进度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementSave {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// Custom definitions in export form, insertion order
    pub custom: Vec<CustomAchievement>,
    pub progress: ProgressStore,
}

impl AchievementSave {
    /// Capture the engine's persistent state
    pub fn capture(engine: &AchievementEngine) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            custom: engine.catalog().export_records(),
            progress: engine.progress().clone(),
        }
    }

    /// Migrate legacy save data to current version
    pub fn migrate(&mut self) {
        if self.version < SAVE_VERSION {
            match self.version {
                1 => {
                    // v1 wrote unlocked entries without a timestamp
                    let saved_at = self.saved_at;
                    let entries = std::mem::take(&mut self.progress)
                        .iter()
                        .map(|(key, progress)| {
                            let mut progress = progress.clone();
                            if progress.unlocked && progress.unlocked_at.is_none() {
                                progress.unlocked_at = Some(saved_at);
                            }
                            (key.to_string(), progress)
                        })
                        .collect::<Vec<_>>();
                    self.progress = ProgressStore::from_entries(entries);
                    self.version = 2;
                }
                _ => {
                    // Unknown version, left for validate() to refuse
                }
            }
        }
    }

    /// Validate save data integrity
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.version != SAVE_VERSION {
            return Err(StoreError::VersionMismatch(self.version));
        }
        for (key, progress) in self.progress.iter() {
            if !progress.current_progress.is_finite() || progress.current_progress < 0.0 {
                return Err(anyhow::anyhow!("Invalid progress value for {}", key).into());
            }
        }
        Ok(())
    }

    /// Rebuild an engine on top of the given built-in catalog.
    ///
    /// Custom entries that no longer validate (e.g. a built-in took their key)
    /// are dropped and reported, together with their saved progress.
    pub fn restore(self, mut catalog: CatalogManager) -> (AchievementEngine, ImportSummary) {
        let summary = catalog.restore_custom(self.custom);
        let mut dropped: HashSet<&str> = HashSet::new();
        for key in &summary.skipped {
            tracing::warn!(key = %key, "saved custom achievement shadowed by a built-in");
            dropped.insert(key.as_str());
        }
        for rejection in &summary.rejected {
            tracing::warn!(key = ?rejection.key, error = %rejection.error, "saved custom achievement dropped");
            if let Some(key) = &rejection.key {
                dropped.insert(key.as_str());
            }
        }
        for key in &summary.imported {
            dropped.remove(key.as_str());
        }

        let progress = ProgressStore::from_entries(
            self.progress
                .iter()
                .filter(|(key, _)| !dropped.contains(key))
                .map(|(key, entry)| (key.to_string(), entry.clone())),
        );
        (AchievementEngine::new(catalog, progress), summary)
    }
}

/// 成就存档系统
#[derive(Debug, Clone)]
pub struct AchievementStore {
    save_dir: PathBuf,
}

impl AchievementStore {
    /// 初始化存档系统
    pub fn new(save_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let save_dir = save_dir.as_ref();

        // 创建存档目录(如果不存在)
        if !save_dir.exists() {
            fs::create_dir_all(save_dir).context("Failed to create achievement directory")?;
        }

        Ok(Self {
            save_dir: save_dir.to_path_buf(),
        })
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn save_path(&self) -> PathBuf {
        self.save_dir.join(SAVE_FILE)
    }

    pub fn has_save(&self) -> bool {
        self.save_path().exists()
    }

    /// 保存成就状态
    pub fn save(&self, engine: &AchievementEngine) -> Result<(), StoreError> {
        self.write(&AchievementSave::capture(engine))
    }

    /// Write a save atomically: temp file, flush, rename
    pub fn write(&self, data: &AchievementSave) -> Result<(), StoreError> {
        let path = self.save_path();
        let temp_path = path.with_extension("tmp");

        let encoded = bincode::serde::encode_to_vec(data, bincode::config::standard())?;

        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary save file")?;
        file.write_all(&encoded)
            .context("Failed to write achievement data")?;
        // 确保数据写入磁盘
        file.sync_all().context("Failed to flush achievement data")?;
        drop(file);

        // 原子性重命名
        fs::rename(&temp_path, &path).context("Failed to commit achievement save")?;

        tracing::debug!(path = %path.display(), bytes = encoded.len(), "achievements saved");
        Ok(())
    }

    /// 读取成就存档；没有存档时返回 None
    pub fn load(&self) -> Result<Option<AchievementSave>, StoreError> {
        let path = self.save_path();
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read achievement save: {:?}", path))?;
        let (mut data, _): (AchievementSave, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;

        // Migrate legacy saves to current version
        data.migrate();
        data.validate()?;

        Ok(Some(data))
    }

    /// Load the saved state into an engine, or start fresh if there is none
    pub fn load_engine(&self, catalog: CatalogManager) -> Result<AchievementEngine, StoreError> {
        match self.load()? {
            Some(data) => Ok(data.restore(catalog).0),
            None => Ok(AchievementEngine::new(catalog, ProgressStore::new())),
        }
    }

    /// 删除存档
    pub fn delete(&self) -> Result<(), StoreError> {
        let path = self.save_path();
        if path.exists() {
            fs::remove_file(path).context("Failed to delete achievement save")?;
        }
        Ok(())
    }
}

/// Write the engine's custom achievements to a JSON file
pub fn export_to_file(engine: &AchievementEngine, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let json = engine.export_custom()?;
    fs::write(path, json).with_context(|| format!("Failed to write export file: {:?}", path))?;
    Ok(())
}

/// Error from [`import_from_file`]
#[derive(Debug, thiserror::Error)]
pub enum ImportFileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Achievement(#[from] AchievementError),
}

/// Import custom achievements from a JSON file written by [`export_to_file`]
pub fn import_from_file(
    engine: &mut AchievementEngine,
    path: impl AsRef<Path>,
    policy: ConflictPolicy,
) -> Result<ImportSummary, ImportFileError> {
    let path = path.as_ref();
    let payload = fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {:?}", path))
        .map_err(StoreError::from)?;
    Ok(engine.import_custom(&payload, policy)?)
}
