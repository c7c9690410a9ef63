//! Achievement engine for the game library
//!
//! Evaluates a catalog of declarative unlock conditions against snapshots of
//! user activity, keeps per-achievement unlock state and progress, and
//! notifies listeners when achievements unlock or the catalog changes.
//!
//! ```
//! use achievements::{AchievementEngine, StatsSnapshot};
//!
//! let mut engine = AchievementEngine::default();
//! let snapshot = StatsSnapshot::builder().game("celeste").launches("celeste", 1).build();
//! let report = engine.evaluate(&snapshot, 1, false);
//! assert!(report.newly_unlocked.contains(&"first_game".to_string()));
//! ```

pub mod catalog;
pub mod condition;
pub mod definition;
pub mod engine;
pub mod events;
pub mod progress;
pub mod snapshot;


pub use catalog::{CatalogManager, ConflictPolicy, CustomAchievement, ImportRejection, ImportSummary};
pub use condition::{Evaluation, longest_streak};
pub use definition::{AchievementDefinition, ConditionKind, builtin_achievements};
pub use engine::{AchievementEngine, AchievementSummary, AchievementView, ChangeToken, EvaluationReport};
pub use error::AchievementError;
pub use events::{AchievementEvent, EventListener, EventSink, FnListener};
pub use progress::{AchievementProgress, ProgressStore};
pub use snapshot::{GameId, GameStats, SessionRecord, SnapshotBuilder, StatsSnapshot};
