mod helpers;

use achievements::{AchievementError, AchievementEvent, ConditionKind, ConflictPolicy, CustomAchievement};
use game_launcher::{LibraryStore, display_error};
use helpers::{TestLauncher, TestLibraryBuilder, at};
use pretty_assertions::assert_eq;

#[test]
fn test_first_game_unlocks_once_and_persists() {
    let library = TestLibraryBuilder::new().with_games(1).build();
    let mut t = TestLauncher::new(library.clone());

    let report = t.launcher.refresh().expect("refresh");
    assert!(report.newly_unlocked.contains(&"first_game".to_string()));

    // Nothing changed: cached, no new notifications
    let again = t.launcher.refresh().expect("refresh");
    assert!(again.from_cache);

    let messages = t.launcher.notification_messages();
    assert_eq!(messages, vec!["Achievement unlocked: First Steps (+10)".to_string()]);
    assert!(t.launcher.drain_notifications().is_empty());

    let t = t.reopen(library);
    assert!(t.launcher.engine().is_unlocked("first_game"));
}

#[test]
fn test_library_mutation_changes_token() {
    let library = TestLibraryBuilder::new().with_games(9).build();
    let mut t = TestLauncher::new(library);

    let first = t.launcher.refresh().unwrap();
    assert!(!first.newly_unlocked.contains(&"collector".to_string()));
    assert_eq!(
        t.launcher.engine().progress_of("collector").unwrap().current_progress,
        9.0
    );

    t.launcher
        .library_mut()
        .add_game(game_launcher::library::Game::new("tenth", "Tenth"))
        .unwrap();
    let second = t.launcher.refresh().unwrap();

    assert!(!second.from_cache);
    assert_eq!(second.newly_unlocked, vec!["collector".to_string()]);
}

#[test]
fn test_week_streak_and_night_sessions() {
    let library = TestLibraryBuilder::new()
        .with_games(1)
        .with_daily_sessions(&[0, 1, 2, 3, 4, 5], 23)
        .build();
    let mut t = TestLauncher::new(library);

    let report = t.launcher.refresh().unwrap();
    assert!(report.newly_unlocked.contains(&"night_owl".to_string()));
    assert!(!report.newly_unlocked.contains(&"streak_week".to_string()));
    assert_eq!(t.launcher.longest_streak(), 6);

    let start = at(6, 23);
    t.launcher
        .library_mut()
        .record_session("game-0", start, None)
        .unwrap();
    let report = t.launcher.refresh().unwrap();

    assert_eq!(report.newly_unlocked, vec!["streak_week".to_string()]);
}

#[test]
fn test_out_of_order_history_is_recomputed() {
    let library = TestLibraryBuilder::new()
        .with_games(1)
        .with_daily_sessions(&[0, 1, 2, 4, 5, 6], 12)
        .build();
    let mut t = TestLauncher::new(library);
    t.launcher.refresh().unwrap();
    assert_eq!(
        t.launcher.engine().progress_of("streak_week").unwrap().current_progress,
        3.0
    );

    // An imported old session fills the gap on day 3
    let start = at(3, 12);
    t.launcher
        .library_mut()
        .record_session("game-0", start, None)
        .unwrap();
    let report = t.launcher.refresh().unwrap();

    assert!(report.newly_unlocked.contains(&"streak_week".to_string()));
}

#[test]
fn test_custom_achievement_survives_restart() {
    let library = TestLibraryBuilder::new().with_games(2).build();
    let mut t = TestLauncher::new(library.clone());

    t.launcher
        .add_custom(
            CustomAchievement::new("duo", "Duo", ConditionKind::LibrarySize, 2.0).with_points(7),
        )
        .unwrap();
    t.launcher.refresh().unwrap();
    assert!(t.launcher.engine().is_unlocked("duo"));

    let t = t.reopen(library);
    let engine = t.launcher.engine();
    assert_eq!(engine.catalog().get("duo").unwrap().points, 7);
    assert!(engine.is_unlocked("duo"));
}

#[test]
fn test_typed_errors_reach_the_caller() {
    let mut t = TestLauncher::new(TestLibraryBuilder::new().build());

    let err = t.launcher.remove_custom("first_game").unwrap_err();
    assert_eq!(
        err.downcast_ref::<AchievementError>(),
        Some(&AchievementError::Conflict("first_game".into()))
    );

    assert_eq!(
        display_error(&err).as_deref(),
        Some("\"first_game\" is a built-in achievement and cannot be changed")
    );

    let err = t.launcher.unlock("missing").unwrap_err();
    let typed = err.downcast_ref::<AchievementError>().unwrap();
    assert!(!typed.is_user_facing());
    assert_eq!(display_error(&err), None);
}

#[test]
fn test_file_export_import_between_launchers() {
    let mut source = TestLauncher::new(TestLibraryBuilder::new().build());
    source
        .launcher
        .add_custom(CustomAchievement::new("lore", "Lore Keeper", ConditionKind::RoadmapCompleted, 3.0))
        .unwrap();
    source
        .launcher
        .add_custom(CustomAchievement::new("hands", "Hands On", ConditionKind::Manual, 0.0))
        .unwrap();
    let path = source.dir.path().join("custom.json");
    source.launcher.export_to_file(&path).unwrap();

    let mut target = TestLauncher::new(TestLibraryBuilder::new().build());
    target
        .launcher
        .add_custom(CustomAchievement::new("hands", "Mine", ConditionKind::Manual, 0.0))
        .unwrap();
    target.launcher.drain_notifications();

    let summary = target.launcher.import_from_file(&path, None).unwrap();

    assert_eq!(summary.imported, vec!["lore".to_string()]);
    assert_eq!(summary.skipped, vec!["hands".to_string()]);
    assert_eq!(
        target.launcher.drain_notifications(),
        vec![AchievementEvent::CatalogChanged]
    );

    let summary = target
        .launcher
        .import_from_file(&path, Some(ConflictPolicy::Overwrite))
        .unwrap();
    assert_eq!(summary.imported_count(), 2);
    assert_eq!(target.launcher.engine().catalog().get("hands").unwrap().name, "Hands On");
}

#[test]
fn test_replaced_library_is_evaluated() {
    let loaded: LibraryStore = serde_json::from_str(
        &serde_json::to_string(&TestLibraryBuilder::new().with_games(10).build()).unwrap(),
    )
    .unwrap();
    // Deserialized stores start counting again from zero
    assert_eq!(loaded.version(), 0);

    let mut t = TestLauncher::new(LibraryStore::new());
    assert!(t.launcher.refresh().unwrap().newly_unlocked.is_empty());

    t.launcher.replace_library(loaded.clone());
    let report = t.launcher.refresh().unwrap();
    assert!(!report.from_cache);
    assert!(report.newly_unlocked.contains(&"first_game".to_string()));
    assert!(report.newly_unlocked.contains(&"collector".to_string()));

    // Plain assignment through library_mut must not hit the cache either
    let mut t = TestLauncher::new(LibraryStore::new());
    t.launcher.refresh().unwrap();
    *t.launcher.library_mut() = loaded;
    let report = t.launcher.refresh().unwrap();
    assert!(!report.from_cache);
    assert!(t.launcher.engine().is_unlocked("first_game"));
}

#[test]
fn test_failed_save_is_retried_on_next_refresh() {
    let library = TestLibraryBuilder::new().with_games(1).build();
    let mut t = TestLauncher::new(library.clone());

    std::fs::remove_dir_all(t.dir.path()).unwrap();
    let err = t.launcher.refresh().unwrap_err();
    assert!(display_error(&err).is_some());
    assert!(t.launcher.engine().is_unlocked("first_game"));
    assert!(t.launcher.has_unsaved_changes());

    std::fs::create_dir_all(t.dir.path()).unwrap();
    let report = t.launcher.refresh().unwrap();
    assert!(report.from_cache);
    assert!(!t.launcher.has_unsaved_changes());

    let t = t.reopen(library);
    assert!(t.launcher.engine().is_unlocked("first_game"));
}
