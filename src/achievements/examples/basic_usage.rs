//! Basic usage example for the achievement engine

use achievements::{
    AchievementEngine, AchievementEvent, ConditionKind, ConflictPolicy, CustomAchievement,
    FnListener, StatsSnapshot,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Game Library Achievements Demo ===\n");

    let mut engine = AchievementEngine::default();
    engine.subscribe(Box::new(FnListener::new("console", |event| {
        if let AchievementEvent::Unlocked { key } = event {
            println!("  🏆 unlocked: {}", key);
        }
        Ok(())
    })));

    println!("Total achievements: {}", engine.catalog().len());
    println!("Starting completion: {:.1}%\n", engine.completion_rate() * 100.0);

    println!("--- A custom goal is added ---");
    let goal = CustomAchievement::new("trilogy", "Trilogy", ConditionKind::GamesCompleted, 3.0)
        .with_points(40)
        .with_description("Finish three games");
    if let Err(e) = engine.add_custom(goal) {
        println!("  could not add goal: {}", error::user_message(&e));
    }

    println!("\n--- Three games added, one launched at night ---");
    let night = Utc.with_ymd_and_hms(2024, 2, 10, 23, 30, 0).unwrap();
    let snapshot = StatsSnapshot::builder()
        .game("hades")
        .game("celeste")
        .game("outer-wilds")
        .launches("hades", 1)
        .playtime("hades", 95)
        .session(night, Some(night + Duration::minutes(95)))
        .build();
    engine.evaluate(&snapshot, 1, false);

    println!("\n--- Same data again (cached) ---");
    let report = engine.evaluate(&snapshot, 1, false);
    println!("  served from cache: {}", report.from_cache);

    println!("\n--- A week of daily sessions, three games finished ---");
    let mut builder = StatsSnapshot::builder()
        .completion("hades", 100.0)
        .completion("celeste", 100.0)
        .completion("outer-wilds", 100.0)
        .launches("hades", 8);
    for day in 0..7 {
        builder = builder.session(night + Duration::days(day), None);
    }
    let week = builder.build();
    engine.evaluate(&week, 2, false);
    println!("  longest streak: {} days", engine.longest_streak(&week));

    println!("\n=== Final Statistics ===");
    let summary = engine.summary();
    println!(
        "{}/{} unlocked ({:.1}%), {} of {} points",
        summary.unlocked,
        summary.total,
        summary.completion_rate * 100.0,
        summary.points_earned,
        summary.points_available
    );

    println!("\n=== Remaining Achievements ===");
    for view in engine.views().iter().filter(|v| !v.progress.unlocked) {
        println!(
            "✗ {}: {} ({:.0}%)",
            view.definition.name,
            view.definition.description,
            view.fraction() * 100.0
        );
    }

    println!("\n=== Export / Import ===");
    match engine.export_custom() {
        Ok(exported) => {
            println!("{}", exported);
            let mut other = AchievementEngine::default();
            match other.import_custom(&exported, ConflictPolicy::Skip) {
                Ok(summary) => println!(
                    "imported {}, skipped {}, rejected {}",
                    summary.imported_count(),
                    summary.skipped_count(),
                    summary.rejected_count()
                ),
                Err(e) => println!("import failed: {}", e),
            }
        }
        Err(e) => println!("export failed: {}", e),
    }
}
