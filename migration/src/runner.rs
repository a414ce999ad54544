use colored::*;
use futures::FutureExt;
use migration::Migrator;
use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

#[derive(Clone, Copy)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Up => "Applying",
            Direction::Down => "Reverting",
        }
    }
}

async fn open(url: &str) -> DatabaseConnection {
    sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed")
}

/// Creates every table in order. Each migration is `if_not_exists`, so a
/// second run against the same file is harmless.
pub async fn run_all_migrations(url: &str) {
    let db = open(url).await;
    apply_all(&db).await;
}

async fn apply_all(db: &DatabaseConnection) {
    let manager = SchemaManager::new(db);

    println!("Running migrations...");
    let started = Instant::now();
    let migrations = <Migrator as MigratorTrait>::migrations();
    let total = migrations.len();
    for migration in migrations {
        run_one(&manager, migration, Direction::Up).await;
    }
    println!("{} migration(s) applied in {:.2?}", total, started.elapsed());
}

/// Drops the last `steps` tables, newest first.
pub async fn revert_migrations(url: &str, steps: usize) {
    let db = open(url).await;
    revert(&db, steps).await;
}

async fn revert(db: &DatabaseConnection, steps: usize) {
    let manager = SchemaManager::new(db);

    let mut migrations = <Migrator as MigratorTrait>::migrations();
    migrations.reverse();
    for migration in migrations.into_iter().take(steps) {
        run_one(&manager, migration, Direction::Down).await;
    }
}

async fn run_one(manager: &SchemaManager<'_>, migration: Box<dyn MigrationTrait>, dir: Direction) {
    let label = format!("{} {}", dir.verb(), migration.name().bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(label.len()));
    print!("{label}{dots} ");
    let _ = io::stdout().flush();

    let start = Instant::now();
    let step = match dir {
        Direction::Up => migration.up(manager),
        Direction::Down => migration.down(manager),
    };
    let result = std::panic::AssertUnwindSafe(step).catch_unwind().await;

    match result {
        Ok(Ok(())) => {
            println!("{} {}", "done".green(), format!("({:.2?})", start.elapsed()).dimmed());
        }
        Ok(Err(e)) => {
            println!("{}", "failed".red());
            eprintln!("  {e}");
            std::process::exit(1);
        }
        Err(_) => {
            println!("{}", "panicked".red());
            std::process::exit(1);
        }
    }
}
