use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 80;

/// Applies every pending migration, printing one aligned status line per step.
///
/// Already-applied migrations are skipped so the command is safe to rerun.
pub async fn run_all_migrations(url: &str) -> Result<(), DbErr> {
    let db = sea_orm::Database::connect(url).await?;

    println!("Running migrations...");
    let pending = <migration::Migrator as MigratorTrait>::get_pending_migrations(&db).await?;
    if pending.is_empty() {
        println!("{}", "Nothing to migrate".dimmed());
        return Ok(());
    }

    let applied: Vec<String> = pending.iter().map(|m| m.name().to_string()).collect();
    let schema_manager = SchemaManager::new(&db);

    for migration in <migration::Migrator as MigratorTrait>::migrations() {
        if applied.iter().any(|name| name == migration.name()) {
            run_migration(&schema_manager, migration).await?;
        }
    }

    // Records the applied versions in seaql_migrations.
    <migration::Migrator as MigratorTrait>::up(&db, None).await
}

async fn run_migration(
    schema_manager: &SchemaManager<'_>,
    migration: Box<dyn MigrationTrait>,
) -> Result<(), DbErr> {
    let name_str = format!("Applying {}", migration.name().bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(name_str.len()));
    print!("{}{} ", name_str, dots);
    io::stdout().flush().ok();

    let start = Instant::now();
    let result = std::panic::AssertUnwindSafe(migration.up(schema_manager))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => {
            let time_str = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "done".green(), time_str);
            Ok(())
        }
        Ok(Err(e)) => {
            println!("{}", "failed".red());
            Err(e)
        }
        Err(_) => {
            println!("{}", "panicked".red());
            Err(DbErr::Migration(format!("{} panicked", migration.name())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn applies_every_migration_and_reruns_cleanly() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("complaints.db").display());

        run_all_migrations(&url).await.unwrap();
        run_all_migrations(&url).await.unwrap();

        let db = sea_orm::Database::connect(&url).await.unwrap();
        let applied = <migration::Migrator as MigratorTrait>::get_applied_migrations(&db)
            .await
            .unwrap();
        assert_eq!(applied.len(), <migration::Migrator as MigratorTrait>::migrations().len());
        assert!(
            <migration::Migrator as MigratorTrait>::get_pending_migrations(&db)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
