use async_trait::async_trait;
use colored::*;
use sea_orm::DatabaseConnection;
use services::service::AppError;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 80;

#[async_trait]
pub trait Seeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AppError>;
}

/// Runs one seeder with a `Seeding X ..... done (12ms)` status line.
/// Returns `false` when the seeder failed.
pub async fn run_seeder<S: Seeder + ?Sized>(seeder: &S, name: &str, db: &DatabaseConnection) -> bool {
    let base_msg = format!("Seeding {}", name.bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(base_msg.len()));
    print!("{}{} ", base_msg, dots);
    io::stdout().flush().ok();

    let start = Instant::now();
    match seeder.seed(db).await {
        Ok(()) => {
            let time_str = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "done".green(), time_str);
            true
        }
        Err(e) => {
            println!("{}", "failed".red());
            eprintln!("  {}", e.to_string().red());
            false
        }
    }
}

/// Picks a random element. `items` must not be empty.
pub fn pick<T>(items: &[T]) -> &T {
    &items[fastrand::usize(..items.len())]
}
