use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    accounts::{AccountSeeder, SEED_PASSWORD},
    catalog::CatalogSeeder,
    complaints::ComplaintSeeder,
};
use colored::*;
use migration::{Migrator, MigratorTrait};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{} {e}", "Failed to connect to database:".red());
            std::process::exit(1);
        }
    };
    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("{} {e}", "Failed to apply migrations:".red());
        std::process::exit(1);
    }

    for (seeder, name) in [
        (Box::new(CatalogSeeder) as Box<dyn Seeder + Send + Sync>, "Catalog"),
        (Box::new(AccountSeeder), "Accounts"),
        (Box::new(ComplaintSeeder), "Complaints"),
    ] {
        if !run_seeder(&*seeder, name, &db).await {
            std::process::exit(1);
        }
    }

    println!(
        "\nLog in as {}, {} or {} with password {}",
        "admin@example.com".cyan(),
        "personnel@example.com".cyan(),
        "student@example.com".cyan(),
        SEED_PASSWORD.cyan()
    );
}
