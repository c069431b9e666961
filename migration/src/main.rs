use std::{fs, path::Path};
use util::{config, paths};

mod runner;

/// `migration [migrate|fresh|clean]`
///
/// * `migrate` (default) applies every migration to `DATABASE_PATH`.
/// * `fresh` deletes the database and uploaded files, then migrates.
/// * `clean` only deletes.
#[tokio::main]
async fn main() {
    let db_path = config::database_path();
    let url = format!("sqlite://{}?mode=rwc", db_path);
    let command = std::env::args().nth(1);

    let outcome = match command.as_deref() {
        Some("clean") => {
            remove_db_file(&db_path);
            Ok(())
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await
        }
        Some("migrate") | None => {
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await
        }
        Some(other) => {
            eprintln!("Unknown command '{other}'. Expected one of: migrate, fresh, clean");
            std::process::exit(2);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if db_path.exists() {
        match fs::remove_file(db_path) {
            Ok(()) => println!("Deleted DB: {}", db_path.display()),
            Err(e) => eprintln!("Failed to delete {}: {e}", db_path.display()),
        }
    } else {
        println!("DB file does not exist: {}", db_path.display());
    }

    let storage = paths::storage_root();
    if storage.exists() {
        match fs::remove_dir_all(&storage) {
            Ok(()) => println!("Deleted uploaded files: {}", storage.display()),
            Err(e) => eprintln!("Failed to delete {}: {e}", storage.display()),
        }
    }
}

fn create_db_dir(path: &str) {
    if let Err(e) = paths::ensure_parent_dir(path) {
        eprintln!("Failed to create DB directory for {path}: {e}");
    }
}
