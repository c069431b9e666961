//! Application state container shared across Axum route handlers.
//!
//! Wrapped by value in the router (`Router<AppState>`) and handed to handlers through
//! Axum's `State<T>` extractor. Cloning is cheap: the SeaORM connection is a pool handle.

use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Borrow the database connection.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Owned copy of the connection, for moving into spawned tasks.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
