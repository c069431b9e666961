pub mod config;
pub mod filters;
pub mod paths;
pub mod state;
pub mod test_helpers;
