pub mod app;
pub mod config;
pub mod docs;
pub mod errors;
pub mod gate;
pub mod jwt;
pub mod models;
pub mod routes;

// Re-export commonly used items for tests
pub use app::create_app;
pub use config::AppConfig;
