pub mod api;
pub mod api_docs;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod services;

// Short paths for the infrastructure modules
pub use infrastructure::config;
pub use infrastructure::db;
pub use infrastructure::demo;
pub use infrastructure::seed;
pub use infrastructure::server;
