pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::DatastoreClient;
pub use app::{build_router, AppState, Server, ServerConfig};
pub use config::{CliConfig, TomlConfig};
pub use core::catalog::ProductCatalog;
pub use utils::error::{AppError, Result};
