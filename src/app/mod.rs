// Application layer: HTTP surface over the catalog service.

pub mod handlers;
pub mod jsonp;
pub mod server;
pub mod templates;

pub use server::{build_router, AppState, Server, ServerConfig};
