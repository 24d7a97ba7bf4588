//! Router assembly and the server lifecycle.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::adapters::DatastoreClient;
use crate::app::handlers::{
    autocomplete_handler, health_handler, list_handler, product_handler, submitted_handler,
};
use crate::app::jsonp::support_jsonp;
use crate::app::templates::Templates;
use crate::core::catalog::ProductCatalog;
use crate::core::{ConfigProvider, DocumentStore};
use crate::utils::error::{internal_error_response, Result};
use crate::utils::validation::validate_socket_addr;

/// Settings resolved at startup and handed to route registration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub project_id: String,
    pub datastore_endpoint: String,
    pub namespace: Option<String>,
    pub access_token: Option<String>,
    pub kind: String,
    pub search_field: String,
    pub page_size: usize,
}

impl ServerConfig {
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self> {
        Ok(Self {
            addr: validate_socket_addr("bind_addr", provider.bind_addr())?,
            project_id: provider.project_id().to_string(),
            datastore_endpoint: provider.datastore_endpoint().to_string(),
            namespace: provider.namespace().map(str::to_string),
            access_token: provider.access_token().map(str::to_string),
            kind: provider.kind().to_string(),
            search_field: provider.search_field().to_string(),
            page_size: provider.page_size(),
        })
    }

    pub fn datastore_client(&self) -> DatastoreClient {
        DatastoreClient::new(&self.datastore_endpoint, &self.project_id)
            .with_namespace(self.namespace.clone())
            .with_access_token(self.access_token.clone())
    }
}

/// Immutable state shared by every request.
pub struct AppState {
    pub catalog: ProductCatalog,
    pub templates: Templates,
}

impl AppState {
    pub fn new(config: &ServerConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let catalog = ProductCatalog::new(
            store,
            config.kind.as_str(),
            config.search_field.as_str(),
            config.page_size,
        )
        .with_namespace(config.namespace.clone());

        Ok(Self {
            catalog,
            templates: Templates::new()?,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let json_routes: Router<Arc<AppState>> = Router::new()
        .route("/products", get(list_handler))
        .route("/products/autocomplete", get(autocomplete_handler))
        .route("/products/{id}", get(product_handler))
        .route_layer(middleware::from_fn(support_jsonp));

    Router::new()
        .merge(json_routes)
        .route("/submitted", post(submitted_handler))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "A handler panicked during a request");
    internal_error_response()
}

pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(config.datastore_client());
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let state = Arc::new(AppState::new(&config, store)?);
        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("Binding to {}", self.config.addr);
        let listener = TcpListener::bind(self.config.addr).await?;
        tracing::info!("Server running on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Entity, EntityKey};
    use crate::domain::query::{Query, QueryPage};
    use crate::utils::error::INTERNAL_ERROR_MESSAGE;
    use crate::TomlConfig;
    use async_trait::async_trait;

    struct PanickingStore;

    #[async_trait]
    impl DocumentStore for PanickingStore {
        async fn run_query(&self, _query: &Query) -> Result<QueryPage> {
            panic!("store blew up");
        }

        async fn lookup(&self, _key: &EntityKey) -> Result<Option<Entity>> {
            Ok(None)
        }
    }

    fn test_config() -> ServerConfig {
        let provider = TomlConfig::from_toml_str(
            r#"
[server]
bind_addr = "127.0.0.1:0"

[datastore]
project_id = "demo-project"
namespace = "shop"

[search]
page_size = 3
"#,
        )
        .unwrap();
        ServerConfig::from_provider(&provider).unwrap()
    }

    #[test]
    fn test_server_config_from_provider() {
        let config = test_config();
        assert_eq!(config.addr.port(), 0);
        assert_eq!(config.project_id, "demo-project");
        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.kind, "Product");
        assert_eq!(config.page_size, 3);
        assert_eq!(
            config.datastore_client().method_url("lookup"),
            "https://datastore.googleapis.com/v1/projects/demo-project:lookup"
        );
    }

    #[test]
    fn test_handle_panic_returns_generic_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_generic_500() {
        let server = Server::with_store(test_config(), Arc::new(PanickingStore)).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = server.router();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let response = reqwest::get(format!("http://{}/products/autocomplete?phrase=a", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.text().await.unwrap(), INTERNAL_ERROR_MESSAGE);
    }
}
