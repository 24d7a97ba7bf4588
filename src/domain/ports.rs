use crate::domain::model::{Entity, EntityKey};
use crate::domain::query::{Query, QueryPage};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn bind_addr(&self) -> &str;
    fn project_id(&self) -> &str;
    fn datastore_endpoint(&self) -> &str;
    fn namespace(&self) -> Option<&str>;
    fn access_token(&self) -> Option<&str>;
    fn kind(&self) -> &str;
    fn search_field(&self) -> &str;
    fn page_size(&self) -> usize;
}

/// Remote document store queried by kind and property filters.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches the first batch of results for `query`.
    async fn run_query(&self, query: &Query) -> Result<QueryPage>;

    async fn lookup(&self, key: &EntityKey) -> Result<Option<Entity>>;
}
