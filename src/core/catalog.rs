use crate::core::normalize::from_entity;
use crate::core::{DocumentStore, Record};
use crate::domain::model::{EntityKey, KeyId};
use crate::domain::query::{PrefixRange, Query};
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Upper bound on autocomplete suggestions, whatever the configured page size.
pub const MAX_AUTOCOMPLETE_RESULTS: usize = 5;

/// Products per listing page.
pub const LIST_PAGE_SIZE: usize = 10;

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Record>,
    /// Present only when a full page was returned and the store reports more results.
    pub next_cursor: Option<String>,
}

/// Product queries against the remote store.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn DocumentStore>,
    kind: String,
    search_field: String,
    page_size: usize,
    namespace: Option<String>,
}

impl ProductCatalog {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        kind: impl Into<String>,
        search_field: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            kind: kind.into(),
            search_field: search_field.into(),
            page_size: page_size.clamp(1, MAX_AUTOCOMPLETE_RESULTS),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn autocomplete_query(&self, phrase: &str) -> Query {
        Query::new(self.kind.as_str())
            .prefix(&self.search_field, &PrefixRange::new(phrase))
            .limit(self.page_size)
    }

    /// 前綴搜尋，只取第一頁
    pub async fn autocomplete(&self, phrase: &str) -> Result<Vec<Record>> {
        let range = PrefixRange::new(phrase);
        let query = self.autocomplete_query(phrase);

        tracing::debug!(kind = %self.kind, phrase = %phrase, limit = self.page_size, "Running prefix query");
        let page = self.store.run_query(&query).await?;
        tracing::debug!(
            fetched = page.entities.len(),
            more_results = page.more_results,
            "Prefix query returned"
        );

        let mut records = Vec::with_capacity(page.entities.len().min(self.page_size));
        for entity in page.entities {
            if records.len() == self.page_size {
                break;
            }

            let Some(record) = from_entity(entity)? else {
                continue;
            };

            match record.get_str(&self.search_field) {
                Some(value) if range.contains(value) => records.push(record),
                _ => {
                    tracing::warn!(
                        field = %self.search_field,
                        id = ?record.get("id"),
                        "Dropping record outside the requested prefix range"
                    );
                }
            }
        }

        Ok(records)
    }

    /// 單頁列表，游標來自上一頁的 `next_cursor`
    pub async fn list(&self, cursor: Option<&str>) -> Result<ProductPage> {
        let query = Query::new(self.kind.as_str())
            .limit(LIST_PAGE_SIZE)
            .start_cursor(cursor.map(str::to_string));

        tracing::debug!(kind = %self.kind, cursor = ?cursor, "Listing products");
        let page = self.store.run_query(&query).await?;

        let full_page = page.entities.len() >= LIST_PAGE_SIZE;
        let next_cursor = if full_page && page.more_results {
            page.end_cursor
        } else {
            None
        };

        let mut products = Vec::with_capacity(page.entities.len().min(LIST_PAGE_SIZE));
        for entity in page.entities.into_iter().take(LIST_PAGE_SIZE) {
            if let Some(record) = from_entity(entity)? {
                products.push(record);
            }
        }

        Ok(ProductPage {
            products,
            next_cursor,
        })
    }

    pub async fn find(&self, id: &str) -> Result<Option<Record>> {
        let key = EntityKey::new(self.kind.as_str(), KeyId::parse(id))
            .with_namespace(self.namespace.clone());

        tracing::debug!(kind = %self.kind, id = %id, "Looking up entity");
        let entity = self.store.lookup(&key).await?;
        from_entity(entity)
    }
}
