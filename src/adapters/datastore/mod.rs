pub mod wire;

use crate::domain::model::{Entity, EntityKey};
use crate::domain::ports::DocumentStore;
use crate::domain::query::{Query, QueryPage};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use wire::{decode_entity, encode_key, LookupRequest, LookupResponse, RunQueryRequest, RunQueryResponse};

pub const DEFAULT_ENDPOINT: &str = "https://datastore.googleapis.com";

/// Datastore REST `v1` client. Also works against the local emulator.
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    client: Client,
    endpoint: String,
    project_id: String,
    namespace: Option<String>,
    access_token: Option<String>,
}

impl DatastoreClient {
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            namespace: None,
            access_token: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/v1/projects/{}:{}", self.endpoint, self.project_id, method)
    }

    async fn call<Req, Resp>(&self, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.method_url(method);
        tracing::debug!("Making Datastore request to: {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Datastore response status: {}", status);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::StoreError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Resp>().await?)
    }
}

#[async_trait]
impl DocumentStore for DatastoreClient {
    async fn run_query(&self, query: &Query) -> Result<QueryPage> {
        let request = RunQueryRequest::new(&self.project_id, self.namespace.as_deref(), query);
        let response: RunQueryResponse = self.call("runQuery", &request).await?;
        response.into_page()
    }

    async fn lookup(&self, key: &EntityKey) -> Result<Option<Entity>> {
        let mut key = key.clone();
        if key.namespace.is_none() {
            key.namespace = self.namespace.clone();
        }

        let request = LookupRequest {
            keys: vec![encode_key(&self.project_id, &key)],
        };
        let response: LookupResponse = self.call("lookup", &request).await?;

        match response.found.len() {
            0 => Ok(None),
            1 => {
                let result = response.found.into_iter().next().map(|r| r.entity);
                result.map(decode_entity).transpose()
            }
            count => Err(AppError::AmbiguousEntity { count }),
        }
    }
}
