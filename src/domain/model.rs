use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A normalized query result: property values plus a synthetic `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }
}

/// Store-assigned identifier of a key path element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyId {
    Id(i64),
    Name(String),
}

impl KeyId {
    /// 數字 id 轉成 JSON number，名稱則為 string
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            KeyId::Id(id) => serde_json::Value::Number((*id).into()),
            KeyId::Name(name) => serde_json::Value::String(name.clone()),
        }
    }

    /// Path segments that look like integers address numeric ids.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => KeyId::Id(id),
            Err(_) => KeyId::Name(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub kind: String,
    /// `None` for an incomplete key.
    pub id: Option<KeyId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityKey {
    pub namespace: Option<String>,
    pub path: Vec<PathElement>,
}

impl EntityKey {
    pub fn new(kind: impl Into<String>, id: KeyId) -> Self {
        Self {
            namespace: None,
            path: vec![PathElement {
                kind: kind.into(),
                id: Some(id),
            }],
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.path.last().map(|element| element.kind.as_str())
    }

    pub fn id(&self) -> Option<&KeyId> {
        self.path.last().and_then(|element| element.id.as_ref())
    }
}

/// A record as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub key: EntityKey,
    pub properties: HashMap<String, serde_json::Value>,
}

/// Form submission echoed back on the confirmation page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub site_url: String,
    pub comments: String,
}
