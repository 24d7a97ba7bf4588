//! JSON shapes of the Datastore REST `v1` API and conversions to the domain model.
//!
//! Property values travel as single-key objects tagged by type
//! (`{"stringValue": "abc"}`, `{"integerValue": "42"}`, ...). Requests encode
//! plain JSON values into that form; responses are decoded back into plain JSON.

use crate::domain::model::{Entity, EntityKey, KeyId, PathElement};
use crate::domain::query::{Direction, FilterOp, Query, QueryPage};
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePathElement {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<PartitionId>,
    #[serde(default)]
    pub path: Vec<WirePathElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEntity {
    pub key: Option<WireKey>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityResult {
    pub entity: WireEntity,
}

#[derive(Debug, Serialize)]
pub struct PropertyReference {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct KindExpression {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    CompositeFilter(CompositeFilter),
    PropertyFilter(WirePropertyFilter),
}

#[derive(Debug, Serialize)]
pub struct CompositeFilter {
    pub op: &'static str,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Serialize)]
pub struct WirePropertyFilter {
    pub property: PropertyReference,
    pub op: &'static str,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct WireOrder {
    pub property: PropertyReference,
    pub direction: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuery {
    pub kind: Vec<KindExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<WireOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub partition_id: PartitionId,
    pub query: WireQuery,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultBatch {
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
    pub end_cursor: Option<String>,
    pub more_results: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunQueryResponse {
    pub batch: QueryResultBatch,
}

#[derive(Debug, Serialize)]
pub struct LookupRequest {
    pub keys: Vec<WireKey>,
}

#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub found: Vec<EntityResult>,
}

fn filter_op(op: FilterOp) -> &'static str {
    match op {
        FilterOp::LessThan => "LESS_THAN",
        FilterOp::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        FilterOp::GreaterThan => "GREATER_THAN",
        FilterOp::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        FilterOp::Equal => "EQUAL",
    }
}

fn direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "ASCENDING",
        Direction::Descending => "DESCENDING",
    }
}

impl RunQueryRequest {
    pub fn new(project_id: &str, namespace: Option<&str>, query: &Query) -> Self {
        let mut filters: Vec<Filter> = query
            .filters
            .iter()
            .map(|f| {
                Filter::PropertyFilter(WirePropertyFilter {
                    property: PropertyReference {
                        name: f.property.clone(),
                    },
                    op: filter_op(f.op),
                    value: encode_value(&f.value),
                })
            })
            .collect();

        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::CompositeFilter(CompositeFilter {
                op: "AND",
                filters,
            })),
        };

        Self {
            partition_id: PartitionId {
                project_id: Some(project_id.to_string()),
                namespace_id: namespace.map(str::to_string),
            },
            query: WireQuery {
                kind: vec![KindExpression {
                    name: query.kind.clone(),
                }],
                filter,
                order: query
                    .order
                    .iter()
                    .map(|o| WireOrder {
                        property: PropertyReference {
                            name: o.property.clone(),
                        },
                        direction: direction(o.direction),
                    })
                    .collect(),
                limit: query.limit,
                start_cursor: query.start_cursor.clone(),
            },
        }
    }
}

impl RunQueryResponse {
    pub fn into_page(self) -> Result<QueryPage> {
        let entities = self
            .batch
            .entity_results
            .into_iter()
            .map(|result| decode_entity(result.entity))
            .collect::<Result<Vec<_>>>()?;

        // NOT_FINISHED / MORE_RESULTS_AFTER_LIMIT / MORE_RESULTS_AFTER_CURSOR
        let more_results = matches!(
            self.batch.more_results.as_deref(),
            Some("NOT_FINISHED") | Some("MORE_RESULTS_AFTER_LIMIT") | Some("MORE_RESULTS_AFTER_CURSOR")
        );

        Ok(QueryPage {
            entities,
            end_cursor: self.batch.end_cursor,
            more_results,
        })
    }
}

pub fn encode_key(project_id: &str, key: &EntityKey) -> WireKey {
    WireKey {
        partition_id: Some(PartitionId {
            project_id: Some(project_id.to_string()),
            namespace_id: key.namespace.clone(),
        }),
        path: key
            .path
            .iter()
            .map(|element| {
                let (id, name) = match &element.id {
                    Some(KeyId::Id(id)) => (Some(id.to_string()), None),
                    Some(KeyId::Name(name)) => (None, Some(name.clone())),
                    None => (None, None),
                };
                WirePathElement {
                    kind: element.kind.clone(),
                    id,
                    name,
                }
            })
            .collect(),
    }
}

pub fn decode_key(key: WireKey) -> Result<EntityKey> {
    let path = key
        .path
        .into_iter()
        .map(|element| {
            let id = match (element.id, element.name) {
                (Some(id), _) => Some(KeyId::Id(id.parse().map_err(|_| {
                    AppError::MalformedEntity {
                        message: format!("key id is not an integer: {}", id),
                    }
                })?)),
                (None, Some(name)) => Some(KeyId::Name(name)),
                (None, None) => None,
            };
            Ok(PathElement {
                kind: element.kind,
                id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EntityKey {
        namespace: key.partition_id.and_then(|p| p.namespace_id),
        path,
    })
}

pub fn decode_entity(entity: WireEntity) -> Result<Entity> {
    let key = match entity.key {
        Some(key) => decode_key(key)?,
        None => EntityKey::default(),
    };

    let properties = entity
        .properties
        .into_iter()
        .map(|(name, value)| Ok((name, decode_value(&value)?)))
        .collect::<Result<HashMap<_, _>>>()?;

    Ok(Entity { key, properties })
}

/// Plain JSON value → Datastore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "entityValue": { "properties": properties } })
        }
    }
}

/// Datastore typed value → plain JSON value.
pub fn decode_value(value: &Value) -> Result<Value> {
    let Value::Object(fields) = value else {
        return Err(malformed(value));
    };

    if fields.contains_key("nullValue") {
        return Ok(Value::Null);
    }
    if let Some(b) = fields.get("booleanValue") {
        return Ok(b.clone());
    }
    if let Some(i) = fields.get("integerValue") {
        // int64 以字串傳輸
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed.map(Value::from).ok_or_else(|| malformed(value));
    }
    if let Some(d) = fields.get("doubleValue") {
        // "NaN" / "Infinity" 沒有 JSON 表示法，保留原字串
        return Ok(d.clone());
    }
    for passthrough in ["stringValue", "timestampValue", "blobValue", "geoPointValue"] {
        if let Some(v) = fields.get(passthrough) {
            return Ok(v.clone());
        }
    }
    if let Some(key) = fields.get("keyValue") {
        let key: WireKey = serde_json::from_value(key.clone())?;
        let key = decode_key(key)?;
        return Ok(json!({
            "kind": key.kind(),
            "id": key.id().map(|id| id.to_json()),
        }));
    }
    if let Some(nested) = fields.get("entityValue") {
        let nested: WireEntity = serde_json::from_value(nested.clone())?;
        let properties = decode_entity(nested)?
            .properties
            .into_iter()
            .collect::<Map<String, Value>>();
        return Ok(Value::Object(properties));
    }
    if let Some(array) = fields.get("arrayValue") {
        let values = match array.get("values") {
            Some(Value::Array(items)) => items
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };
        return Ok(Value::Array(values));
    }

    Err(malformed(value))
}

fn malformed(value: &Value) -> AppError {
    AppError::MalformedEntity {
        message: format!("unrecognized property value: {}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::PrefixRange;

    #[test]
    fn test_run_query_request_shape() {
        let query = Query::new("Product")
            .prefix("downcase_name", &PrefixRange::new("ba"))
            .limit(5);
        let request = RunQueryRequest::new("demo-project", Some("shop"), &query);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["partitionId"]["projectId"], "demo-project");
        assert_eq!(body["partitionId"]["namespaceId"], "shop");
        assert_eq!(body["query"]["kind"][0]["name"], "Product");
        assert_eq!(body["query"]["limit"], 5);
        assert_eq!(body["query"]["order"][0]["direction"], "ASCENDING");

        let filters = &body["query"]["filter"]["compositeFilter"];
        assert_eq!(filters["op"], "AND");
        assert_eq!(
            filters["filters"][0]["propertyFilter"]["op"],
            "GREATER_THAN_OR_EQUAL"
        );
        assert_eq!(
            filters["filters"][0]["propertyFilter"]["value"]["stringValue"],
            "ba"
        );
        assert_eq!(filters["filters"][1]["propertyFilter"]["op"], "LESS_THAN");
        assert_eq!(
            filters["filters"][1]["propertyFilter"]["value"]["stringValue"],
            "ba\u{10ffff}"
        );
    }

    #[test]
    fn test_single_filter_is_not_wrapped() {
        let query = Query::new("Product").filter("name", FilterOp::Equal, "Saw");
        let body = serde_json::to_value(RunQueryRequest::new("p", None, &query)).unwrap();
        assert_eq!(body["query"]["filter"]["propertyFilter"]["op"], "EQUAL");
        assert!(body["partitionId"].get("namespaceId").is_none());
        assert!(body["query"].get("order").is_none());
    }

    #[test]
    fn test_decode_typed_values() {
        assert_eq!(decode_value(&json!({"nullValue": null})).unwrap(), Value::Null);
        assert_eq!(decode_value(&json!({"booleanValue": true})).unwrap(), json!(true));
        assert_eq!(decode_value(&json!({"integerValue": "12"})).unwrap(), json!(12));
        assert_eq!(decode_value(&json!({"doubleValue": 1.5})).unwrap(), json!(1.5));
        assert_eq!(
            decode_value(&json!({"stringValue": "hi", "excludeFromIndexes": true})).unwrap(),
            json!("hi")
        );
        assert_eq!(
            decode_value(&json!({"timestampValue": "2016-01-01T00:00:00Z"})).unwrap(),
            json!("2016-01-01T00:00:00Z")
        );
        assert_eq!(
            decode_value(&json!({"arrayValue": {"values": [{"stringValue": "a"}, {"integerValue": "2"}]}}))
                .unwrap(),
            json!(["a", 2])
        );
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(
            decode_value(&json!({"entityValue": {"properties": {"w": {"integerValue": "3"}}}}))
                .unwrap(),
            json!({"w": 3})
        );
        assert_eq!(
            decode_value(&json!({"keyValue": {"path": [{"kind": "Maker", "id": "9"}]}})).unwrap(),
            json!({"kind": "Maker", "id": 9})
        );
    }

    #[test]
    fn test_decode_rejects_unknown_values() {
        assert!(decode_value(&json!({"mysteryValue": 1})).is_err());
        assert!(decode_value(&json!("bare string")).is_err());
        assert!(decode_value(&json!({"integerValue": "twelve"})).is_err());
    }

    #[test]
    fn test_encode_values() {
        assert_eq!(encode_value(&json!(7)), json!({"integerValue": "7"}));
        assert_eq!(encode_value(&json!(0.5)), json!({"doubleValue": 0.5}));
        assert_eq!(encode_value(&json!(null)), json!({"nullValue": null}));
        assert_eq!(
            encode_value(&json!(["x"])),
            json!({"arrayValue": {"values": [{"stringValue": "x"}]}})
        );
    }

    #[test]
    fn test_response_into_page() {
        let response: RunQueryResponse = serde_json::from_value(json!({
            "batch": {
                "entityResultType": "FULL",
                "entityResults": [{
                    "entity": {
                        "key": {
                            "partitionId": {"projectId": "demo-project"},
                            "path": [{"kind": "Product", "id": "5644004762845184"}]
                        },
                        "properties": {
                            "name": {"stringValue": "Banana"},
                            "downcase_name": {"stringValue": "banana"}
                        }
                    },
                    "cursor": "CjQSLmo"
                }],
                "endCursor": "CjQSLmo",
                "moreResults": "MORE_RESULTS_AFTER_LIMIT"
            }
        }))
        .unwrap();

        let page = response.into_page().unwrap();
        assert_eq!(page.entities.len(), 1);
        assert!(page.more_results);
        assert_eq!(page.end_cursor.as_deref(), Some("CjQSLmo"));

        let entity = &page.entities[0];
        assert_eq!(entity.key.id(), Some(&KeyId::Id(5644004762845184)));
        assert_eq!(entity.properties["name"], json!("Banana"));
    }

    #[test]
    fn test_empty_batch() {
        let response: RunQueryResponse = serde_json::from_value(json!({
            "batch": {"entityResultType": "FULL", "moreResults": "NO_MORE_RESULTS"}
        }))
        .unwrap();
        let page = response.into_page().unwrap();
        assert!(page.entities.is_empty());
        assert!(!page.more_results);
    }

    #[test]
    fn test_key_round_trip_through_wire() {
        let key = EntityKey::new("Product", KeyId::Name("saw".to_string()))
            .with_namespace(Some("shop".to_string()));
        let wire = encode_key("demo-project", &key);
        assert_eq!(wire.path[0].name.as_deref(), Some("saw"));
        assert!(wire.path[0].id.is_none());
        assert_eq!(decode_key(wire).unwrap(), key);
    }
}
