use crate::core::{Entity, Record};
use crate::utils::error::{AppError, Result};

pub const ID_FIELD: &str = "id";

/// Input accepted by [`from_entity`]: one entity or a lookup-style batch.
#[derive(Debug, Clone)]
pub enum EntityBatch {
    One(Entity),
    Many(Vec<Entity>),
}

impl From<Entity> for EntityBatch {
    fn from(entity: Entity) -> Self {
        EntityBatch::One(entity)
    }
}

impl From<Vec<Entity>> for EntityBatch {
    fn from(entities: Vec<Entity>) -> Self {
        EntityBatch::Many(entities)
    }
}

impl From<Option<Entity>> for EntityBatch {
    fn from(entity: Option<Entity>) -> Self {
        EntityBatch::Many(entity.into_iter().collect())
    }
}

/// 把 store 回傳的 entity 轉成 `{id, ...properties}`
///
/// An empty batch yields `Ok(None)`. A batch holding more than one entity is
/// rejected rather than collapsed to an arbitrary element.
pub fn from_entity(batch: impl Into<EntityBatch>) -> Result<Option<Record>> {
    let entity = match batch.into() {
        EntityBatch::One(entity) => entity,
        EntityBatch::Many(mut entities) => match entities.len() {
            0 => return Ok(None),
            1 => entities.remove(0),
            count => return Err(AppError::AmbiguousEntity { count }),
        },
    };

    let id = entity
        .key
        .id()
        .map(|id| id.to_json())
        .unwrap_or(serde_json::Value::Null);

    let mut data = entity.properties;
    data.insert(ID_FIELD.to_string(), id);

    Ok(Some(Record { data }))
}
