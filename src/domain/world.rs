// Domain-level table of live simulated objects.

use crate::domain::entities::{Entity, EntityId, EntityKind, PlayerId, RoomId};
use std::collections::HashMap;

/// Tracks which ships and projectiles exist and who owns them.
/// Movement and collision are resolved by the external simulation.
#[derive(Debug)]
pub struct World {
    entities: HashMap<EntityId, Entity>,
    next_entity_id: EntityId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_entity_id: 1,
        }
    }

    pub fn spawn(&mut self, kind: EntityKind, owner_id: PlayerId, room_id: RoomId) -> Entity {
        let entity = Entity {
            id: self.next_entity_id,
            owner_id,
            room_id,
            kind,
        };
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        self.entities.insert(entity.id, entity.clone());
        entity
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&Entity> {
        self.entities.get(&entity_id)
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entities.contains_key(&entity_id)
    }

    pub fn remove(&mut self, entity_id: EntityId) -> Option<Entity> {
        self.entities.remove(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
