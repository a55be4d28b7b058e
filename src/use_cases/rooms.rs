// Room membership bookkeeping for connections and entities.

use crate::domain::{ConnectionId, Entity, EntityId, PlayerId, RoomId, SessionError};
use std::collections::{HashMap, HashSet};

/// Members and owned entities of a single room.
#[derive(Debug, Default)]
struct Room {
    /// Connections currently assigned to the room.
    members: HashSet<ConnectionId>,
    /// Entities spawned into the room, by id.
    entities: HashMap<EntityId, Entity>,
}

/// Registry of rooms keyed by their external id.
///
/// Owned by the session loop, so no locking is needed. Rooms are created lazily and live
/// for the lifetime of the process.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Map of room id to room state.
    rooms: HashMap<RoomId, Room>,
    /// Reverse index of connection to room.
    connections: HashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a connection to a room, creating the room on first use.
    /// Returns true when the room was created by this call.
    pub fn assign_connection(
        &mut self,
        conn_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<bool, SessionError> {
        if self.connections.contains_key(&conn_id) {
            return Err(SessionError::DuplicateConnection(conn_id));
        }

        let created = !self.rooms.contains_key(&room_id);
        self.rooms
            .entry(room_id.clone())
            .or_default()
            .members
            .insert(conn_id);
        self.connections.insert(conn_id, room_id);
        Ok(created)
    }

    /// Removes a connection from its room. The room itself is kept.
    pub fn release_connection(&mut self, conn_id: ConnectionId) -> Option<RoomId> {
        let room_id = self.connections.remove(&conn_id)?;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.members.remove(&conn_id);
        }
        Some(room_id)
    }

    pub fn room_of(&self, conn_id: ConnectionId) -> Option<&RoomId> {
        self.connections.get(&conn_id)
    }

    /// Records entity membership in the entity's room.
    pub fn assign_entity(&mut self, entity: Entity) {
        self.rooms
            .entry(entity.room_id.clone())
            .or_default()
            .entities
            .insert(entity.id, entity);
    }

    pub fn release_entity(&mut self, entity: &Entity) {
        if let Some(room) = self.rooms.get_mut(&entity.room_id) {
            room.entities.remove(&entity.id);
        }
    }

    /// All entities owned by a player, across every room.
    pub fn query_entities_by_owner(&self, player_id: PlayerId) -> Vec<Entity> {
        self.rooms
            .values()
            .flat_map(|room| room.entities.values())
            .filter(|entity| entity.owner_id == player_id)
            .cloned()
            .collect()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    pub fn entity_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.entities.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;

    fn room(id: &str) -> RoomId {
        RoomId::parse(id).expect("room id")
    }

    fn ship(id: EntityId, owner_id: PlayerId, room_id: &str) -> Entity {
        Entity {
            id,
            owner_id,
            room_id: room(room_id),
            kind: EntityKind::Ship,
        }
    }

    #[test]
    fn when_first_connection_arrives_then_room_is_created_lazily() {
        let mut registry = RoomRegistry::new();

        let created = registry.assign_connection(1, room("abc")).expect("assign");
        let created_again = registry.assign_connection(2, room("abc")).expect("assign");

        assert!(created);
        assert!(!created_again);
        assert_eq!(registry.member_count(&room("abc")), 2);
        assert_eq!(registry.room_of(2), Some(&room("abc")));
    }

    #[test]
    fn when_connection_is_assigned_twice_then_returns_duplicate_connection() {
        let mut registry = RoomRegistry::new();
        registry.assign_connection(1, room("abc")).expect("assign");

        let result = registry.assign_connection(1, room("other"));

        assert_eq!(result, Err(SessionError::DuplicateConnection(1)));
        assert!(!registry.contains_room(&room("other")));
    }

    #[test]
    fn when_connection_is_released_then_room_survives() {
        let mut registry = RoomRegistry::new();
        registry.assign_connection(1, room("abc")).expect("assign");

        assert_eq!(registry.release_connection(1), Some(room("abc")));
        assert!(registry.contains_room(&room("abc")));
        assert_eq!(registry.member_count(&room("abc")), 0);
        assert_eq!(registry.release_connection(1), None);
    }

    #[test]
    fn when_querying_by_owner_then_entities_from_every_room_are_returned() {
        let mut registry = RoomRegistry::new();
        registry.assign_entity(ship(10, 7, "abc"));
        registry.assign_entity(ship(11, 7, "xyz"));
        registry.assign_entity(ship(12, 8, "abc"));

        let mut owned: Vec<EntityId> = registry
            .query_entities_by_owner(7)
            .into_iter()
            .map(|e| e.id)
            .collect();
        owned.sort_unstable();

        assert_eq!(owned, vec![10, 11]);
    }

    #[test]
    fn when_entity_is_released_then_it_leaves_its_room() {
        let mut registry = RoomRegistry::new();
        let entity = ship(10, 7, "abc");
        registry.assign_entity(entity.clone());

        registry.release_entity(&entity);

        assert_eq!(registry.entity_count(&room("abc")), 0);
        assert!(registry.query_entities_by_owner(7).is_empty());
    }
}
