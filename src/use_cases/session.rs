// Authoritative room session state and the single event loop that owns it.

use super::debounce::Debounce;
use super::rooms::RoomRegistry;
use super::types::{ConnectRequest, ScoreBoard, ScoreView, SessionEvent};
use crate::domain::ports::NameGenerator;
use crate::domain::{
    Connection, ConnectionId, ConnectionPhase, EntityId, EntityKind, PlayerId, RoomId, ScoreEntry,
    ScoreRecord, SessionError, World,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Hooks a room-scoped session server exposes to the event dispatcher.
pub trait RoomSession {
    fn on_connect(&mut self, request: ConnectRequest) -> Result<(), SessionError>;
    fn on_restart_requested(&mut self, conn_id: ConnectionId) -> Result<EntityId, SessionError>;
    fn on_projectile_fired(&mut self, conn_id: ConnectionId) -> Result<EntityId, SessionError>;
    fn on_entity_destroyed(
        &mut self,
        destroyer: EntityId,
        destroyed: EntityId,
    ) -> Result<(), SessionError>;
    fn on_disconnect(
        &mut self,
        conn_id: ConnectionId,
        player_id: PlayerId,
    ) -> Result<(), SessionError>;
}

pub struct SessionServer {
    rooms: RoomRegistry,
    world: World,
    connections: HashMap<ConnectionId, Connection>,
    // Room-scoped live score tables, keyed by player.
    scores: HashMap<RoomId, BTreeMap<PlayerId, ScoreRecord>>,
    names: Arc<dyn NameGenerator>,
}

impl SessionServer {
    pub fn new(names: Arc<dyn NameGenerator>) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            world: World::new(),
            connections: HashMap::new(),
            scores: HashMap::new(),
            names,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn connection(&self, conn_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&conn_id)
    }

    pub fn score_record(&self, room_id: &RoomId, player_id: PlayerId) -> Option<&ScoreRecord> {
        self.scores.get(room_id)?.get(&player_id)
    }

    /// Full room -> player -> score map sent to every client.
    pub fn score_board(&self) -> ScoreBoard {
        self.scores
            .iter()
            .map(|(room_id, table)| {
                let views = table
                    .iter()
                    .map(|(player_id, record)| {
                        (
                            *player_id,
                            ScoreView {
                                kills: record.kills,
                                name: record.name.clone(),
                            },
                        )
                    })
                    .collect();
                (room_id.clone(), views)
            })
            .collect()
    }

    /// Live leaderboard candidates for a room, best first.
    pub fn snapshot(&self, room_id: &RoomId) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self
            .scores
            .get(room_id)
            .map(|table| {
                table
                    .values()
                    .map(|record| ScoreEntry {
                        id: record.identity_id.clone(),
                        score: record.kills,
                        name: record.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Routes one event to its handler. Returns true when a score broadcast is due.
    pub fn dispatch(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::ConnectionOpened(request) => {
                let conn_id = request.conn_id;
                let player_id = request.player_id;
                let room_id = request.room_id.clone();
                let can_play = request.verification.authorized;
                match self.on_connect(request) {
                    Ok(()) => info!(conn_id, player_id, %room_id, can_play, "connection assigned"),
                    Err(e) => warn!(conn_id, %room_id, error = %e, "connection rejected"),
                }
                false
            }
            SessionEvent::RestartRequested { conn_id } => {
                match self.on_restart_requested(conn_id) {
                    Ok(ship_id) => {
                        debug!(conn_id, ship_id, "ship spawned");
                        true
                    }
                    Err(e) => {
                        debug!(conn_id, error = %e, "restart ignored");
                        false
                    }
                }
            }
            SessionEvent::ProjectileFired { conn_id } => {
                if let Err(e) = self.on_projectile_fired(conn_id) {
                    debug!(conn_id, error = %e, "fire ignored");
                }
                false
            }
            SessionEvent::EntityDestroyed {
                destroyer,
                destroyed,
            } => match self.on_entity_destroyed(destroyer, destroyed) {
                Ok(()) => true,
                Err(SessionError::StaleReference(entity_id)) => {
                    debug!(entity_id, "destroyed entity already gone; skipping");
                    false
                }
                Err(e) => {
                    warn!(destroyer, destroyed, error = %e, "failed to apply destruction");
                    false
                }
            },
            SessionEvent::ConnectionClosed { conn_id, player_id } => {
                if let Err(e) = self.on_disconnect(conn_id, player_id) {
                    debug!(conn_id, player_id, error = %e, "disconnect of unassigned connection");
                }
                true
            }
            SessionEvent::SnapshotRequested { room_id, reply } => {
                // Receiver may have timed out; nothing to do then.
                let _ = reply.send(self.snapshot(&room_id));
                false
            }
        }
    }

    fn playable_connection(&self, conn_id: ConnectionId) -> Result<&Connection, SessionError> {
        let conn = self
            .connections
            .get(&conn_id)
            .ok_or(SessionError::UnknownConnection(conn_id))?;
        if !conn.can_play {
            return Err(SessionError::VerificationFailure);
        }
        Ok(conn)
    }

    fn active_ship(&self, conn: &Connection) -> Option<EntityId> {
        match conn.phase {
            ConnectionPhase::ShipActive { ship_id } if self.world.contains(ship_id) => Some(ship_id),
            _ => None,
        }
    }
}

impl RoomSession for SessionServer {
    fn on_connect(&mut self, request: ConnectRequest) -> Result<(), SessionError> {
        let ConnectRequest {
            conn_id,
            player_id,
            room_id,
            verification,
        } = request;

        if self.rooms.assign_connection(conn_id, room_id.clone())? {
            info!(%room_id, "room created");
        }
        self.scores.entry(room_id.clone()).or_default();

        let identity_id = verification
            .identity_id
            .unwrap_or_else(|| format!("player-{player_id}"));
        self.connections.insert(
            conn_id,
            Connection {
                id: conn_id,
                player_id,
                room_id,
                identity_id,
                can_play: verification.authorized,
                display_name: verification.display_name,
                phase: ConnectionPhase::Assigned,
            },
        );
        Ok(())
    }

    fn on_restart_requested(&mut self, conn_id: ConnectionId) -> Result<EntityId, SessionError> {
        let conn = self.playable_connection(conn_id)?;
        if let Some(ship_id) = self.active_ship(conn) {
            return Err(SessionError::ShipAlreadyActive(ship_id));
        }
        let player_id = conn.player_id;
        let room_id = conn.room_id.clone();
        let identity_id = conn.identity_id.clone();

        let ship = self.world.spawn(EntityKind::Ship, player_id, room_id.clone());
        let ship_id = ship.id;
        self.rooms.assign_entity(ship);
        self.scores.entry(room_id).or_default().insert(
            player_id,
            ScoreRecord {
                entity_id: ship_id,
                identity_id,
                kills: 0,
                name: self.names.generate(),
            },
        );

        if let Some(conn) = self.connections.get_mut(&conn_id) {
            conn.phase = ConnectionPhase::ShipActive { ship_id };
        }
        Ok(ship_id)
    }

    fn on_projectile_fired(&mut self, conn_id: ConnectionId) -> Result<EntityId, SessionError> {
        let conn = self.playable_connection(conn_id)?;
        let Some(ship_id) = self.active_ship(conn) else {
            return Err(SessionError::NoActiveShip(conn_id));
        };
        let player_id = conn.player_id;
        let room_id = conn.room_id.clone();

        let projectile = self.world.spawn(EntityKind::Projectile, player_id, room_id);
        let projectile_id = projectile.id;
        self.rooms.assign_entity(projectile);
        debug!(conn_id, ship_id, projectile_id, "projectile spawned");
        Ok(projectile_id)
    }

    fn on_entity_destroyed(
        &mut self,
        destroyer: EntityId,
        destroyed: EntityId,
    ) -> Result<(), SessionError> {
        let killer_id = self.world.get(destroyer).map(|entity| entity.owner_id);
        let victim = self
            .world
            .remove(destroyed)
            .ok_or(SessionError::StaleReference(destroyed))?;
        self.rooms.release_entity(&victim);

        if victim.kind != EntityKind::Ship {
            return Ok(());
        }

        if let Some(table) = self.scores.get_mut(&victim.room_id) {
            match killer_id.filter(|killer| *killer != victim.owner_id) {
                Some(killer) => match table.get_mut(&killer) {
                    Some(record) => record.kills += 1,
                    None => debug!(killer, "killer has no score record; kill not credited"),
                },
                None => debug!(destroyer, "no creditable killer"),
            }

            let owns_victim = table
                .get(&victim.owner_id)
                .is_some_and(|record| record.entity_id == victim.id);
            if owns_victim {
                table.remove(&victim.owner_id);
            }
        }

        for conn in self.connections.values_mut() {
            if conn.phase == (ConnectionPhase::ShipActive { ship_id: victim.id }) {
                conn.phase = ConnectionPhase::ShipDestroyed;
            }
        }

        info!(
            victim_id = victim.owner_id,
            shooter_id = ?killer_id,
            ship_id = victim.id,
            room_id = %victim.room_id,
            "ship destroyed"
        );
        Ok(())
    }

    fn on_disconnect(
        &mut self,
        conn_id: ConnectionId,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        let known = self.connections.remove(&conn_id).is_some();
        self.rooms.release_connection(conn_id);

        // Ship and projectiles go with the player.
        for entity in self.rooms.query_entities_by_owner(player_id) {
            self.world.remove(entity.id);
            self.rooms.release_entity(&entity);
        }
        for table in self.scores.values_mut() {
            table.remove(&player_id);
        }

        if known {
            Ok(())
        } else {
            Err(SessionError::UnknownConnection(conn_id))
        }
    }
}

/// Event loop owning all room state. Every mutation happens here, one event at a time.
pub async fn session_task(
    mut server: SessionServer,
    mut events_rx: mpsc::Receiver<SessionEvent>,
    scores_tx: broadcast::Sender<ScoreBoard>,
    broadcast_debounce: Duration,
) {
    let mut debounce = Debounce::new(broadcast_debounce);

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else {
                    info!("session events closed; session loop exiting");
                    break;
                };
                if server.dispatch(event) {
                    debounce.schedule();
                }
            }
            _ = debounce.elapsed() => {
                // No subscribers is fine; clients read the latest board on connect.
                let _ = scores_tx.send(server.score_board());
            }
        }
    }
}
