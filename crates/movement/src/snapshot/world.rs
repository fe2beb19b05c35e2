use std::collections::HashMap;
use std::time::Instant;

use glam::Vec3;

use crate::config::MovementConfig;
use crate::net::{Inbound, Inbox, WireMessage};
use crate::role::Role;
use crate::state::TeleportState;
use crate::teleport::{ConfirmWait, WaitError, WaitStatus};

use super::entity::{EntityId, MovementEntity};

#[derive(Debug)]
pub struct MovementWorld {
    tick: u32,
    config: MovementConfig,
    entities: HashMap<EntityId, MovementEntity>,
    next_entity_id: u32,
}

impl Default for MovementWorld {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

impl MovementWorld {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            tick: 0,
            config,
            entities: HashMap::new(),
            next_entity_id: 1,
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn set_tick(&mut self, tick: u32) {
        self.tick = tick;
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn spawn(&mut self, role: Role, spawn_position: Vec3) -> EntityId {
        let id = EntityId(self.allocate_id());
        self.insert(MovementEntity::new(id, role, spawn_position, self.config.clone()))
    }

    pub fn spawn_with_id(&mut self, id: EntityId, role: Role, spawn_position: Vec3) -> EntityId {
        self.insert(MovementEntity::new(id, role, spawn_position, self.config.clone()))
    }

    /// Adds a pre-built entity, replacing any entity with the same id.
    pub fn insert(&mut self, entity: MovementEntity) -> EntityId {
        let id = entity.id();
        if id.0 >= self.next_entity_id {
            self.next_entity_id = id.0 + 1;
        }
        self.entities.insert(id, entity);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<MovementEntity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&MovementEntity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut MovementEntity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &MovementEntity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut MovementEntity> {
        self.entities.values_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Drains everything the I/O side has queued, then steps every entity.
    pub fn step(&mut self, inbox: Option<&Inbox>, delta_time: f32) -> u32 {
        if let Some(inbox) = inbox {
            self.drain(inbox);
        }
        for entity in self.entities.values_mut() {
            entity.update(delta_time);
        }
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    pub fn drain(&mut self, inbox: &Inbox) -> usize {
        let mut routed = 0;
        for inbound in inbox.drain() {
            if self.route(inbound) {
                routed += 1;
            }
        }
        routed
    }

    pub fn route(&mut self, inbound: Inbound) -> bool {
        match self.entities.get_mut(&inbound.entity) {
            Some(entity) => {
                entity.receive(inbound.tick, inbound.message);
                true
            }
            None => {
                log::debug!("Dropping {:?} for unknown entity {:?}", inbound.message.channel(), inbound.entity);
                false
            }
        }
    }

    /// Collects every entity's outgoing messages for this tick.
    pub fn outgoing(&mut self) -> Vec<(EntityId, WireMessage)> {
        let mut messages = Vec::new();
        for entity in self.entities.values_mut() {
            let id = entity.id();
            messages.extend(entity.outgoing().into_iter().map(|message| (id, message)));
        }
        messages
    }

    /// Per-entity interpolation against each entity's newest recorded tick.
    /// Remote ticks are unrelated to the local tick counter.
    pub fn interpolate_latest(&mut self, time_fraction: f32) {
        for entity in self.entities.values_mut() {
            entity.interpolate_latest(time_fraction);
        }
    }

    pub fn server_teleport_state(&self, id: EntityId) -> Option<TeleportState> {
        self.entities.get(&id).map(MovementEntity::server_teleport_state)
    }

    pub fn poll_confirm(&self, id: EntityId, wait: &mut ConfirmWait, now: Instant) -> Result<WaitStatus, WaitError> {
        wait.poll(now, self.server_teleport_state(id))
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::net::{TeleportAck, inbox};

    #[test]
    fn spawn_allocates_past_explicit_ids() {
        let mut world = MovementWorld::default();
        world.spawn_with_id(EntityId(7), Role::Proxy, Vec3::ZERO);
        let next = world.spawn(Role::OwnerClient, Vec3::ZERO);

        assert_eq!(next, EntityId(8));
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn unknown_entity_is_dropped() {
        let mut world = MovementWorld::default();
        let routed = world.route(Inbound {
            entity: EntityId(99),
            tick: 0,
            message: WireMessage::Ack(TeleportAck::default()),
        });
        assert!(!routed);
    }

    #[test]
    fn step_drains_inbox_before_update() {
        let mut world = MovementWorld::default();
        let id = world.spawn(Role::Server { remote_owner: true }, Vec3::ZERO);
        world.get_mut(id).unwrap().teleport(Vec3::new(4.0, 0.0, 0.0), 0.0, false);
        world.outgoing();
        assert!(world.get(id).unwrap().is_waiting_teleport_confirm());

        let (tx, rx) = inbox();
        tx.send(Inbound {
            entity: id,
            tick: 0,
            message: WireMessage::Ack(TeleportAck::default()),
        });

        world.step(Some(&rx), 1.0 / 30.0);
        assert_eq!(world.tick(), 1);
        assert!(!world.get(id).unwrap().is_waiting_teleport_confirm());
    }

    #[test]
    fn confirm_wait_sees_despawn() {
        let mut world = MovementWorld::default();
        let id = world.spawn(Role::Server { remote_owner: true }, Vec3::ZERO);
        world.get_mut(id).unwrap().teleport(Vec3::new(4.0, 0.0, 0.0), 0.0, false);

        let start = Instant::now();
        let mut wait = ConfirmWait::new(start, Duration::from_secs(5), Duration::from_millis(100));
        assert_eq!(world.poll_confirm(id, &mut wait, start), Ok(WaitStatus::Pending));

        world.despawn(id);
        let later = start + Duration::from_millis(200);
        assert_eq!(world.poll_confirm(id, &mut wait, later), Ok(WaitStatus::EntityGone));
    }
}
