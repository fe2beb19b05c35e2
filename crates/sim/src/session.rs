use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec3;
use motion_sync::{
    Channel, ConfirmWait, EntityId, ExtraMovementState, FixedTimestep, Inbox, InboxSender, MotionState,
    MovementEntity, MovementWorld, Role, TeleportState, TickDelayPreparer, WaitError, WaitStatus, inbox,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::config::SimConfig;
use crate::events::SimEvent;
use crate::link::{Envelope, Link, LinkStats};

const PLAYER: EntityId = EntityId(1);
const LEG_TICKS: u32 = 60;
const DASH_EVERY: u32 = 90;

/// One side of the session: its own world, its inbox, and the decoder task
/// standing in for the socket thread.
struct Endpoint {
    name: &'static str,
    world: MovementWorld,
    inbox: Inbox,
    wire: mpsc::UnboundedSender<Vec<u8>>,
    decoder: JoinHandle<()>,
    warp_received: bool,
}

impl Endpoint {
    fn new(name: &'static str, role: Role, config: &SimConfig) -> Self {
        let entity = MovementEntity::new(PLAYER, role, Vec3::ZERO, config.movement.clone())
            .with_preparer(Box::new(TickDelayPreparer::new(config.prepare_ticks)));

        let mut world = MovementWorld::new(config.movement.clone());
        world.insert(entity);

        let (sender, inbox) = inbox();
        let (wire, rx) = mpsc::unbounded_channel();
        let decoder = tokio::spawn(decode_loop(name, rx, sender));

        Self {
            name,
            world,
            inbox,
            wire,
            decoder,
            warp_received: false,
        }
    }

    fn entity(&self) -> Option<&MovementEntity> {
        self.world.get(PLAYER)
    }

    fn push_wire(&self, bytes: Vec<u8>) {
        if self.wire.send(bytes).is_err() {
            log::warn!("{}: decoder gone, packet lost", self.name);
        }
    }

    fn step(&mut self, dt: f32) {
        for inbound in self.inbox.drain() {
            if matches!(inbound.message.channel(), Channel::ServerState) {
                self.warp_received = true;
            }
            self.world.route(inbound);
        }

        self.world.step(None, dt);
        self.world.interpolate_latest(1.0);
    }

    /// Reports a warp received this tick once it has actually been applied.
    fn take_applied_warp(&mut self) -> Option<Vec3> {
        if !self.warp_received {
            return None;
        }
        let entity = self.world.get(PLAYER)?;
        if entity.is_preparing_to_teleport() {
            return None;
        }
        self.warp_received = false;
        Some(entity.position())
    }
}

async fn decode_loop(name: &'static str, mut rx: mpsc::UnboundedReceiver<Vec<u8>>, inbox: InboxSender) {
    while let Some(bytes) = rx.recv().await {
        let inbound = match Envelope::deserialize(&bytes)
            .map_err(anyhow::Error::from)
            .and_then(|envelope| envelope.open())
        {
            Ok(inbound) => inbound,
            Err(e) => {
                log::warn!("{name}: dropping undecodable packet: {e:#}");
                continue;
            }
        };
        if !inbox.send(inbound) {
            break;
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityReport {
    pub endpoint: &'static str,
    pub position: Vec3,
    pub yaw: f32,
    pub motion: MotionState,
    pub extra: ExtraMovementState,
    pub server_state: TeleportState,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub ticks: u32,
    pub links: Vec<(&'static str, LinkStats)>,
    pub confirmed_after: Option<Duration>,
    pub entities: Vec<EntityReport>,
}

impl Summary {
    pub fn log(&self) {
        log::info!("Ran {} ticks", self.ticks);
        for (name, stats) in &self.links {
            log::info!(
                "  link {name}: sent {} dropped {} delivered {} ({} bytes)",
                stats.sent,
                stats.dropped,
                stats.delivered,
                stats.bytes
            );
        }
        match self.confirmed_after {
            Some(elapsed) => log::info!("  teleport confirmed after {elapsed:?}"),
            None => log::warn!("  teleport never confirmed"),
        }
        for entity in &self.entities {
            log::info!(
                "  {}: pos {} yaw {:.1} motion {:?} extra {:?} teleport {:?}",
                entity.endpoint,
                entity.position,
                entity.yaw,
                entity.motion,
                entity.extra,
                entity.server_state
            );
        }
    }
}

pub struct Session {
    config: SimConfig,
    timestep: FixedTimestep,
    interval: Interval,
    last_frame: Instant,
    tick: u32,
    server: Endpoint,
    owner: Endpoint,
    proxy: Endpoint,
    uplink: Link,
    to_owner: Link,
    to_proxy: Link,
    wait: Option<ConfirmWait>,
    teleport_started: Option<Instant>,
    confirmed_after: Option<Duration>,
    events: VecDeque<SimEvent>,
}

impl Session {
    /// Must be called from inside a tokio runtime.
    pub fn new(config: SimConfig) -> Self {
        let timestep = FixedTimestep::new(config.tick_rate);
        let mut interval = time::interval(Duration::from_secs_f32(timestep.dt()));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            timestep,
            interval,
            last_frame: Instant::now(),
            tick: 0,
            server: Endpoint::new("server", Role::Server { remote_owner: true }, &config),
            owner: Endpoint::new("owner", Role::OwnerClient, &config),
            proxy: Endpoint::new("proxy", Role::Proxy, &config),
            uplink: Link::new("owner->server", config.link, config.seed),
            to_owner: Link::new("server->owner", config.link, config.seed.wrapping_add(1)),
            to_proxy: Link::new("server->proxy", config.link, config.seed.wrapping_add(2)),
            wait: None,
            teleport_started: None,
            confirmed_after: None,
            events: VecDeque::new(),
            config,
        }
    }

    pub fn finished(&self) -> bool {
        self.tick >= self.config.ticks
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.events.drain(..)
    }

    /// Waits for the next frame and runs every tick that has come due.
    pub async fn tick_once(&mut self) -> Result<u32> {
        self.interval.tick().await;
        // give the decoder tasks a chance to fill the inboxes
        tokio::task::yield_now().await;

        let now = Instant::now();
        self.timestep.accumulate((now - self.last_frame).as_secs_f32());
        self.last_frame = now;

        let mut ticks_run = 0;
        while !self.finished() && self.timestep.consume_tick() {
            self.run_tick(now)?;
            ticks_run += 1;
        }
        Ok(ticks_run)
    }

    fn run_tick(&mut self, now: Instant) -> Result<()> {
        let dt = self.timestep.dt();

        self.deliver(now);
        self.drive_owner();

        self.server.step(dt);
        self.owner.step(dt);
        self.proxy.step(dt);
        self.report_applied_warps();

        if self.tick == self.config.teleport_tick {
            self.issue_teleport(now);
        }

        self.send_outgoing(now)?;
        self.poll_confirm(now);

        self.tick += 1;
        Ok(())
    }

    fn deliver(&mut self, now: Instant) {
        for bytes in self.uplink.take_ready(now) {
            self.server.push_wire(bytes);
        }
        for bytes in self.to_owner.take_ready(now) {
            self.owner.push_wire(bytes);
        }
        for bytes in self.to_proxy.take_ready(now) {
            self.proxy.push_wire(bytes);
        }
    }

    /// Walks a square, sprinting on one leg and dashing now and then.
    fn drive_owner(&mut self) {
        let tick = self.tick;
        let Some(entity) = self.owner.world.get_mut(PLAYER) else {
            return;
        };

        let leg = (tick / LEG_TICKS) % 4;
        let direction = [Vec3::Z, Vec3::X, Vec3::NEG_Z, Vec3::NEG_X][leg as usize];
        let state = if tick % DASH_EVERY == DASH_EVERY / 2 {
            MotionState::IS_DASH
        } else {
            MotionState::NONE
        };
        entity.key_movement(direction, state);

        let extra = if leg == 1 {
            ExtraMovementState::IsSprinting
        } else {
            ExtraMovementState::None
        };
        entity.set_extra_movement_state(extra);
    }

    fn issue_teleport(&mut self, now: Instant) {
        let Some(entity) = self.server.world.get_mut(PLAYER) else {
            return;
        };

        let target = self.config.teleport_target;
        if entity.teleport(target, self.config.teleport_yaw, self.config.keep_moving) {
            self.events.push_back(SimEvent::TeleportIssued {
                tick: self.tick,
                target,
            });
            self.teleport_started = Some(now);
            self.wait = Some(ConfirmWait::new(
                now,
                self.config.confirm_timeout,
                self.config.movement.confirm_poll_interval,
            ));
        } else {
            self.events.push_back(SimEvent::TeleportRejected { tick: self.tick });
        }
    }

    fn report_applied_warps(&mut self) {
        for endpoint in [&mut self.owner, &mut self.proxy] {
            if let Some(position) = endpoint.take_applied_warp() {
                self.events.push_back(SimEvent::TeleportApplied {
                    endpoint: endpoint.name,
                    tick: self.tick,
                    position,
                });
            }
        }
    }

    fn send_outgoing(&mut self, now: Instant) -> Result<()> {
        for (id, message) in self.server.world.outgoing() {
            if message.channel() == Channel::ServerState {
                let position = self.server.entity().map_or(Vec3::ZERO, MovementEntity::position);
                self.events.push_back(SimEvent::TeleportApplied {
                    endpoint: self.server.name,
                    tick: self.tick,
                    position,
                });
            }

            let envelope = Envelope::wrap(id, self.tick, &message);
            self.to_owner.send(&envelope, now)?;
            self.to_proxy.send(&envelope, now)?;
        }

        for (id, message) in self.owner.world.outgoing() {
            let envelope = Envelope::wrap(id, self.tick, &message);
            self.uplink.send(&envelope, now)?;
        }
        Ok(())
    }

    fn poll_confirm(&mut self, now: Instant) {
        let Some(wait) = self.wait.as_mut() else {
            return;
        };

        let tick = self.tick;
        match self.server.world.poll_confirm(PLAYER, wait, now) {
            Ok(WaitStatus::Pending) => return,
            Ok(WaitStatus::Confirmed) => {
                let elapsed = self.teleport_started.map_or(Duration::ZERO, |start| now - start);
                self.confirmed_after = Some(elapsed);
                self.events.push_back(SimEvent::TeleportConfirmed { tick, elapsed });
            }
            Ok(WaitStatus::EntityGone) => self.events.push_back(SimEvent::EntityLost { tick }),
            Err(WaitError::TimedOut(waited)) => {
                self.events.push_back(SimEvent::TeleportTimedOut { tick, waited });
            }
        }
        self.wait = None;
    }

    pub fn summary(&self) -> Summary {
        let entities = [&self.server, &self.owner, &self.proxy]
            .into_iter()
            .filter_map(|endpoint| {
                endpoint.entity().map(|entity| EntityReport {
                    endpoint: endpoint.name,
                    position: entity.position(),
                    yaw: entity.look_rotation(),
                    motion: entity.motion_state(),
                    extra: entity.extra_state(),
                    server_state: entity.server_teleport_state(),
                })
            })
            .collect();

        Summary {
            ticks: self.tick,
            links: [&self.uplink, &self.to_owner, &self.to_proxy]
                .into_iter()
                .map(|link| (link.name(), link.stats()))
                .collect(),
            confirmed_after: self.confirmed_after,
            entities,
        }
    }

    /// Closes the wires and waits for the decoder tasks to drain.
    pub async fn shutdown(self) {
        let in_flight = self.uplink.in_flight() + self.to_owner.in_flight() + self.to_proxy.in_flight();
        if in_flight > 0 {
            log::debug!("Shutting down with {in_flight} packets in flight");
        }

        for endpoint in [self.server, self.owner, self.proxy] {
            let Endpoint { name, wire, decoder, .. } = endpoint;
            drop(wire);
            if let Err(e) = decoder.await {
                log::warn!("{name}: decoder task failed: {e}");
            }
        }
    }
}
