use std::fmt;

use glam::Vec3;

use crate::bounds::{Bounds, CylinderShape};
use crate::config::{MovementCapabilities, MovementConfig};
use crate::force::{ForceApplier, ForceComposer, ForceMode, ForceSource, ForceSourceType, ForceUpdateListener};
use crate::integrator::{IntegratorContext, MovementIntegrator};
use crate::nav::{Navigator, StraightLineAgent};
use crate::net::{MotionSnapshot, TeleportAck, TeleportRequest, WireMessage};
use crate::role::Role;
use crate::rotation::RotationSmoother;
use crate::state::{ExtraMovementState, MotionState, TeleportState};
use crate::teleport::{TeleportCoordinator, TeleportPreparer, Warp};

use super::buffer::{TickState, TickStateBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// One moving entity and every movement component it owns.
pub struct MovementEntity {
    id: EntityId,
    role: Role,
    position: Vec3,
    scale: Vec3,
    can_move: bool,
    can_turn: bool,
    config: MovementConfig,
    rotation: RotationSmoother,
    forces: ForceComposer,
    integrator: MovementIntegrator,
    history: TickStateBuffer,
    teleport: TeleportCoordinator,
    navigator: Box<dyn Navigator>,
    preparer: Option<Box<dyn TeleportPreparer>>,
}

impl fmt::Debug for MovementEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementEntity")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("position", &self.position)
            .field("yaw", &self.rotation.yaw())
            .field("motion", &self.integrator.motion_state())
            .field("extra", &self.integrator.extra_state())
            .field("teleport", &self.teleport)
            .finish_non_exhaustive()
    }
}

impl MovementEntity {
    pub fn new(id: EntityId, role: Role, spawn_position: Vec3, config: MovementConfig) -> Self {
        let mut navigator = StraightLineAgent::new(config.speeds.base_speed, 0.1);
        navigator.warp(spawn_position);

        Self {
            id,
            role,
            position: spawn_position,
            scale: Vec3::ONE,
            can_move: true,
            can_turn: true,
            rotation: RotationSmoother::new(0.0, config.turn_speed, config.turn_deadband_degrees),
            forces: ForceComposer::new(role.can_simulate()),
            integrator: MovementIntegrator::new(&config),
            history: TickStateBuffer::new(config.tick_history_capacity, config.interpolation_switch_point),
            teleport: TeleportCoordinator::new(role, config.min_teleport_distance),
            navigator: Box::new(navigator),
            preparer: None,
            config,
        }
    }

    pub fn with_navigator(mut self, mut navigator: Box<dyn Navigator>) -> Self {
        navigator.warp(self.position);
        self.navigator = navigator;
        self
    }

    pub fn with_preparer(mut self, preparer: Box<dyn TeleportPreparer>) -> Self {
        self.preparer = Some(preparer);
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.rotation.turn_immediately(yaw);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn motion_state(&self) -> MotionState {
        self.integrator.motion_state()
    }

    pub fn extra_state(&self) -> ExtraMovementState {
        self.integrator.extra_state()
    }

    pub fn forces(&self) -> &ForceComposer {
        &self.forces
    }

    pub fn history(&self) -> &TickStateBuffer {
        &self.history
    }

    pub fn teleport_coordinator(&self) -> &TeleportCoordinator {
        &self.teleport
    }

    pub fn navigator(&self) -> &dyn Navigator {
        &*self.navigator
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn set_can_move(&mut self, can_move: bool) {
        self.can_move = can_move;
        if !can_move {
            self.stop_move();
        }
    }

    pub fn can_turn(&self) -> bool {
        self.can_turn
    }

    pub fn set_can_turn(&mut self, can_turn: bool) {
        self.can_turn = can_turn;
    }

    /// Runs one simulation tick. Teleport preparation is advanced on every
    /// role; integration only runs on the side that owns the simulation.
    pub fn update(&mut self, delta_time: f32) -> MotionState {
        self.advance_teleport();

        if !self.role.can_simulate() {
            return self.integrator.motion_state();
        }

        let preparing = self.is_preparing_to_teleport();
        let ctx = IntegratorContext {
            position: &mut self.position,
            forces: &mut self.forces,
            rotation: &mut self.rotation,
            navigator: &mut *self.navigator,
            speeds: &self.config.speeds,
            can_turn: self.can_turn,
        };
        let state = self.integrator.step(ctx, delta_time, preparing);

        if !preparing {
            self.rotation.update(delta_time);
        }
        state
    }

    // Input

    pub fn key_movement(&mut self, direction: Vec3, state: MotionState) {
        if !self.accepts_input() {
            return;
        }
        self.integrator.set_input_direction(direction.clamp_length_max(1.0));
        if state.has(MotionState::IS_DASH) && self.capabilities().dash {
            self.integrator.request_dash();
        }
    }

    pub fn point_click_movement(&mut self, destination: Vec3) {
        if !self.accepts_input() {
            return;
        }
        self.integrator.set_input_direction(Vec3::ZERO);
        self.navigator.set_destination(destination);
    }

    pub fn set_extra_movement_state(&mut self, extra: ExtraMovementState) {
        if !self.accepts_input() {
            return;
        }
        self.integrator.set_requested_extra(extra);
    }

    pub fn set_look_rotation(&mut self, yaw: f32, immediately: bool) {
        if !self.can_turn || !self.role.can_simulate() {
            return;
        }
        if immediately {
            self.rotation.turn_immediately(yaw);
        } else {
            self.rotation.look_at(yaw);
        }
    }

    pub fn look_rotation(&self) -> f32 {
        self.rotation.yaw()
    }

    pub fn target_look_rotation(&self) -> f32 {
        self.rotation.target_yaw()
    }

    pub fn stop_move(&mut self) {
        self.integrator.set_input_direction(Vec3::ZERO);
        self.navigator.stop();
    }

    pub fn smooth_turn_speed(&self) -> f32 {
        self.rotation.turn_speed()
    }

    pub fn set_smooth_turn_speed(&mut self, turn_speed: f32) {
        self.rotation.set_turn_speed(turn_speed);
    }

    fn accepts_input(&self) -> bool {
        self.can_move && self.role.can_simulate()
    }

    // Queries

    pub fn current_move_speed(&self) -> f32 {
        if self.navigator.is_stopped() {
            0.0
        } else {
            self.navigator.speed()
        }
    }

    pub fn remaining_path_distance(&self) -> Option<f32> {
        if !self.navigator.has_active_path() {
            return None;
        }
        self.navigator.path_end_distance()
    }

    pub fn is_waiting_teleport_confirm(&self) -> bool {
        self.teleport.is_waiting_confirm()
    }

    /// True while a warp is pending or the preparer has not settled yet.
    pub fn is_preparing_to_teleport(&self) -> bool {
        self.teleport.is_preparing() || self.preparer.as_ref().is_some_and(|preparer| preparer.is_preparing())
    }

    pub fn capabilities(&self) -> MovementCapabilities {
        self.config.capabilities
    }

    pub fn movement_bounds(&self, shape: &CylinderShape) -> Bounds {
        shape.bounds(self.position, self.scale)
    }

    // Forces

    pub fn add_force_listener(&mut self, listener: Box<dyn ForceUpdateListener>) {
        self.forces.add_listener(listener);
    }

    pub fn apply_force(
        &mut self,
        mode: ForceMode,
        direction: Vec3,
        source: ForceSource,
        force: f32,
        deceleration: f32,
        duration: f32,
    ) -> bool {
        self.forces.apply(mode, direction, source, force, deceleration, duration)
    }

    pub fn find_force_by_source(&self, source_type: ForceSourceType, source_id: i32) -> Option<&ForceApplier> {
        self.forces.find_by_source(source_type, source_id)
    }

    pub fn clear_all_forces(&mut self) -> bool {
        self.forces.clear_all()
    }

    // Teleport

    pub fn teleport(&mut self, position: Vec3, yaw: f32, keep_moving: bool) -> bool {
        let warp = Warp {
            position,
            yaw,
            keep_moving,
        };
        if !self.teleport.request(warp, self.position) {
            return false;
        }

        self.begin_preparation(&warp);
        true
    }

    fn begin_preparation(&mut self, warp: &Warp) {
        if let Some(preparer) = self.preparer.as_mut() {
            preparer.prepare(warp.position, warp.yaw);
        }
        self.advance_teleport();
    }

    fn advance_teleport(&mut self) {
        let preparer = self
            .preparer
            .as_mut()
            .map(|preparer| &mut **preparer as &mut dyn TeleportPreparer);

        if let Some(warp) = self.teleport.poll_preparation(preparer) {
            self.apply_warp(&warp);
            self.teleport.complete(&warp);
        }
    }

    fn apply_warp(&mut self, warp: &Warp) {
        let destination = self.navigator.destination();

        self.position = warp.position;
        self.navigator.warp(warp.position);
        match destination {
            Some(destination) if warp.keep_moving => self.navigator.set_destination(destination),
            _ => self.navigator.stop(),
        }
        self.rotation.turn_immediately(warp.yaw);
    }

    // Wire

    /// Owner-side state for this tick; `None` on instances that only observe.
    pub fn write_motion_snapshot(&self) -> Option<MotionSnapshot> {
        if !self.role.can_simulate() && !self.role.is_authority() {
            return None;
        }
        Some(MotionSnapshot {
            motion: self.integrator.motion_state(),
            extra: self.integrator.extra_state(),
        })
    }

    pub fn read_motion_snapshot(&mut self, tick: u32, snapshot: MotionSnapshot) {
        if self.role.can_simulate() {
            return;
        }
        self.history.record(tick, TickState::new(snapshot.motion, snapshot.extra));
    }

    /// Applies the recorded discrete state between two ticks. A miss keeps the
    /// current state.
    pub fn interpolate(&mut self, from_tick: u32, to_tick: u32, time_fraction: f32) {
        if self.role.can_simulate() {
            return;
        }
        if let Some(state) = self.history.interpolate(from_tick, to_tick, time_fraction) {
            self.integrator.set_states(state.motion, state.extra);
        }
    }

    /// Interpolates towards the newest recorded tick, using the tick before
    /// it as the source. Keeps the current state when nothing was recorded.
    pub fn interpolate_latest(&mut self, time_fraction: f32) {
        if let Some((tick, _)) = self.history.latest() {
            self.interpolate(tick.wrapping_sub(1), tick, time_fraction);
        }
    }

    pub fn write_server_state(&mut self) -> Option<TeleportRequest> {
        self.teleport.write_server_state(self.position, self.rotation.yaw())
    }

    pub fn read_server_state(&mut self, request: TeleportRequest) {
        if self.role.is_authority() {
            log::warn!("{:?} ignoring teleport request on the authority", self.id);
            return;
        }
        if let Some(warp) = self.teleport.receive_request(request) {
            self.begin_preparation(&warp);
        }
    }

    pub fn write_client_state(&mut self) -> Option<TeleportAck> {
        self.teleport.write_client_state()
    }

    pub fn read_client_state(&mut self, ack: TeleportAck) {
        if !self.role.is_authority() {
            return;
        }
        self.teleport.receive_ack(ack);
    }

    /// Every message this entity wants to send this tick.
    pub fn outgoing(&mut self) -> Vec<WireMessage> {
        let mut messages = Vec::new();
        if let Some(request) = self.write_server_state() {
            messages.push(WireMessage::Request(request));
        }
        if let Some(ack) = self.write_client_state() {
            messages.push(WireMessage::Ack(ack));
        }
        if let Some(snapshot) = self.write_motion_snapshot() {
            messages.push(WireMessage::Motion(snapshot));
        }
        messages
    }

    pub fn receive(&mut self, tick: u32, message: WireMessage) {
        match message {
            WireMessage::Motion(snapshot) => self.read_motion_snapshot(tick, snapshot),
            WireMessage::Request(request) => self.read_server_state(request),
            WireMessage::Ack(ack) => self.read_client_state(ack),
        }
    }

    pub fn server_teleport_state(&self) -> TeleportState {
        self.teleport.server_state()
    }

    pub fn client_teleport_state(&self) -> TeleportState {
        self.teleport.client_state()
    }
}
