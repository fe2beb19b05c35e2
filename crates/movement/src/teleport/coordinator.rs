use glam::Vec3;

use crate::net::{TeleportAck, TeleportRequest};
use crate::role::Role;
use crate::state::TeleportState;

use super::preparer::{Preparation, TeleportPreparer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Warp {
    pub position: Vec3,
    pub yaw: f32,
    pub keep_moving: bool,
}

impl From<TeleportRequest> for Warp {
    fn from(request: TeleportRequest) -> Self {
        Self {
            position: request.position,
            yaw: request.yaw,
            keep_moving: request.keep_moving(),
        }
    }
}

/// Request/acknowledge state machine for position warps. Holds one state for
/// the authority side and one for the responding side; the entity applies the
/// warp itself once `poll_preparation` hands it back.
#[derive(Debug, Clone)]
pub struct TeleportCoordinator {
    role: Role,
    server_state: TeleportState,
    client_state: TeleportState,
    pending: Option<Warp>,
    min_distance: f32,
}

impl TeleportCoordinator {
    pub fn new(role: Role, min_distance: f32) -> Self {
        let client_state = if role.is_owner_client() {
            TeleportState::RESPONDING
        } else {
            TeleportState::NONE
        };

        Self {
            role,
            server_state: TeleportState::NONE,
            client_state,
            pending: None,
            min_distance,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn server_state(&self) -> TeleportState {
        self.server_state
    }

    pub fn client_state(&self) -> TeleportState {
        self.client_state
    }

    pub fn is_waiting_confirm(&self) -> bool {
        !self.server_state.is_idle()
    }

    /// A warp has been accepted and is waiting on preparation.
    pub fn is_preparing(&self) -> bool {
        self.pending.is_some()
    }

    /// Authority entry point. Returns whether a warp was started.
    pub fn request(&mut self, warp: Warp, current_position: Vec3) -> bool {
        if !self.role.is_authority() {
            log::warn!("Teleport requested on non-authoritative instance ({:?}), ignoring", self.role);
            return false;
        }
        if !self.server_state.is_idle() {
            log::debug!("Teleport dropped, still waiting on {:?}", self.server_state);
            return false;
        }
        if self.pending.is_some() {
            return false;
        }
        if warp.position.distance(current_position) <= self.min_distance {
            return false;
        }

        self.begin(warp);
        true
    }

    /// Observer entry point for a request received from the authority.
    pub fn receive_request(&mut self, request: TeleportRequest) -> Option<Warp> {
        if !request.flags.has(TeleportState::REQUESTING) {
            return None;
        }
        let warp = Warp::from(request);
        log::debug!("Teleport request received: {:?}", warp);
        self.begin(warp);
        Some(warp)
    }

    fn begin(&mut self, warp: Warp) {
        if self.role.has_remote_owner() {
            self.server_state = TeleportState::WAITING_FOR_RESPONSE;
        }
        self.pending = Some(warp);
    }

    /// Hands back the pending warp once preparation allows it. A failed
    /// preparation drops the warp and leaves the authority waiting.
    pub fn poll_preparation(&mut self, preparer: Option<&mut dyn TeleportPreparer>) -> Option<Warp> {
        self.pending?;

        match preparer.map(|p| p.poll()).unwrap_or(Preparation::Ready) {
            Preparation::Pending => None,
            Preparation::Ready => self.pending.take(),
            Preparation::Failed => {
                log::warn!(
                    "Teleport preparation failed for {:?}, handshake left at {:?}",
                    self.pending,
                    self.server_state
                );
                self.pending = None;
                None
            }
        }
    }

    /// Called after the warp was applied to the entity.
    pub fn complete(&mut self, warp: &Warp) {
        if self.role.has_remote_owner() {
            let mut state = TeleportState::REQUESTING | TeleportState::WAITING_FOR_RESPONSE;
            state.set(TeleportState::STILL_MOVE_AFTER_TELEPORT, warp.keep_moving);
            self.server_state = state;
        }
        if self.role.is_owner_client() {
            self.client_state = TeleportState::RESPONDING;
        }
        log::debug!(
            "Teleport applied at {:?}, server {:?}, client {:?}",
            warp.position,
            self.server_state,
            self.client_state
        );
    }

    /// Authority wire-out; emits once per issued teleport.
    pub fn write_server_state(&mut self, position: Vec3, yaw: f32) -> Option<TeleportRequest> {
        if !self.server_state.has(TeleportState::REQUESTING) {
            return None;
        }

        let keep_moving = self.server_state.has(TeleportState::STILL_MOVE_AFTER_TELEPORT);
        self.server_state = TeleportState::WAITING_FOR_RESPONSE;
        Some(TeleportRequest::new(position, yaw, keep_moving))
    }

    /// Responder wire-out; emits a single acknowledgement when armed.
    pub fn write_client_state(&mut self) -> Option<TeleportAck> {
        if !self.client_state.has(TeleportState::RESPONDING) {
            return None;
        }
        self.client_state = TeleportState::NONE;
        Some(TeleportAck::default())
    }

    pub fn receive_ack(&mut self, ack: TeleportAck) {
        if !ack.flags.has(TeleportState::RESPONDING) {
            return;
        }
        if !self.server_state.is_idle() {
            log::debug!("Teleport confirmed, clearing {:?}", self.server_state);
        }
        self.server_state = TeleportState::NONE;
    }
}
