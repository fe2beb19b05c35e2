use std::time::Duration;

use glam::Vec3;

#[derive(Debug, Clone)]
pub enum SimEvent {
    TeleportIssued { tick: u32, target: Vec3 },
    TeleportRejected { tick: u32 },
    TeleportApplied { endpoint: &'static str, tick: u32, position: Vec3 },
    TeleportConfirmed { tick: u32, elapsed: Duration },
    TeleportTimedOut { tick: u32, waited: Duration },
    EntityLost { tick: u32 },
}

impl SimEvent {
    pub fn log(&self) {
        match self {
            SimEvent::TeleportIssued { tick, target } => {
                log::info!("[{tick}] server issued teleport to {target}");
            }
            SimEvent::TeleportRejected { tick } => {
                log::warn!("[{tick}] teleport rejected, previous handshake still pending");
            }
            SimEvent::TeleportApplied {
                endpoint,
                tick,
                position,
            } => {
                log::info!("[{tick}] {endpoint} applied teleport, now at {position}");
            }
            SimEvent::TeleportConfirmed { tick, elapsed } => {
                log::info!("[{tick}] teleport confirmed after {elapsed:?}");
            }
            SimEvent::TeleportTimedOut { tick, waited } => {
                log::warn!("[{tick}] teleport not confirmed after {waited:?}");
            }
            SimEvent::EntityLost { tick } => {
                log::warn!("[{tick}] entity despawned while waiting for confirmation");
            }
        }
    }
}
