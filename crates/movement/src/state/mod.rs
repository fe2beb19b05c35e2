mod motion;
mod teleport;

pub use motion::{ExtraMovementState, MotionState};
pub use teleport::TeleportState;
