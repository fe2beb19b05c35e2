use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::MovementCapabilities;

bitflags! {
    /// Per-tick locomotion flags. An empty set is a valid resting state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MotionState: u8 {
        const FORWARD = 1 << 0;
        const IS_GROUNDED = 1 << 1;
        const IS_DASH = 1 << 2;
    }
}

impl MotionState {
    pub const NONE: Self = Self::empty();

    #[inline]
    pub fn has(self, flag: Self) -> bool {
        self.contains(flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExtraMovementState {
    #[default]
    None = 0,
    IsSprinting = 1,
    IsWalking = 2,
    IsCrouching = 3,
    IsCrawling = 4,
}

impl TryFrom<u8> for ExtraMovementState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::IsSprinting),
            2 => Ok(Self::IsWalking),
            3 => Ok(Self::IsCrouching),
            4 => Ok(Self::IsCrawling),
            other => Err(other),
        }
    }
}

impl ExtraMovementState {
    /// Reconciles a requested extra state with this tick's motion flags.
    pub fn validate(self, motion: MotionState, capabilities: &MovementCapabilities) -> Self {
        match self {
            Self::IsSprinting | Self::IsWalking if !motion.has(MotionState::FORWARD) => Self::None,
            Self::IsCrouching if !capabilities.crouch => Self::None,
            Self::IsCrawling if !capabilities.crawl => Self::None,
            other => other,
        }
    }
}
