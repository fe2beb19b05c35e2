use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TeleportState: u8 {
        const REQUESTING = 1 << 0;
        const WAITING_FOR_RESPONSE = 1 << 1;
        const RESPONDING = 1 << 2;
        const STILL_MOVE_AFTER_TELEPORT = 1 << 3;
    }
}

impl TeleportState {
    pub const NONE: Self = Self::empty();

    #[inline]
    pub fn has(self, flag: Self) -> bool {
        self.contains(flag)
    }

    pub fn is_idle(self) -> bool {
        self.is_empty()
    }
}
