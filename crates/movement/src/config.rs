use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::{ExtraMovementState, MotionState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceConfig {
    pub force: f32,
    pub deceleration: f32,
    pub duration: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            force: 15.0,
            deceleration: 30.0,
            duration: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCapabilities {
    pub jump: bool,
    pub dash: bool,
    pub crouch: bool,
    pub crawl: bool,
}

impl Default for MovementCapabilities {
    fn default() -> Self {
        Self {
            jump: false,
            dash: true,
            crouch: true,
            crawl: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    pub walk_multiplier: f32,
    pub crouch_multiplier: f32,
    pub crawl_multiplier: f32,
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            sprint_multiplier: 1.5,
            walk_multiplier: 0.5,
            crouch_multiplier: 0.4,
            crawl_multiplier: 0.25,
        }
    }
}

impl SpeedTable {
    pub fn speed_for(&self, state: MotionState, extra: ExtraMovementState) -> f32 {
        if !state.has(MotionState::FORWARD) {
            return 0.0;
        }

        let multiplier = match extra {
            ExtraMovementState::None => 1.0,
            ExtraMovementState::IsSprinting => self.sprint_multiplier,
            ExtraMovementState::IsWalking => self.walk_multiplier,
            ExtraMovementState::IsCrouching => self.crouch_multiplier,
            ExtraMovementState::IsCrawling => self.crawl_multiplier,
        };

        self.base_speed * multiplier
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub min_move_magnitude: f32,
    pub min_direction_sqr_magnitude: f32,
    pub min_teleport_distance: f32,

    pub turn_speed: f32,
    pub turn_deadband_degrees: f32,

    pub dash: ForceConfig,

    pub tick_history_capacity: usize,
    pub interpolation_switch_point: f32,

    pub confirm_poll_interval: Duration,

    pub capabilities: MovementCapabilities,
    pub speeds: SpeedTable,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            min_move_magnitude: 0.01,
            min_direction_sqr_magnitude: 0.0001,
            min_teleport_distance: 0.1,

            turn_speed: 0.0,
            turn_deadband_degrees: 1.0,

            dash: ForceConfig::default(),

            tick_history_capacity: 30,
            interpolation_switch_point: 0.75,

            confirm_poll_interval: Duration::from_millis(100),

            capabilities: MovementCapabilities::default(),
            speeds: SpeedTable::default(),
        }
    }
}
