use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ForceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForceMode {
    #[default]
    Additive = 0,
    Dash = 1,
    Knockback = 2,
    ReplaceMovement = 3,
}

impl ForceMode {
    /// Replace-kind forces supersede locomotion instead of adding to it.
    #[inline]
    pub fn is_replace_movement(self) -> bool {
        !matches!(self, Self::Additive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForceSourceType {
    #[default]
    None = 0,
    Skill = 1,
    Item = 2,
    Buff = 3,
    Environment = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ForceSource {
    pub source_type: ForceSourceType,
    pub id: i32,
    pub level: i32,
}

impl ForceSource {
    pub const NONE: Self = Self {
        source_type: ForceSourceType::None,
        id: 0,
        level: 0,
    };

    pub fn new(source_type: ForceSourceType, id: i32, level: i32) -> Self {
        Self {
            source_type,
            id,
            level,
        }
    }

    pub fn matches(&self, source_type: ForceSourceType, id: i32) -> bool {
        self.source_type == source_type && self.id == id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceApplier {
    pub mode: ForceMode,
    pub direction: Vec3,
    pub source: ForceSource,
    pub current_speed: f32,
    pub deceleration: f32,
    pub remaining_duration: f32,
}

impl ForceApplier {
    pub fn new(
        mode: ForceMode,
        direction: Vec3,
        source: ForceSource,
        force: f32,
        deceleration: f32,
        duration: f32,
    ) -> Self {
        Self {
            mode,
            direction: direction.normalize_or_zero(),
            source,
            current_speed: force.max(0.0),
            deceleration: deceleration.max(0.0),
            remaining_duration: duration,
        }
    }

    pub fn from_config(mode: ForceMode, direction: Vec3, source: ForceSource, config: &ForceConfig) -> Self {
        Self::new(
            mode,
            direction,
            source,
            config.force,
            config.deceleration,
            config.duration,
        )
    }

    /// Elapsed once the duration has run past zero or the speed has decayed away.
    pub fn is_expired(&self) -> bool {
        self.remaining_duration < 0.0 || self.current_speed <= 0.0
    }

    pub fn velocity(&self) -> Vec3 {
        self.direction * self.current_speed
    }

    /// Decays speed and duration by `dt` and returns the distance covered while
    /// the force was still within its duration.
    pub(crate) fn advance(&mut self, dt: f32) -> f32 {
        let consumed = dt.min(self.remaining_duration.max(0.0));
        let moving = if self.deceleration > 0.0 {
            consumed.min(self.current_speed / self.deceleration)
        } else {
            consumed
        };
        let distance = self.current_speed * moving - 0.5 * self.deceleration * moving * moving;

        self.current_speed = (self.current_speed - self.deceleration * dt).max(0.0);
        self.remaining_duration -= dt;

        distance.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let applier = ForceApplier::new(
            ForceMode::Additive,
            Vec3::new(3.0, 0.0, 4.0),
            ForceSource::NONE,
            5.0,
            1.0,
            1.0,
        );
        assert!((applier.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn advance_integrates_linear_decay() {
        let mut applier = ForceApplier::new(ForceMode::Additive, Vec3::X, ForceSource::NONE, 5.0, 2.0, 1.0);

        let distance = applier.advance(1.0);
        assert!((distance - 4.0).abs() < 1e-6);
        assert_eq!(applier.current_speed, 3.0);
        assert_eq!(applier.remaining_duration, 0.0);
        assert!(!applier.is_expired());

        let distance = applier.advance(2.0);
        assert_eq!(distance, 0.0);
        assert_eq!(applier.current_speed, 0.0);
        assert!(applier.is_expired());
    }

    #[test]
    fn advance_stops_when_speed_runs_out() {
        let mut applier = ForceApplier::new(ForceMode::Additive, Vec3::X, ForceSource::NONE, 2.0, 4.0, 10.0);

        let distance = applier.advance(1.0);
        // stops after 0.5s: 2 * 0.5 - 0.5 * 4 * 0.25
        assert!((distance - 0.5).abs() < 1e-6);
        assert!(applier.is_expired());
    }

    #[test]
    fn only_additive_mode_is_not_replace() {
        assert!(!ForceMode::Additive.is_replace_movement());
        assert!(ForceMode::Dash.is_replace_movement());
        assert!(ForceMode::Knockback.is_replace_movement());
        assert!(ForceMode::ReplaceMovement.is_replace_movement());
    }
}
