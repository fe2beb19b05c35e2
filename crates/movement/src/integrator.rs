use glam::Vec3;

use crate::config::{ForceConfig, MovementCapabilities, MovementConfig, SpeedTable};
use crate::force::{ForceApplier, ForceComposer, ForceMode, ForceSource};
use crate::nav::Navigator;
use crate::rotation::{RotationSmoother, yaw_from_direction};
use crate::state::{ExtraMovementState, MotionState};

pub trait SpeedProvider {
    fn move_speed(&self, state: MotionState, extra: ExtraMovementState) -> f32;
}

impl SpeedProvider for SpeedTable {
    fn move_speed(&self, state: MotionState, extra: ExtraMovementState) -> f32 {
        self.speed_for(state, extra)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    pub direction: Vec3,
    pub dash: bool,
    pub extra: ExtraMovementState,
}

/// Everything the integrator touches on the entity for one tick.
pub struct IntegratorContext<'a> {
    pub position: &'a mut Vec3,
    pub forces: &'a mut ForceComposer,
    pub rotation: &'a mut RotationSmoother,
    pub navigator: &'a mut dyn Navigator,
    pub speeds: &'a dyn SpeedProvider,
    pub can_turn: bool,
}

#[derive(Debug, Clone)]
pub struct MovementIntegrator {
    min_move_magnitude: f32,
    min_direction_sqr_magnitude: f32,
    dash: ForceConfig,
    capabilities: MovementCapabilities,
    input: MovementInput,
    motion_state: MotionState,
    extra_state: ExtraMovementState,
}

impl MovementIntegrator {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            min_move_magnitude: config.min_move_magnitude,
            min_direction_sqr_magnitude: config.min_direction_sqr_magnitude,
            dash: config.dash,
            capabilities: config.capabilities,
            input: MovementInput::default(),
            motion_state: MotionState::NONE,
            extra_state: ExtraMovementState::None,
        }
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion_state
    }

    pub fn extra_state(&self) -> ExtraMovementState {
        self.extra_state
    }

    pub fn input(&self) -> &MovementInput {
        &self.input
    }

    pub fn set_input_direction(&mut self, direction: Vec3) {
        self.input.direction = direction;
    }

    /// Latched until the next integration step consumes it.
    pub fn request_dash(&mut self) {
        self.input.dash = true;
    }

    pub fn set_requested_extra(&mut self, extra: ExtraMovementState) {
        self.input.extra = extra;
    }

    pub(crate) fn set_states(&mut self, motion: MotionState, extra: ExtraMovementState) {
        self.motion_state = motion;
        self.extra_state = extra;
    }

    pub fn step(&mut self, ctx: IntegratorContext<'_>, delta_time: f32, preparing_teleport: bool) -> MotionState {
        let dashing = std::mem::take(&mut self.input.dash);
        if preparing_teleport {
            return self.motion_state;
        }

        let IntegratorContext {
            position,
            forces,
            rotation,
            navigator,
            speeds,
            can_turn,
        } = ctx;

        if dashing {
            forces.push(ForceApplier::from_config(
                ForceMode::Dash,
                rotation.forward(),
                ForceSource::NONE,
                &self.dash,
            ));
        }

        let base_speed = speeds.move_speed(MotionState::FORWARD, ExtraMovementState::None);
        let update = forces.update_forces(delta_time, base_speed);

        let mut state = MotionState::IS_GROUNDED;

        if let Some(replace) = update.replace {
            if let Some(yaw) = yaw_from_direction(replace.direction) {
                rotation.retarget(yaw);
            }
            if navigator.has_active_path() {
                navigator.stop();
            }
            *position += replace.direction * replace.current_speed * delta_time;
            if replace.mode == ForceMode::Dash {
                state |= MotionState::IS_DASH;
            }
            self.motion_state = state;
            return state;
        }

        if update.motion.length_squared() > self.min_direction_sqr_magnitude {
            *position += update.motion;
        }

        let direction = self.input.direction;
        if direction.length_squared() > self.min_direction_sqr_magnitude {
            state |= MotionState::FORWARD;
            self.extra_state = self.input.extra.validate(state, &self.capabilities);
            if navigator.has_active_path() {
                navigator.stop();
            }

            let speed = speeds.move_speed(state, self.extra_state);
            *position += direction * speed * delta_time;

            if rotation.is_applied() && can_turn {
                if let Some(yaw) = yaw_from_direction(direction) {
                    rotation.retarget(yaw);
                }
            }
        } else {
            let velocity = navigator.velocity();
            let is_moving = velocity.length() > self.min_move_magnitude;
            if is_moving {
                state |= MotionState::FORWARD;
            }
            self.extra_state = self.input.extra.validate(state, &self.capabilities);

            let speed = speeds.move_speed(state, self.extra_state);
            self.push_navigator_speed(navigator, speed);

            if is_moving && rotation.is_applied() && can_turn {
                if let Some(yaw) = yaw_from_direction(velocity) {
                    rotation.retarget(yaw);
                }
            }

            *position = navigator.advance(*position, delta_time);
        }

        self.motion_state = state;
        state
    }

    fn push_navigator_speed(&self, navigator: &mut dyn Navigator, speed: f32) {
        if (navigator.speed() - speed).abs() <= f32::EPSILON * speed.abs().max(1.0) {
            return;
        }
        if navigator.velocity().length_squared() <= self.min_direction_sqr_magnitude {
            return;
        }
        navigator.set_speed(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::StraightLineAgent;

    struct Rig {
        position: Vec3,
        forces: ForceComposer,
        rotation: RotationSmoother,
        navigator: StraightLineAgent,
        speeds: SpeedTable,
        integrator: MovementIntegrator,
    }

    impl Rig {
        fn new() -> Self {
            let config = MovementConfig::default();
            Self {
                position: Vec3::ZERO,
                forces: ForceComposer::new(true),
                rotation: RotationSmoother::new(0.0, 0.0, 1.0),
                navigator: StraightLineAgent::new(5.0, 0.1),
                speeds: SpeedTable::default(),
                integrator: MovementIntegrator::new(&config),
            }
        }

        fn step(&mut self, dt: f32, preparing: bool) -> MotionState {
            let ctx = IntegratorContext {
                position: &mut self.position,
                forces: &mut self.forces,
                rotation: &mut self.rotation,
                navigator: &mut self.navigator,
                speeds: &self.speeds,
                can_turn: true,
            };
            let state = self.integrator.step(ctx, dt, preparing);
            self.rotation.update(dt);
            state
        }
    }

    #[test]
    fn idle_entity_is_grounded_only() {
        let mut rig = Rig::new();
        let state = rig.step(0.1, false);
        assert_eq!(state, MotionState::IS_GROUNDED);
        assert_eq!(rig.position, Vec3::ZERO);
    }

    #[test]
    fn direct_input_moves_and_turns() {
        let mut rig = Rig::new();
        rig.integrator.set_input_direction(Vec3::X);

        let state = rig.step(0.5, false);
        assert!(state.has(MotionState::FORWARD | MotionState::IS_GROUNDED));
        assert!((rig.position - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-5);
        assert!((rig.rotation.yaw() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn direct_input_cancels_path() {
        let mut rig = Rig::new();
        rig.navigator.set_destination(Vec3::new(0.0, 0.0, 20.0));
        rig.step(0.1, false);
        assert!(rig.navigator.has_active_path());

        rig.integrator.set_input_direction(Vec3::X);
        rig.step(0.1, false);
        assert!(!rig.navigator.has_active_path());
    }

    #[test]
    fn destination_seeking_sets_forward_once_moving() {
        let mut rig = Rig::new();
        rig.navigator.set_destination(Vec3::new(0.0, 0.0, 20.0));

        let first = rig.step(0.1, false);
        assert!(!first.has(MotionState::FORWARD));
        assert!(rig.position.z > 0.0);

        let second = rig.step(0.1, false);
        assert!(second.has(MotionState::FORWARD));
    }

    #[test]
    fn dash_overrides_input() {
        let mut rig = Rig::new();
        rig.integrator.set_input_direction(Vec3::X);
        rig.integrator.request_dash();

        let state = rig.step(0.1, false);
        assert!(state.has(MotionState::IS_DASH));
        assert!(!state.has(MotionState::FORWARD));
        // dash follows the facing direction (+Z), not the held input
        assert!(rig.position.z > 0.0);
        assert_eq!(rig.position.x, 0.0);
        assert_eq!(rig.forces.replace_count(), 1);
    }

    #[test]
    fn dash_latch_is_consumed() {
        let mut rig = Rig::new();
        rig.integrator.request_dash();
        rig.step(0.01, false);
        assert!(!rig.integrator.input().dash);
    }

    #[test]
    fn preparing_teleport_skips_integration() {
        let mut rig = Rig::new();
        rig.integrator.set_input_direction(Vec3::X);
        rig.step(0.1, true);
        assert_eq!(rig.position, Vec3::ZERO);
        assert!(rig.forces.is_empty());
    }

    #[test]
    fn knockback_replaces_without_dash_flag() {
        let mut rig = Rig::new();
        rig.forces
            .apply(ForceMode::Knockback, -Vec3::X, ForceSource::NONE, 10.0, 0.0, 1.0);

        let state = rig.step(0.1, false);
        assert_eq!(state, MotionState::IS_GROUNDED);
        assert!((rig.position.x + 1.0).abs() < 1e-5);
        assert!((rig.rotation.target_yaw() - 270.0).abs() < 1e-3);
    }

    #[test]
    fn additive_force_adds_to_input() {
        let mut rig = Rig::new();
        rig.forces
            .apply(ForceMode::Additive, Vec3::Z, ForceSource::NONE, 2.0, 0.0, 1.0);
        rig.integrator.set_input_direction(Vec3::X);

        rig.step(0.5, false);
        assert!((rig.position - Vec3::new(2.5, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn sprint_is_dropped_when_idle() {
        let mut rig = Rig::new();
        rig.integrator.set_requested_extra(ExtraMovementState::IsSprinting);
        rig.step(0.1, false);
        assert_eq!(rig.integrator.extra_state(), ExtraMovementState::None);

        rig.integrator.set_input_direction(Vec3::Z);
        rig.step(0.1, false);
        assert_eq!(rig.integrator.extra_state(), ExtraMovementState::IsSprinting);
    }
}
